// handlers/elevated/mod.rs - master admin operations
//
// Security Level: JWT + user validation + ManageTenants
// Route Prefix: /api/root/*
// Middleware: jwt_auth_middleware → validate_user_middleware → root_access_middleware

pub mod root;
