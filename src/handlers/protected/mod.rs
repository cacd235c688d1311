// handlers/protected/mod.rs - endpoints that require a valid token
//
// Security Level: JWT + user validation
// Route Prefix: /api/*
// Middleware: jwt_auth_middleware → validate_user_middleware
//
// Handlers that act on tenant content take a `TenantScope`, which pins tenant
// users to their own tenant and lets master admins pick one with X-Tenant-Id.

pub mod activity;
pub mod documents;
pub mod folders;
pub mod me;
pub mod notifications;
pub mod users;
