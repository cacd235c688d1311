// handlers/public/mod.rs - endpoints reachable without a token
//
// Security Level: None
// Route Prefix: none (/, /health)

pub mod health;
pub mod root;

pub use health::health;
pub use root::root;
