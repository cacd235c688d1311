pub mod auth;
pub mod extract;
pub mod response;
pub mod root;
pub mod tenant_scope;
pub mod validate_user;

pub use auth::{jwt_auth_middleware, AuthUser};
pub use extract::{ApiJson, ApiQuery};
pub use response::{ApiResponse, ApiResult};
pub use root::root_access_middleware;
pub use tenant_scope::{TenantScope, TENANT_HEADER};
pub use validate_user::{validate_user_middleware, CurrentUser};
