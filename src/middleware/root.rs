use axum::{extract::Request, middleware::Next, response::Response};

use super::validate_user::CurrentUser;
use crate::auth::Action;
use crate::error::ApiError;

/// Guards `/api/root/*`: only master admins manage tenants
pub async fn root_access_middleware(request: Request, next: Next) -> Result<Response, ApiError> {
    let current = request
        .extensions()
        .get::<CurrentUser>()
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    current.require(Action::ManageTenants)?;

    Ok(next.run(request).await)
}
