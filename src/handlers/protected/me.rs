// handlers/protected/me.rs - the caller's own profile

use axum::extract::State;
use serde::Serialize;

use crate::database::models::{Tenant, User};
use crate::middleware::{ApiJson, ApiResponse, ApiResult, CurrentUser};
use crate::services::{UpdateMe, UserService};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct Me {
    pub user: User,
    pub tenant: Option<Tenant>,
}

/// GET /api/me
pub async fn me_get(current: CurrentUser) -> ApiResult<Me> {
    Ok(ApiResponse::success(Me {
        user: current.user,
        tenant: current.tenant,
    }))
}

/// PATCH /api/me - name and email_notifications only
pub async fn me_update(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiJson(patch): ApiJson<UpdateMe>,
) -> ApiResult<Me> {
    let user = UserService::from_state(&state).update_me(&current.user, patch).await?;
    Ok(ApiResponse::success(Me {
        user,
        tenant: current.tenant,
    }))
}
