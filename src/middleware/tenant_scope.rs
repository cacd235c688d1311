use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use super::validate_user::CurrentUser;
use crate::database::models::Tenant;
use crate::database::DatabaseError;
use crate::error::ApiError;
use crate::state::AppState;

/// Header a master admin uses to pick the tenant a request acts on
pub const TENANT_HEADER: &str = "x-tenant-id";

/// The tenant a request operates on. Tenant users are pinned to their own
/// tenant; master admins choose one with `X-Tenant-Id`.
#[derive(Clone, Debug)]
pub struct TenantScope(pub Tenant);

/// Parse the tenant header value
pub fn parse_tenant_header(value: Option<&str>) -> Result<Uuid, ApiError> {
    let raw = value.ok_or_else(|| ApiError::bad_request("X-Tenant-Id header is required for master admins"))?;
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::bad_request("X-Tenant-Id must be a UUID"))
}

#[async_trait]
impl FromRequestParts<AppState> for TenantScope {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let current = CurrentUser::from_request_parts(parts, state).await?;

        if let Some(tenant) = current.tenant {
            return Ok(TenantScope(tenant));
        }

        let header = match parts.headers.get(TENANT_HEADER) {
            Some(value) => Some(value.to_str().map_err(|_| ApiError::bad_request("X-Tenant-Id must be a UUID"))?),
            None => None,
        };
        let tenant_id = parse_tenant_header(header)?;

        let tenant = sqlx::query_as::<_, Tenant>("SELECT * FROM tenants WHERE id = $1 AND trashed_at IS NULL")
            .bind(tenant_id)
            .fetch_optional(&state.pool)
            .await
            .map_err(|e| ApiError::from(DatabaseError::from(e)))?
            .ok_or_else(|| ApiError::not_found("Tenant not found"))?;

        Ok(TenantScope(tenant))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_must_be_present_and_a_uuid() {
        assert_eq!(parse_tenant_header(None).unwrap_err().status_code(), 400);
        assert_eq!(parse_tenant_header(Some("acme")).unwrap_err().status_code(), 400);

        let id = Uuid::new_v4();
        assert_eq!(parse_tenant_header(Some(&format!(" {} ", id))).unwrap(), id);
    }
}
