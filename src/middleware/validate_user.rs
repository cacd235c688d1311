use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};

use super::auth::AuthUser;
use crate::auth::Action;
use crate::database::models::{Tenant, User};
use crate::error::ApiError;
use crate::state::AppState;

/// The caller as stored in the database, with their tenant when they have one
#[derive(Clone, Debug)]
pub struct CurrentUser {
    pub user: User,
    pub tenant: Option<Tenant>,
}

impl CurrentUser {
    pub fn can(&self, action: Action) -> bool {
        self.user.role.can(action)
    }

    pub fn require(&self, action: Action) -> Result<(), ApiError> {
        if self.can(action) {
            Ok(())
        } else {
            tracing::debug!("{} ({}) may not {}", self.user.email, self.user.role, action.describe());
            Err(ApiError::forbidden(format!("Your role may not {}", action.describe())))
        }
    }
}

/// Why a token's claims do not match the stored user, if they do not
pub fn claims_mismatch(auth: &AuthUser, user: &User) -> Option<&'static str> {
    if !user.is_active {
        Some("User is deactivated")
    } else if user.role != auth.role {
        Some("User role does not match token")
    } else if user.tenant_id != auth.tenant_id {
        Some("User tenant does not match token")
    } else {
        None
    }
}

/// Loads the user named by the token and refuses inactive users, users whose
/// token disagrees with the database, and users of unusable tenants.
pub async fn validate_user_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_user = request
        .extensions()
        .get::<AuthUser>()
        .cloned()
        .ok_or_else(|| ApiError::unauthorized("JWT authentication required before user validation"))?;

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(auth_user.user_id)
        .fetch_optional(&state.pool)
        .await
        .map_err(|e| {
            tracing::error!("Database error validating user {}: {}", auth_user.user_id, e);
            ApiError::from(crate::database::DatabaseError::from(e))
        })?
        .ok_or_else(|| {
            tracing::warn!("User validation failed: user {} not found", auth_user.user_id);
            ApiError::forbidden("User is not registered")
        })?;

    if let Some(reason) = claims_mismatch(&auth_user, &user) {
        tracing::warn!("User validation failed for {}: {}", user.email, reason);
        return Err(ApiError::forbidden(reason));
    }

    let tenant = match user.tenant_id {
        Some(tenant_id) => {
            let tenant = sqlx::query_as::<_, Tenant>("SELECT * FROM tenants WHERE id = $1")
                .bind(tenant_id)
                .fetch_optional(&state.pool)
                .await
                .map_err(|e| ApiError::from(crate::database::DatabaseError::from(e)))?
                .filter(Tenant::is_usable)
                .ok_or_else(|| {
                    tracing::warn!("Tenant {} of user {} is not active", tenant_id, user.email);
                    ApiError::forbidden("Tenant is not active")
                })?;
            Some(tenant)
        }
        None => None,
    };

    tracing::debug!("User validation successful: {} ({})", user.email, user.role);
    request.extensions_mut().insert(CurrentUser { user, tenant });

    Ok(next.run(request).await)
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use crate::testing::sample_user;
    use uuid::Uuid;

    fn auth_for(user: &User) -> AuthUser {
        AuthUser { user_id: user.id, tenant_id: user.tenant_id, role: user.role }
    }

    #[test]
    fn matching_claims_pass() {
        let user = sample_user(Role::Staff, Some(Uuid::new_v4()));
        assert_eq!(claims_mismatch(&auth_for(&user), &user), None);
    }

    #[test]
    fn stale_or_forged_claims_are_refused() {
        let user = sample_user(Role::Staff, Some(Uuid::new_v4()));

        let mut escalated = auth_for(&user);
        escalated.role = Role::TenantAdmin;
        assert!(claims_mismatch(&escalated, &user).is_some());

        let mut other_tenant = auth_for(&user);
        other_tenant.tenant_id = Some(Uuid::new_v4());
        assert!(claims_mismatch(&other_tenant, &user).is_some());

        let mut inactive = user.clone();
        inactive.is_active = false;
        assert_eq!(claims_mismatch(&auth_for(&inactive), &inactive), Some("User is deactivated"));
    }

    #[test]
    fn require_reports_forbidden() {
        let current = CurrentUser { user: sample_user(Role::Staff, Some(Uuid::new_v4())), tenant: None };
        assert!(current.require(Action::WriteContent).is_ok());
        assert_eq!(current.require(Action::ManageUsers).unwrap_err().status_code(), 403);
    }
}
