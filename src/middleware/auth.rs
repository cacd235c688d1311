use axum::{extract::Request, http::HeaderMap, middleware::Next, response::Response};
use uuid::Uuid;

use crate::auth::{validate_jwt, Claims, Role};
use crate::error::ApiError;

/// Identity asserted by a verified bearer token
#[derive(Clone, Debug, PartialEq)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub tenant_id: Option<Uuid>,
    pub role: Role,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            tenant_id: claims.tenant_id,
            role: claims.role,
        }
    }
}

/// JWT authentication middleware that validates tokens and extracts user context
pub async fn jwt_auth_middleware(headers: HeaderMap, mut request: Request, next: Next) -> Result<Response, ApiError> {
    let token = extract_jwt_from_headers(&headers).map_err(ApiError::unauthorized)?;

    let claims = validate_jwt(&token).map_err(|e| {
        tracing::debug!("Rejected bearer token: {}", e);
        ApiError::from(e)
    })?;

    request.extensions_mut().insert(AuthUser::from(claims));

    Ok(next.run(request).await)
}

/// Extract JWT token from Authorization header
pub fn extract_jwt_from_headers(headers: &HeaderMap) -> Result<String, String> {
    let auth_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(|| "Missing Authorization header".to_string())?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    match auth_str.strip_prefix("Bearer ") {
        Some(token) if token.trim().is_empty() => Err("Empty JWT token".to_string()),
        Some(token) => Ok(token.trim().to_string()),
        None => Err("Authorization header must use Bearer token format".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(axum::http::header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn bearer_token_is_extracted() {
        assert_eq!(extract_jwt_from_headers(&headers("Bearer abc.def.ghi")).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn malformed_headers_are_rejected() {
        assert!(extract_jwt_from_headers(&HeaderMap::new()).is_err());
        assert!(extract_jwt_from_headers(&headers("Basic dXNlcjpwYXNz")).is_err());
        assert!(extract_jwt_from_headers(&headers("Bearer    ")).is_err());
    }
}
