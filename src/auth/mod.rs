pub mod policy;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::{self, SecurityConfig};

pub use policy::{Action, Role};

/// Identity carried by bearer tokens. Tokens are issued by an external
/// identity provider (or `docvault token` in development).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub tenant_id: Option<Uuid>,
    pub role: Role,
    pub iss: String,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(user_id: Uuid, tenant_id: Option<Uuid>, role: Role) -> Self {
        Self::with_settings(user_id, tenant_id, role, &config::config().security)
    }

    pub fn with_settings(user_id: Uuid, tenant_id: Option<Uuid>, role: Role, security: &SecurityConfig) -> Self {
        let now = Utc::now();
        let exp = (now + Duration::hours(security.jwt_expiry_hours as i64)).timestamp();

        Self {
            sub: user_id,
            tenant_id,
            role,
            iss: security.jwt_issuer.clone(),
            exp,
            iat: now.timestamp(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("Invalid JWT token: {0}")]
    InvalidToken(String),

    #[error("JWT secret not configured")]
    InvalidSecret,
}

pub fn generate_jwt(claims: &Claims) -> Result<String, JwtError> {
    generate_jwt_with(claims, &config::config().security)
}

pub fn generate_jwt_with(claims: &Claims, security: &SecurityConfig) -> Result<String, JwtError> {
    if security.jwt_secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let encoding_key = EncodingKey::from_secret(security.jwt_secret.as_bytes());
    encode(&Header::default(), claims, &encoding_key).map_err(|e| JwtError::TokenGeneration(e.to_string()))
}

pub fn validate_jwt(token: &str) -> Result<Claims, JwtError> {
    validate_jwt_with(token, &config::config().security)
}

pub fn validate_jwt_with(token: &str, security: &SecurityConfig) -> Result<Claims, JwtError> {
    if security.jwt_secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let decoding_key = DecodingKey::from_secret(security.jwt_secret.as_bytes());
    let mut validation = Validation::default();
    validation.set_issuer(&[security.jwt_issuer.as_str()]);

    let token_data =
        decode::<Claims>(token, &decoding_key, &validation).map_err(|e| JwtError::InvalidToken(e.to_string()))?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    fn security() -> SecurityConfig {
        AppConfig::development().security
    }

    #[test]
    fn issued_token_validates() {
        let security = security();
        let tenant = Uuid::new_v4();
        let claims = Claims::with_settings(Uuid::new_v4(), Some(tenant), Role::Staff, &security);
        let token = generate_jwt_with(&claims, &security).unwrap();

        let decoded = validate_jwt_with(&token, &security).unwrap();
        assert_eq!(decoded, claims);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let security = security();
        let mut other = security.clone();
        other.jwt_secret = "someone-else".to_string();

        let claims = Claims::with_settings(Uuid::new_v4(), None, Role::MasterAdmin, &other);
        let token = generate_jwt_with(&claims, &other).unwrap();

        assert!(matches!(validate_jwt_with(&token, &security), Err(JwtError::InvalidToken(_))));
    }

    #[test]
    fn token_from_other_issuer_is_rejected() {
        let security = security();
        let mut other = security.clone();
        other.jwt_issuer = "elsewhere".to_string();

        let claims = Claims::with_settings(Uuid::new_v4(), None, Role::MasterAdmin, &other);
        let token = generate_jwt_with(&claims, &other).unwrap();

        assert!(validate_jwt_with(&token, &security).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let security = security();
        let mut claims = Claims::with_settings(Uuid::new_v4(), None, Role::MasterAdmin, &security);
        claims.iat -= 7200;
        claims.exp = claims.iat + 60;
        let token = generate_jwt_with(&claims, &security).unwrap();

        assert!(validate_jwt_with(&token, &security).is_err());
    }

    #[test]
    fn empty_secret_is_refused() {
        let mut security = security();
        security.jwt_secret.clear();
        let claims = Claims::with_settings(Uuid::new_v4(), None, Role::MasterAdmin, &security);
        assert!(matches!(generate_jwt_with(&claims, &security), Err(JwtError::InvalidSecret)));
    }
}
