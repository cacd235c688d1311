// HTTP API error types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};
use std::collections::HashMap;

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),
    ValidationError { 
        message: String, 
        field_errors: Option<HashMap<String, String>> 
    },
    InvalidJson(String),
    
    // 401 Unauthorized  
    Unauthorized(String),
    
    // 403 Forbidden
    Forbidden(String),
    
    // 404 Not Found
    NotFound(String),
    
    // 409 Conflict
    Conflict(String),
    
    // 422 Unprocessable Entity (validation but semantically valid JSON)
    UnprocessableEntity { 
        message: String, 
        field_errors: HashMap<String, String> 
    },
    
    // 500 Internal Server Error
    InternalServerError(String),
    
    // 502 Bad Gateway (external service issues)
    BadGateway(String),
    
    // 503 Service Unavailable  
    ServiceUnavailable(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::ValidationError { .. } => 400,
            ApiError::InvalidJson(_) => 400,
            ApiError::Unauthorized(_) => 401,
            ApiError::Forbidden(_) => 403,
            ApiError::NotFound(_) => 404,
            ApiError::Conflict(_) => 409,
            ApiError::UnprocessableEntity { .. } => 422,
            ApiError::InternalServerError(_) => 500,
            ApiError::BadGateway(_) => 502,
            ApiError::ServiceUnavailable(_) => 503,
        }
    }
    
    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::ValidationError { message, .. } => message,
            ApiError::InvalidJson(msg) => msg,
            ApiError::Unauthorized(msg) => msg,
            ApiError::Forbidden(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::Conflict(msg) => msg,
            ApiError::UnprocessableEntity { message, .. } => message,
            ApiError::InternalServerError(msg) => msg,
            ApiError::BadGateway(msg) => msg,
            ApiError::ServiceUnavailable(msg) => msg,
        }
    }
    
    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        match self {
            ApiError::ValidationError { message, field_errors } => {
                let mut response = json!({
                    "error": true,
                    "message": message,
                    "code": "VALIDATION_ERROR"
                });
                
                if let Some(field_errors) = field_errors {
                    response["field_errors"] = json!(field_errors);
                }
                
                response
            }
            ApiError::UnprocessableEntity { message, field_errors } => {
                json!({
                    "error": true,
                    "message": message,
                    "code": "UNPROCESSABLE_ENTITY",
                    "field_errors": field_errors
                })
            }
            _ => {
                json!({
                    "error": true,
                    "message": self.message(),
                    "code": self.error_code()
                })
            }
        }
    }
    
    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::ValidationError { .. } => "VALIDATION_ERROR",
            ApiError::InvalidJson(_) => "INVALID_JSON",
            ApiError::Unauthorized(_) => "UNAUTHORIZED", 
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::UnprocessableEntity { .. } => "UNPROCESSABLE_ENTITY",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
            ApiError::BadGateway(_) => "BAD_GATEWAY",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }
}

// Constructors
impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }
    
    pub fn validation_error(
        message: impl Into<String>, 
        field_errors: Option<HashMap<String, String>>
    ) -> Self {
        ApiError::ValidationError { 
            message: message.into(), 
            field_errors 
        }
    }
    
    pub fn invalid_json(message: impl Into<String>) -> Self {
        ApiError::InvalidJson(message.into())
    }
    
    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }
    
    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }
    
    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }
    
    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }
    
    pub fn unprocessable_entity(
        message: impl Into<String>, 
        field_errors: HashMap<String, String>
    ) -> Self {
        ApiError::UnprocessableEntity { 
            message: message.into(), 
            field_errors 
        }
    }
    
    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }
    
    pub fn bad_gateway(message: impl Into<String>) -> Self {
        ApiError::BadGateway(message.into())
    }
    
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

// Convert other error types to ApiError
impl From<crate::database::manager::DatabaseError> for ApiError {
    fn from(err: crate::database::manager::DatabaseError) -> Self {
        use crate::database::manager::DatabaseError;

        if err.is_unique_violation() {
            return ApiError::conflict("Resource already exists");
        }

        match &err {
            DatabaseError::NotFound(msg) => ApiError::not_found(msg.clone()),
            DatabaseError::ConfigMissing(_) | DatabaseError::InvalidDatabaseUrl | DatabaseError::InvalidDatabaseName(_) => {
                tracing::error!("Database misconfigured: {}", err);
                ApiError::service_unavailable("Database temporarily unavailable")
            }
            DatabaseError::QueryError(msg) => {
                // Don't expose internal SQL errors to clients
                tracing::error!("Database query error: {}", msg);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
            DatabaseError::Sqlx(sqlx::Error::PoolTimedOut) | DatabaseError::Sqlx(sqlx::Error::Io(_)) => {
                tracing::error!("Database unreachable: {}", err);
                ApiError::service_unavailable("Database temporarily unavailable")
            }
            DatabaseError::Sqlx(sqlx_err) => {
                // Log the real error but return generic message
                tracing::error!("SQLx error: {}", sqlx_err);
                ApiError::internal_server_error("Database error occurred")
            }
            DatabaseError::MigrationError(msg) => {
                tracing::error!("Migration error: {}", msg);
                ApiError::service_unavailable("Service is being updated, please try again later")
            }
        }
    }
}

impl From<crate::services::ServiceError> for ApiError {
    fn from(err: crate::services::ServiceError) -> Self {
        use crate::services::ServiceError;

        match err {
            ServiceError::NotFound(what) => ApiError::not_found(format!("{} not found", what)),
            ServiceError::Conflict(msg) => ApiError::conflict(msg),
            ServiceError::Invalid(msg) => ApiError::bad_request(msg),
            ServiceError::InvalidField { field, message } => {
                let mut field_errors = HashMap::new();
                field_errors.insert(field.to_string(), message.clone());
                ApiError::validation_error(format!("Invalid {}: {}", field, message), Some(field_errors))
            }
            ServiceError::Forbidden(msg) => ApiError::forbidden(msg),
            ServiceError::Unprocessable(msg) => ApiError::unprocessable_entity(msg, HashMap::new()),
            ServiceError::StorageUnavailable(msg) => {
                tracing::error!("Object store unavailable: {}", msg);
                ApiError::bad_gateway("Object storage is unavailable")
            }
            ServiceError::Database(db) => db.into(),
            ServiceError::Storage(storage) => storage.into(),
        }
    }
}

impl From<crate::storage::StorageError> for ApiError {
    fn from(err: crate::storage::StorageError) -> Self {
        use crate::storage::StorageError;

        match err {
            StorageError::InvalidKey(msg) => ApiError::bad_request(format!("Invalid storage key: {}", msg)),
            StorageError::NotFound(key) => ApiError::unprocessable_entity(
                format!("No uploaded object found at '{}'", key),
                HashMap::new(),
            ),
            StorageError::Io(e) => {
                tracing::error!("Object store I/O error: {}", e);
                ApiError::bad_gateway("Object storage is unavailable")
            }
        }
    }
}

impl From<crate::filter::FilterError> for ApiError {
    fn from(err: crate::filter::FilterError) -> Self {
        ApiError::bad_request(err.to_string())
    }
}

impl From<crate::auth::JwtError> for ApiError {
    fn from(err: crate::auth::JwtError) -> Self {
        match err {
            crate::auth::JwtError::InvalidSecret => {
                tracing::error!("JWT secret is not configured");
                ApiError::internal_server_error("Authentication is not configured")
            }
            other => ApiError::unauthorized(other.to_string()),
        }
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ServiceError;
    use crate::storage::StorageError;

    #[test]
    fn service_errors_map_to_status_codes() {
        let cases: Vec<(ServiceError, u16)> = vec![
            (ServiceError::not_found("Folder"), 404),
            (ServiceError::conflict("taken"), 409),
            (ServiceError::invalid("cycle"), 400),
            (ServiceError::field("name", "must not be empty"), 400),
            (ServiceError::Forbidden("no".to_string()), 403),
            (ServiceError::Unprocessable("missing object".to_string()), 422),
            (ServiceError::StorageUnavailable("disk".to_string()), 502),
            (ServiceError::Storage(StorageError::InvalidKey("..".to_string())), 400),
        ];
        for (err, status) in cases {
            let label = err.to_string();
            assert_eq!(ApiError::from(err).status_code(), status, "{}", label);
        }
    }

    #[test]
    fn field_errors_are_reported_per_field() {
        let body = ApiError::from(ServiceError::field("email", "is not valid")).to_json();
        assert_eq!(body["error"], true);
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(body["field_errors"]["email"], "is not valid");
    }

    #[test]
    fn not_found_body_shape() {
        let body = ApiError::from(ServiceError::not_found("Document")).to_json();
        assert_eq!(body, json!({ "error": true, "message": "Document not found", "code": "NOT_FOUND" }));
    }
}
