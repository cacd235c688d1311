use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub hierarchy: HierarchyConfig,
    pub storage: StorageConfig,
    pub mail: MailConfig,
    pub notifications: NotificationConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Base connection string; the path segment names the system database.
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
    pub run_migrations: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub default_page_size: u32,
    pub max_page_size: u32,
    pub enable_request_logging: bool,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub jwt_expiry_hours: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HierarchyConfig {
    pub max_folder_depth: u32,
    pub max_name_length: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageBackendKind {
    Filesystem,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackendKind,
    pub root: PathBuf,
    pub verify_uploads: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MailProvider {
    Log,
    Http,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    pub provider: MailProvider,
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub from_address: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    pub enabled: bool,
    pub email_enabled: bool,
    pub observer_timeout_ms: u64,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing configuration: {0}")]
    Missing(&'static str),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Ok(v) = env::var("DOCVAULT_BIND_ADDRESS") {
            self.server.bind_address = v;
        }
        if let Some(port) = env::var("DOCVAULT_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|s| s.parse::<u16>().ok())
        {
            self.server.port = port;
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = Some(v);
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }
        if let Ok(v) = env::var("DATABASE_RUN_MIGRATIONS") {
            self.database.run_migrations = v.parse().unwrap_or(self.database.run_migrations);
        }

        // API overrides
        if let Ok(v) = env::var("API_DEFAULT_PAGE_SIZE") {
            self.api.default_page_size = v.parse().unwrap_or(self.api.default_page_size);
        }
        if let Ok(v) = env::var("API_MAX_PAGE_SIZE") {
            self.api.max_page_size = v.parse().unwrap_or(self.api.max_page_size);
        }
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect();
        }
        if let Ok(v) = env::var("SECURITY_JWT_SECRET").or_else(|_| env::var("JWT_SECRET")) {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("SECURITY_JWT_ISSUER") {
            self.security.jwt_issuer = v;
        }
        if let Ok(v) = env::var("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }

        // Hierarchy overrides
        if let Ok(v) = env::var("HIERARCHY_MAX_FOLDER_DEPTH") {
            self.hierarchy.max_folder_depth = v.parse().unwrap_or(self.hierarchy.max_folder_depth);
        }
        if let Ok(v) = env::var("HIERARCHY_MAX_NAME_LENGTH") {
            self.hierarchy.max_name_length = v.parse().unwrap_or(self.hierarchy.max_name_length);
        }

        // Storage overrides
        if let Ok(v) = env::var("STORAGE_BACKEND") {
            match v.to_ascii_lowercase().as_str() {
                "memory" => self.storage.backend = StorageBackendKind::Memory,
                "filesystem" | "fs" => self.storage.backend = StorageBackendKind::Filesystem,
                other => tracing::warn!("Unknown STORAGE_BACKEND '{}', keeping {:?}", other, self.storage.backend),
            }
        }
        if let Ok(v) = env::var("STORAGE_ROOT") {
            self.storage.root = PathBuf::from(v);
        }
        if let Ok(v) = env::var("STORAGE_VERIFY_UPLOADS") {
            self.storage.verify_uploads = v.parse().unwrap_or(self.storage.verify_uploads);
        }

        // Mail overrides
        if let Ok(v) = env::var("MAIL_PROVIDER") {
            match v.to_ascii_lowercase().as_str() {
                "http" => self.mail.provider = MailProvider::Http,
                "log" => self.mail.provider = MailProvider::Log,
                other => tracing::warn!("Unknown MAIL_PROVIDER '{}', keeping {:?}", other, self.mail.provider),
            }
        }
        if let Ok(v) = env::var("MAIL_ENDPOINT") {
            self.mail.endpoint = Some(v);
        }
        if let Ok(v) = env::var("MAIL_API_KEY") {
            self.mail.api_key = Some(v);
        }
        if let Ok(v) = env::var("MAIL_FROM_ADDRESS") {
            self.mail.from_address = v;
        }
        if let Ok(v) = env::var("MAIL_TIMEOUT_SECS") {
            self.mail.timeout_secs = v.parse().unwrap_or(self.mail.timeout_secs);
        }

        // Notification overrides
        if let Ok(v) = env::var("NOTIFICATIONS_ENABLED") {
            self.notifications.enabled = v.parse().unwrap_or(self.notifications.enabled);
        }
        if let Ok(v) = env::var("NOTIFICATIONS_EMAIL_ENABLED") {
            self.notifications.email_enabled = v.parse().unwrap_or(self.notifications.email_enabled);
        }
        if let Ok(v) = env::var("NOTIFICATIONS_OBSERVER_TIMEOUT_MS") {
            self.notifications.observer_timeout_ms = v.parse().unwrap_or(self.notifications.observer_timeout_ms);
        }

        self
    }

    /// Reject combinations the server cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.security.jwt_secret.is_empty() {
            return Err(ConfigError::Missing("SECURITY_JWT_SECRET"));
        }
        if self.mail.provider == MailProvider::Http && self.mail.endpoint.is_none() {
            return Err(ConfigError::Missing("MAIL_ENDPOINT"));
        }
        if self.api.default_page_size == 0 || self.api.max_page_size == 0 {
            return Err(ConfigError::Invalid("page sizes must be positive".to_string()));
        }
        if self.api.default_page_size > self.api.max_page_size {
            return Err(ConfigError::Invalid(format!(
                "default page size {} exceeds max page size {}",
                self.api.default_page_size, self.api.max_page_size
            )));
        }
        if self.hierarchy.max_folder_depth == 0 {
            return Err(ConfigError::Invalid("max folder depth must be positive".to_string()));
        }
        Ok(())
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                bind_address: "0.0.0.0".to_string(),
                port: 3000,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 30,
                run_migrations: true,
            },
            api: ApiConfig {
                default_page_size: 25,
                max_page_size: 200,
                enable_request_logging: true,
                max_request_size_bytes: 1024 * 1024, // 1MB, metadata only
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
                jwt_secret: "docvault-development-secret".to_string(),
                jwt_issuer: "docvault".to_string(),
                jwt_expiry_hours: 24 * 7, // 1 week
            },
            hierarchy: HierarchyConfig {
                max_folder_depth: 32,
                max_name_length: 255,
            },
            storage: StorageConfig {
                backend: StorageBackendKind::Filesystem,
                root: PathBuf::from("./var/objects"),
                verify_uploads: false,
            },
            mail: MailConfig {
                provider: MailProvider::Log,
                endpoint: None,
                api_key: None,
                from_address: "DocVault <no-reply@localhost>".to_string(),
                timeout_secs: 10,
            },
            notifications: NotificationConfig {
                enabled: true,
                email_enabled: true,
                observer_timeout_ms: 5_000,
            },
        }
    }

    pub fn staging() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Staging;
        config.database.max_connections = 20;
        config.database.connection_timeout = 10;
        config.api.max_page_size = 100;
        config.security.cors_origins = vec!["https://staging.example.com".to_string()];
        config.security.jwt_secret = String::new();
        config.security.jwt_expiry_hours = 24;
        config.storage.verify_uploads = true;
        config
    }

    pub fn production() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Production;
        config.database.max_connections = 50;
        config.database.connection_timeout = 5;
        config.database.run_migrations = false;
        config.api.max_page_size = 100;
        config.api.enable_request_logging = false;
        config.security.cors_origins = vec!["https://app.example.com".to_string()];
        config.security.jwt_secret = String::new();
        config.security.jwt_expiry_hours = 4;
        config.storage.root = PathBuf::from("/var/lib/docvault/objects");
        config.storage.verify_uploads = true;
        config.mail.provider = MailProvider::Http;
        config
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.api.default_page_size, 25);
        assert_eq!(config.hierarchy.max_folder_depth, 32);
        assert_eq!(config.mail.provider, MailProvider::Log);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_production_requires_secret_and_mail_endpoint() {
        let mut config = AppConfig::production();
        assert_eq!(config.validate(), Err(ConfigError::Missing("SECURITY_JWT_SECRET")));

        config.security.jwt_secret = "s3cret".to_string();
        assert_eq!(config.validate(), Err(ConfigError::Missing("MAIL_ENDPOINT")));

        config.mail.endpoint = Some("https://relay.example.com/send".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_page_size_bounds_are_checked() {
        let mut config = AppConfig::development();
        config.api.default_page_size = 500;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }
}
