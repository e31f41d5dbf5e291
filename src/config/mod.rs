use once_cell::sync::Lazy;
use std::env;

/// Minimum accepted username length when creating a user.
pub const MIN_USERNAME_LENGTH: usize = 3;
/// Minimum accepted password length when creating a user.
pub const MIN_PASSWORD_LENGTH: usize = 8;
/// Document quota applied when a create-user request does not specify one.
pub const DEFAULT_MAX_DOCUMENTS: i32 = 100;

/// Page size substituted when a listing request asks for an out-of-range size.
pub const DEFAULT_PAGE_SIZE: i32 = 10;
/// Largest page size a caller may request.
pub const MAX_PAGE_SIZE: i32 = 100;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub postgres: PostgresConfig,
    pub services: ServiceConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub db_name: String,
    pub pool_max_cons: u32,
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub user_service_address: String,
    pub document_service_address: String,
    pub user_service_port: u16,
    pub document_service_port: u16,
    pub api_gateway_port: u16,
}

#[derive(Debug, Clone)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub token_lifetime_seconds: i64,
    pub bcrypt_cost: u32,
}

fn env_with_default(key: &str, default: &str) -> String {
    env::var(key).ok().filter(|v| !v.is_empty()).unwrap_or_else(|| default.to_string())
}

fn env_parse_with_default<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(v) => v.parse().unwrap_or(default),
        Err(_) => default,
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            postgres: PostgresConfig {
                host: env_with_default("POSTGRES_HOST", "localhost"),
                port: env_parse_with_default("POSTGRES_PORT", 5432),
                user: env_with_default("POSTGRES_USER", "admin"),
                password: env_with_default("POSTGRES_PASSWORD", "password"),
                db_name: env_with_default("POSTGRES_DB", "postgres"),
                pool_max_cons: env_parse_with_default("POOL_MAX_CONS", 25),
            },
            services: ServiceConfig {
                user_service_address: env_with_default(
                    "USER_SERVICE_ADDRESS",
                    "http://user-service:50051",
                ),
                document_service_address: env_with_default(
                    "DOCUMENT_SERVICE_ADDRESS",
                    "http://document-service:50052",
                ),
                user_service_port: env_parse_with_default("USER_SERVICE_PORT", 50051),
                document_service_port: env_parse_with_default("DOCUMENT_SERVICE_PORT", 50052),
                api_gateway_port: env_parse_with_default("API_GATEWAY_PORT", 8080),
            },
            security: SecurityConfig {
                jwt_secret: env_with_default("JWT_SECRET", "development-secret-do-not-deploy"),
                token_lifetime_seconds: env_parse_with_default("TOKEN_LIFETIME_SECONDS", 3600),
                bcrypt_cost: env_parse_with_default("BCRYPT_COST", bcrypt::DEFAULT_COST),
            },
        }
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
    fn defaults_without_env() {
        let config = AppConfig::from_env();
        assert_eq!(config.postgres.pool_max_cons, 25);
        assert_eq!(config.security.token_lifetime_seconds, 3600);
        assert_eq!(config.services.api_gateway_port, 8080);
    }

    #[test]
    fn page_size_bounds_are_sane() {
        assert!(DEFAULT_PAGE_SIZE <= MAX_PAGE_SIZE);
        assert!(DEFAULT_PAGE_SIZE > 0);
    }
}
