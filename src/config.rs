use chrono::Duration;

use crate::errors::AppError;

const DEFAULT_TOKEN_TTL_SECS: i64 = 3600;
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_BOOTSTRAP_PASSWORD: &str = "password";

/// Immutable authorization settings shared by the token service and the
/// authorization engine. Parsed once at startup.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub token_ttl: Duration,
    pub admin_role: String,
    pub default_role: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_ttl: Duration::seconds(DEFAULT_TOKEN_TTL_SECS),
            admin_role: "admin".to_string(),
            default_role: "user".to_string(),
        }
    }
}

impl AuthConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let defaults = Self::default();

        let ttl_secs = match std::env::var("TOKEN_TTL") {
            Ok(val) => parse_ttl(&val)?,
            Err(_) => DEFAULT_TOKEN_TTL_SECS,
        };

        Ok(Self {
            token_ttl: Duration::seconds(ttl_secs),
            admin_role: env_or("ADMIN_ROLE", defaults.admin_role),
            default_role: env_or("DEFAULT_ROLE", defaults.default_role),
        })
    }
}

/// Credentials for the accounts created by the bootstrap seed.
#[derive(Debug, Clone)]
pub struct BootstrapConfig {
    pub admin_password: String,
    pub user_password: String,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            admin_password: DEFAULT_BOOTSTRAP_PASSWORD.to_string(),
            user_password: DEFAULT_BOOTSTRAP_PASSWORD.to_string(),
        }
    }
}

impl BootstrapConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            admin_password: env_or("BOOTSTRAP_ADMIN_PASSWORD", defaults.admin_password),
            user_password: env_or("BOOTSTRAP_USER_PASSWORD", defaults.user_password),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub port: u16,
    pub auth: AuthConfig,
    pub bootstrap: BootstrapConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let database_url =
            std::env::var("DATABASE_URL").map_err(|_| AppError::configuration("DATABASE_URL not set"))?;
        let port = std::env::var("APP_PORT")
            .map(|val| val.parse::<u16>())
            .unwrap_or(Ok(DEFAULT_PORT))
            .map_err(|_| AppError::configuration("APP_PORT must be a valid port number"))?;

        Ok(Self {
            database_url,
            port,
            auth: AuthConfig::from_env()?,
            bootstrap: BootstrapConfig::from_env(),
        })
    }
}

fn parse_ttl(raw: &str) -> Result<i64, AppError> {
    match raw.trim().parse::<i64>() {
        Ok(secs) if secs > 0 => Ok(secs),
        _ => Err(AppError::configuration("TOKEN_TTL must be a positive number of seconds")),
    }
}

fn env_or(key: &str, default: String) -> String {
    std::env::var(key)
        .ok()
        .filter(|val| !val.trim().is_empty())
        .unwrap_or(default)
}
