//! Configuration management

use std::time::Duration;

use config::{Config, Environment, File};
use serde::Deserialize;
use validator::Validate;

use crate::constants::*;
use crate::error::AppError;

#[derive(Debug, Deserialize, Clone, Validate)]
pub struct AppConfig {
    pub app: AppSettings,
    pub database: DatabaseSettings,
    pub redis: RedisSettings,
    #[validate(nested)]
    pub jwt: JwtSettings,
    #[validate(nested)]
    pub session: SessionSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppSettings {
    pub env: String,
    pub host: String,
    pub port: u16,
    pub name: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl DatabaseSettings {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RedisSettings {
    pub url: String,
    pub max_connections: u32,
    /// When false the session store runs on the process-local backend only.
    pub enabled: bool,
}

#[derive(Debug, Deserialize, Clone, Validate)]
pub struct JwtSettings {
    #[validate(length(min = MIN_JWT_SECRET_LENGTH))]
    pub secret: String,
    #[validate(range(min = 1, max = MAX_ACCESS_TOKEN_EXPIRY))]
    pub access_token_expiry: i64,
}

#[derive(Debug, Deserialize, Clone, Validate)]
pub struct SessionSettings {
    #[validate(range(min = 1, max = MAX_SESSION_TIMEOUT_SECONDS))]
    pub timeout_seconds: u64,
    #[validate(range(min = 1))]
    pub operation_timeout_ms: u64,
    pub key_prefix: String,
    /// Shared secret the upstream authenticator presents to obtain tokens.
    /// Empty disables the issuance endpoint.
    pub issuer_key: String,
    pub allow_unbound_tokens: bool,
    #[validate(range(min = 1))]
    pub audit_queue_capacity: usize,
}

impl SessionSettings {
    pub fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }

    pub fn issuer_key(&self) -> Option<&str> {
        let key = self.issuer_key.trim();
        (!key.is_empty()).then_some(key)
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            timeout_seconds: DEFAULT_SESSION_TIMEOUT_SECONDS,
            operation_timeout_ms: DEFAULT_OPERATION_TIMEOUT_MS,
            key_prefix: String::new(),
            issuer_key: String::new(),
            allow_unbound_tokens: true,
            audit_queue_capacity: DEFAULT_AUDIT_QUEUE_CAPACITY,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, AppError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".into());
        let config = Self::builder_with_defaults()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::default().separator("__").try_parsing(true))
            .build()?;
        Self::from_config(config)
    }

    fn builder_with_defaults(
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, AppError> {
        let builder = Config::builder()
            .set_default("app.env", "development")?
            .set_default("app.host", "127.0.0.1")?
            .set_default("app.port", 8080)?
            .set_default("app.name", "session-server")?
            .set_default("database.max_connections", 10)?
            .set_default("database.acquire_timeout_secs", DEFAULT_DB_ACQUIRE_TIMEOUT_SECS)?
            .set_default("redis.url", "redis://127.0.0.1:6379")?
            .set_default("redis.max_connections", 16)?
            .set_default("redis.enabled", true)?
            .set_default("jwt.access_token_expiry", DEFAULT_ACCESS_TOKEN_EXPIRY)?
            .set_default("session.timeout_seconds", DEFAULT_SESSION_TIMEOUT_SECONDS)?
            .set_default("session.operation_timeout_ms", DEFAULT_OPERATION_TIMEOUT_MS)?
            .set_default("session.key_prefix", "")?
            .set_default("session.issuer_key", "")?
            .set_default("session.allow_unbound_tokens", true)?
            .set_default("session.audit_queue_capacity", DEFAULT_AUDIT_QUEUE_CAPACITY as u64)?;
        Ok(builder)
    }

    fn from_config(config: Config) -> Result<Self, AppError> {
        let settings: AppConfig = config.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }
}
