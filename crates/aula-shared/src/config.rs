//! Configuration management

use config::{builder::DefaultState, Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;

use crate::constants::{
    DEFAULT_ADMIN_EMAIL, DEFAULT_ADMIN_NAME, DEFAULT_ADMIN_PASSWORD,
    DEFAULT_ORDER_PROCESSING_DELAY_SECONDS, DEFAULT_SESSION_TTL_SECONDS,
    DEFAULT_SWEEP_INTERVAL_SECONDS,
};

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub app: AppSettings,
    pub auth: AuthSettings,
    pub sessions: SessionSettings,
    pub orders: OrderSettings,
    pub log: LogSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppSettings {
    pub env: String,
    pub host: String,
    pub port: u16,
    pub name: String,
}

/// The single credential pair accepted by `/auth/login`.
#[derive(Debug, Deserialize, Clone)]
pub struct AuthSettings {
    pub email: String,
    pub password: String,
    pub admin_name: String,
    pub session_ttl_seconds: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionSettings {
    /// Period of the background sweep of expired sessions, `0` disables it.
    pub sweep_interval_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OrderSettings {
    /// Delay before a new order moves from pending to processed.
    pub processing_delay_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogSettings {
    pub level: String,
    #[serde(default)]
    pub directory: Option<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".into());
        let config = Self::defaults()?
            .set_override("app.env", env.clone())?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("APP").separator("__").try_parsing(true))
            .build()?;
        config.try_deserialize()
    }

    /// Configuration built from the compiled-in defaults only.
    pub fn default_config() -> Result<Self, ConfigError> {
        Self::defaults()?.build()?.try_deserialize()
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("app.env", "development")?
            .set_default("app.host", "127.0.0.1")?
            .set_default("app.port", 8000)?
            .set_default("app.name", "aula-server")?
            .set_default("auth.email", DEFAULT_ADMIN_EMAIL)?
            .set_default("auth.password", DEFAULT_ADMIN_PASSWORD)?
            .set_default("auth.admin_name", DEFAULT_ADMIN_NAME)?
            .set_default("auth.session_ttl_seconds", DEFAULT_SESSION_TTL_SECONDS)?
            .set_default("sessions.sweep_interval_seconds", DEFAULT_SWEEP_INTERVAL_SECONDS)?
            .set_default("orders.processing_delay_seconds", DEFAULT_ORDER_PROCESSING_DELAY_SECONDS)?
            .set_default("log.level", "info")
    }
}
