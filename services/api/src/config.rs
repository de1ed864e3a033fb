//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    /// When absent the service keeps users and pets in memory.
    pub database_url: Option<String>,
    pub log_level: Level,
    pub cors_origin: String,
    pub completion_api_base: String,
    pub completion_api_key: String,
    pub vision_model: String,
    pub text_model: String,
    pub image_host_url: String,
    pub image_host_key: Option<String>,
    pub request_timeout: Duration,
    pub retry_max_attempts: u32,
    pub retry_base_delay: Duration,
    pub retry_max_delay: Duration,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        // --- Server and Database Settings ---
        let bind_address_str = var_or("BIND_ADDRESS", "0.0.0.0:3000");
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());

        let log_level_str = var_or("RUST_LOG", "INFO");
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let cors_origin = var_or("CORS_ORIGIN", "http://localhost:3000");

        // --- Completion Endpoint ---
        let completion_api_base = var_or(
            "COMPLETION_API_BASE",
            "https://api.netmind.ai/inference-api/openai/v1",
        );
        let completion_api_key = lookup("COMPLETION_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingVar("COMPLETION_API_KEY".to_string()))?;
        let vision_model = var_or("VISION_MODEL", "meta-llama/Llama-3.2-90B-Vision-Instruct");
        let text_model = var_or("TEXT_MODEL", "meta-llama/Llama-4-Scout-17B-16E-Instruct");

        // --- Image Hosting ---
        let image_host_url = var_or("IMAGE_HOST_URL", "https://api.imgbb.com/1/upload");
        let image_host_key = lookup("IMAGE_HOST_KEY");

        // --- Timeouts and Retry Policy ---
        let request_timeout = Duration::from_secs(parse_number(&lookup, "REQUEST_TIMEOUT_SECS", 60)?);
        let retry_max_attempts = parse_number(&lookup, "RETRY_MAX_ATTEMPTS", 3)?;
        if retry_max_attempts == 0 {
            return Err(ConfigError::InvalidValue(
                "RETRY_MAX_ATTEMPTS".to_string(),
                "must be at least 1".to_string(),
            ));
        }
        let retry_base_delay =
            Duration::from_millis(parse_number(&lookup, "RETRY_BASE_DELAY_MS", 2000)?);
        let retry_max_delay =
            Duration::from_millis(parse_number(&lookup, "RETRY_MAX_DELAY_MS", 16000)?);

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            cors_origin,
            completion_api_base,
            completion_api_key,
            vision_model,
            text_model,
            image_host_url,
            image_host_key,
            request_timeout,
            retry_max_attempts,
            retry_base_delay,
            retry_max_delay,
        })
    }
}

fn parse_number<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(key.to_string(), e.to_string())),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_only_the_key_is_set() {
        let config = config_from(&[("COMPLETION_API_KEY", "secret")]).unwrap();

        assert_eq!(config.bind_address.to_string(), "0.0.0.0:3000");
        assert!(config.database_url.is_none());
        assert_eq!(config.log_level, Level::INFO);
        assert_eq!(config.retry_max_attempts, 3);
        assert_eq!(config.retry_base_delay, Duration::from_secs(2));
        assert_eq!(config.request_timeout, Duration::from_secs(60));
        assert!(config.completion_api_base.starts_with("https://"));
    }

    #[test]
    fn missing_completion_key_is_an_error() {
        let err = config_from(&[]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(var) if var == "COMPLETION_API_KEY"));
    }

    #[test]
    fn invalid_numbers_name_the_variable() {
        let err = config_from(&[
            ("COMPLETION_API_KEY", "secret"),
            ("RETRY_MAX_ATTEMPTS", "many"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(var, _) if var == "RETRY_MAX_ATTEMPTS"));

        let err = config_from(&[
            ("COMPLETION_API_KEY", "secret"),
            ("RETRY_MAX_ATTEMPTS", "0"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(var, _) if var == "RETRY_MAX_ATTEMPTS"));
    }

    #[test]
    fn overrides_are_respected() {
        let config = config_from(&[
            ("COMPLETION_API_KEY", "secret"),
            ("BIND_ADDRESS", "127.0.0.1:8080"),
            ("DATABASE_URL", "postgres://localhost/rescue"),
            ("RUST_LOG", "debug"),
            ("TEXT_MODEL", "my-model"),
            ("RETRY_BASE_DELAY_MS", "10"),
        ])
        .unwrap();

        assert_eq!(config.bind_address.port(), 8080);
        assert_eq!(config.database_url.as_deref(), Some("postgres://localhost/rescue"));
        assert_eq!(config.log_level, Level::DEBUG);
        assert_eq!(config.text_model, "my-model");
        assert_eq!(config.retry_base_delay, Duration::from_millis(10));
    }
}
