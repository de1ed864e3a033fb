//! services/api/src/error.rs
//!
//! Defines the primary error type for the entire API service.

use crate::config::ConfigError;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// Represents a failure while applying database migrations.
    #[error("Migration Error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Represents a failure while building the outbound HTTP client.
    #[error("HTTP client Error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(missing: bool) -> Result<(), ApiError> {
        if missing {
            Err::<(), _>(ConfigError::MissingVar("COMPLETION_API_KEY".to_string()))?;
        }
        Ok(())
    }

    #[test]
    fn startup_failures_convert_with_question_mark() {
        let err = load(true).unwrap_err();
        assert!(matches!(err, ApiError::Config(ConfigError::MissingVar(_))));
        assert_eq!(
            err.to_string(),
            "Configuration error: Missing the environment variable COMPLETION_API_KEY"
        );
        assert!(load(false).is_ok());
    }
}
