use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - batch.workers is positive
/// - backend.timeout_secs is positive
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.batch.workers == 0 {
        return Err(ConfigError::ValidationError(
            "batch.workers must be a positive integer".to_string(),
        ));
    }

    if config.backend.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "backend.timeout_secs cannot be 0".to_string(),
        ));
    }

    Ok(())
}
