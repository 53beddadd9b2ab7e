use super::{types::Config, ConfigError};
use crate::config::AuthMethod;

/// Validate configuration beyond what serde enforces
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.auth.method == AuthMethod::ApiKey
        && config.auth.api_key.as_ref().is_none_or(|k| k.is_empty())
    {
        return Err(ConfigError::ValidationError(
            "auth.api_key must be set when auth.method = \"api_key\"".to_string(),
        ));
    }

    if !(0.0..=1.0).contains(&config.curation.similarity_threshold) {
        return Err(ConfigError::ValidationError(
            "curation.similarity_threshold must be within [0.0, 1.0]".to_string(),
        ));
    }

    if config.synthesis.max_narration_retries == 0 {
        return Err(ConfigError::ValidationError(
            "synthesis.max_narration_retries must be at least 1".to_string(),
        ));
    }

    if config.synthesis.placeholder_secs <= 0.0 {
        return Err(ConfigError::ValidationError(
            "synthesis.placeholder_secs must be positive".to_string(),
        ));
    }

    if !(0.5..=4.0).contains(&config.synthesis.target_tempo) {
        return Err(ConfigError::ValidationError(
            "synthesis.target_tempo must be within [0.5, 4.0]".to_string(),
        ));
    }

    if config.scheduler.daily_cap == 0 {
        return Err(ConfigError::ValidationError(
            "scheduler.daily_cap must be at least 1".to_string(),
        ));
    }

    if !(-12..=14).contains(&config.scheduler.utc_offset_hours) {
        return Err(ConfigError::ValidationError(
            "scheduler.utc_offset_hours must be within [-12, 14]".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config_from_str;

    fn base_config() -> Config {
        load_config_from_str(
            r#"
[auth]
method = "none"
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_validate_valid_config() {
        let config = base_config();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let mut config = base_config();
        config.server.port = 0;
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_api_key_method_without_key_fails() {
        let mut config = base_config();
        config.auth.method = AuthMethod::ApiKey;
        config.auth.api_key = None;
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_threshold_out_of_range_fails() {
        let mut config = base_config();
        config.curation.similarity_threshold = 1.5;
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_daily_cap_zero_fails() {
        let mut config = base_config();
        config.scheduler.daily_cap = 0;
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_offset_out_of_range_fails() {
        let mut config = base_config();
        config.scheduler.utc_offset_hours = 20;
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }
}
