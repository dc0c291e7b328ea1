use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Rate limit is positive and finite, burst and queue are non-zero
/// - Confidence floor is in (0, 1]
/// - Search limits and batch concurrency are non-zero
/// - Cache retention is at least one day
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let rate = &config.rate_limit;
    if !rate.requests_per_second.is_finite() || rate.requests_per_second <= 0.0 {
        return Err(invalid(format!(
            "rate_limit.requests_per_second must be positive, got {}",
            rate.requests_per_second
        )));
    }
    if rate.burst_size == 0 {
        return Err(invalid("rate_limit.burst_size cannot be 0"));
    }
    if rate.queue_capacity == 0 {
        return Err(invalid("rate_limit.queue_capacity cannot be 0"));
    }

    let matching = &config.matching;
    if !(matching.low_confidence_floor > 0.0 && matching.low_confidence_floor <= 1.0) {
        return Err(invalid(format!(
            "matching.low_confidence_floor must be in (0, 1], got {}",
            matching.low_confidence_floor
        )));
    }
    if matching.exact_search_limit == 0 || matching.fuzzy_search_limit == 0 {
        return Err(invalid("matching search limits cannot be 0"));
    }
    if matching.batch_concurrency == 0 {
        return Err(invalid("matching.batch_concurrency cannot be 0"));
    }

    if config.cache.retention_days == 0 {
        return Err(invalid("cache.retention_days cannot be 0"));
    }

    if config.musicbrainz.user_agent.trim().is_empty() {
        return Err(invalid("musicbrainz.user_agent cannot be empty"));
    }

    Ok(())
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError(message.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_rate() {
        for rps in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let mut config = Config::default();
            config.rate_limit.requests_per_second = rps;
            assert!(matches!(
                validate_config(&config),
                Err(ConfigError::ValidationError(_))
            ));
        }
    }

    #[test]
    fn test_validate_rejects_zero_burst() {
        let mut config = Config::default();
        config.rate_limit.burst_size = 0;
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("burst_size"));
    }

    #[test]
    fn test_validate_rejects_floor_out_of_range() {
        let mut config = Config::default();
        config.matching.low_confidence_floor = 1.5;
        assert!(validate_config(&config).is_err());

        config.matching.low_confidence_floor = 0.0;
        assert!(validate_config(&config).is_err());

        config.matching.low_confidence_floor = 1.0;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_concurrency_and_retention() {
        let mut config = Config::default();
        config.matching.batch_concurrency = 0;
        assert!(validate_config(&config).is_err());

        let mut config = Config::default();
        config.cache.retention_days = 0;
        assert!(validate_config(&config).is_err());
    }
}
