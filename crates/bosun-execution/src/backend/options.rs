//! A dedicated module for backend options to ensure readonly access.
use std::time::Duration;

use bosun_common::config::AppConfig;

use crate::error::ExecutionError;

#[readonly::make]
#[derive(Debug, Clone)]
pub struct BackendOptions {
    /// The ask-reply timeout for `stop` and `remove_executor`.
    pub ask_timeout: Duration,
    /// Overrides the parallelism derived from the total core count.
    pub default_parallelism: Option<usize>,
}

impl BackendOptions {
    pub fn new(ask_timeout: Duration, default_parallelism: Option<usize>) -> Self {
        Self {
            ask_timeout,
            default_parallelism,
        }
    }
}

impl TryFrom<&AppConfig> for BackendOptions {
    type Error = ExecutionError;

    fn try_from(config: &AppConfig) -> Result<Self, Self::Error> {
        if config.cluster.ask_timeout_secs == 0 {
            return Err(ExecutionError::InvalidArgument(
                "the ask timeout must be positive".to_string(),
            ));
        }
        Ok(Self {
            ask_timeout: Duration::from_secs(config.cluster.ask_timeout_secs),
            default_parallelism: config.cluster.default_parallelism,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_options_from_config() {
        let config = AppConfig::load().unwrap();
        let options = BackendOptions::try_from(&config).unwrap();
        assert_eq!(options.ask_timeout, Duration::from_secs(10));
        assert_eq!(options.default_parallelism, None);
    }
}
