use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::config::loader::{deserialize_non_empty_string, deserialize_non_zero};
use crate::error::{CommonError, CommonResult};

const DEFAULT_CONFIG: &str = include_str!("default.toml");

/// The prefix of environment variables recognized as application configuration.
pub const CONFIG_ENV_PREFIX: &str = "BOSUN_";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub cluster: ClusterConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// The ask-reply timeout in seconds for synchronous backend operations.
    pub ask_timeout_secs: u64,
    /// Overrides the parallelism derived from the executor core count.
    /// Zero means the override is not set.
    #[serde(deserialize_with = "deserialize_non_zero")]
    pub default_parallelism: Option<usize>,
    /// The advertised address of the backend itself.
    /// This is never forwarded to registering executors.
    #[serde(deserialize_with = "deserialize_non_empty_string")]
    pub host_port: Option<String>,
}

impl AppConfig {
    pub fn load() -> CommonResult<Self> {
        Figment::from(Toml::string(DEFAULT_CONFIG))
            .merge(Env::prefixed(CONFIG_ENV_PREFIX).map(|p| p.as_str().replace("__", ".").into()))
            .extract()
            .map_err(|e| CommonError::InvalidArgument(e.to_string()))
    }
}

/// Environment variables for application cluster configuration.
pub struct ClusterConfigEnv;

macro_rules! define_cluster_config_env {
    ($($name:ident),* $(,)?) => {
        $(pub const $name: &'static str = concat!("BOSUN_CLUSTER__", stringify!($name));)*
    };
}

impl ClusterConfigEnv {
    define_cluster_config_env! {
        ASK_TIMEOUT_SECS,
        DEFAULT_PARALLELISM,
        HOST_PORT,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_config_defaults() {
        let config = AppConfig::load().unwrap();
        assert_eq!(config.cluster.ask_timeout_secs, 10);
        assert_eq!(config.cluster.default_parallelism, None);
        assert_eq!(config.cluster.host_port, None);
    }

    #[test]
    fn test_cluster_config_env_names() {
        assert_eq!(
            ClusterConfigEnv::ASK_TIMEOUT_SECS,
            "BOSUN_CLUSTER__ASK_TIMEOUT_SECS"
        );
        assert_eq!(ClusterConfigEnv::HOST_PORT, "BOSUN_CLUSTER__HOST_PORT");
    }
}
