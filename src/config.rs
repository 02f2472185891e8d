use tracing::Level;

use crate::env::{env_flag, env_or, LEGACY_NETWORK_LOGIN_URL_ENV, LOG_LEVEL_ENV, STORE_DSN_ENV};

/// Settings for the normalization pipeline.
///
/// **Fields**
/// - `legacy_network_login_url`: when `true`, network enrichment writes the
///   logout URL into the login URL field, as older deployments did.
/// - `store_dsn`: DSN passed to [`crate::backend::parse_dsn`].
/// - `log_level`: level used by [`crate::init::TracingConfig::from`].
#[derive(Clone, Debug)]
pub struct NormalizerConfig {
    pub legacy_network_login_url: bool,
    pub store_dsn: String,
    pub log_level: Level,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            legacy_network_login_url: false,
            store_dsn: "memory://".to_string(),
            log_level: Level::INFO,
        }
    }
}

impl NormalizerConfig {
    /// Build a config from `LOG_NORMALIZER_*` environment variables, using
    /// the defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            legacy_network_login_url: env_flag(LEGACY_NETWORK_LOGIN_URL_ENV),
            store_dsn: env_or(STORE_DSN_ENV, &defaults.store_dsn),
            log_level: env_or(LOG_LEVEL_ENV, "info")
                .parse()
                .unwrap_or(defaults.log_level),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_keep_login_url_and_use_memory_store() {
        let config = NormalizerConfig::default();
        assert!(!config.legacy_network_login_url);
        assert_eq!(config.store_dsn, "memory://");
        assert_eq!(config.log_level, Level::INFO);
    }
}
