use tracing::Level;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{Layer, Registry};

use crate::config::NormalizerConfig;

/// Console logging settings for hosts embedding the normalizer.
///
/// **Fields**
/// - `level`: most verbose level that is printed.
/// - `with_target`: include the module target in each line.
#[derive(Clone, Debug)]
pub struct TracingConfig {
    pub level: Level,
    pub with_target: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            with_target: true,
        }
    }
}

impl From<&NormalizerConfig> for TracingConfig {
    fn from(config: &NormalizerConfig) -> Self {
        Self {
            level: config.log_level,
            ..Self::default()
        }
    }
}

/// Install a global `tracing` subscriber printing to stdout.
///
/// **Returns**
/// - `Err(..)` if a global subscriber was already installed.
pub fn init_tracing(
    config: &TracingConfig,
) -> Result<(), tracing::subscriber::SetGlobalDefaultError> {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(config.with_target)
        .with_filter(LevelFilter::from_level(config.level));
    let subscriber = Registry::default().with(fmt_layer);
    tracing::subscriber::set_global_default(subscriber)
}
