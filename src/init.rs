use crate::base::Base;
use crate::layer::ConsoleLayer;
use std::sync::Arc;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::{Layer, SubscriberExt};
use tracing_subscriber::Registry;

/// Configuration of the `tracing` bridge.
///
/// **Fields**
/// - `max_level`: most verbose `tracing` level forwarded to the base.
///   The base's own level filter still applies afterwards.
#[derive(Clone, Debug)]
pub struct LayerConfig {
    pub max_level: LevelFilter,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            max_level: LevelFilter::TRACE,
        }
    }
}

/// Initialize the global `tracing` subscriber so that every event is
/// logged through `base`.
///
/// **Effects**
///
/// Installs a [`Registry`] combined with [`ConsoleLayer`] as the global
/// default subscriber. Panics if a global subscriber is already set.
pub fn init_tracing_with_config(base: Arc<Base>, config: LayerConfig) {
    let layer = ConsoleLayer::new(base).with_filter(config.max_level);
    let subscriber = Registry::default().with(layer);
    tracing::subscriber::set_global_default(subscriber).expect("set global subscriber");
}

/// Equivalent to [`init_tracing_with_config`] with [`LayerConfig::default`].
pub fn init_tracing(base: Arc<Base>) {
    init_tracing_with_config(base, LayerConfig::default());
}
