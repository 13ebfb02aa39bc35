//! Structured logging.
//!
//! # Responsibilities
//! - Initialize logging subsystem
//! - Configure log level at runtime
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - JSON format for production, pretty format for development
//! - `RUST_LOG` wins; otherwise the level follows `kiosk.debug`

use tracing_subscriber::{
    layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter, Registry,
};

use crate::config::Config;

const DEFAULT_DIRECTIVE: &str = "kiosk_config=info,tower_http=info";
const DEBUG_DIRECTIVE: &str = "kiosk_config=debug,tower_http=debug";

/// Handle for swapping the log filter after startup.
#[derive(Clone)]
pub struct LogLevelHandle {
    handle: Option<reload::Handle<EnvFilter, Registry>>,
}

impl LogLevelHandle {
    /// Raise or restore the level to match `config`.
    ///
    /// No-op when the filter came from `RUST_LOG`.
    pub fn apply(&self, config: &Config) {
        let Some(handle) = &self.handle else {
            return;
        };

        let directive = directive_for(config);
        if let Err(e) = handle.modify(|filter| *filter = EnvFilter::new(directive)) {
            tracing::warn!(error = %e, "Failed to update log level");
        }
    }
}

/// Filter directive implied by the configuration's debug flags.
pub fn directive_for(config: &Config) -> &'static str {
    if config.kiosk.debug {
        DEBUG_DIRECTIVE
    } else {
        DEFAULT_DIRECTIVE
    }
}

/// Install the global subscriber.
pub fn init(json: bool) -> LogLevelHandle {
    let (filter, from_env) = match EnvFilter::try_from_default_env() {
        Ok(filter) => (filter, true),
        Err(_) => (EnvFilter::new(DEFAULT_DIRECTIVE), false),
    };
    let (filter, handle) = reload::Layer::new(filter);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    LogLevelHandle {
        handle: (!from_env).then_some(handle),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directive_follows_debug() {
        let mut config = Config::default();
        assert_eq!(directive_for(&config), DEFAULT_DIRECTIVE);

        config.kiosk.debug = true;
        assert_eq!(directive_for(&config), DEBUG_DIRECTIVE);
    }
}
