//! Listener configuration

use crate::error::Result;
use ::config::builder::DefaultState;
use ::config::{Config, ConfigBuilder, Environment, File};
use serde::{Deserialize, Serialize};
use settlement_core::TrackerConfig;
use std::path::Path;

const ENV_PREFIX: &str = "SETTLEMENT";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListenerConfig {
    /// Buffered incoming events before producers wait
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,

    /// Buffered output events per subscriber
    #[serde(default = "default_output_channel_capacity")]
    pub output_channel_capacity: usize,

    /// Stop the tracker task on the first chain query failure instead of
    /// logging it and moving on to the next event.
    #[serde(default)]
    pub stop_on_query_error: bool,

    #[serde(default)]
    pub tracker: TrackerConfig,
}

fn default_event_channel_capacity() -> usize {
    100
}

fn default_output_channel_capacity() -> usize {
    1000
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            event_channel_capacity: default_event_channel_capacity(),
            output_channel_capacity: default_output_channel_capacity(),
            stop_on_query_error: false,
            tracker: TrackerConfig::default(),
        }
    }
}

impl ListenerConfig {
    /// Load from an optional file, overridden by `SETTLEMENT__*` environment
    /// variables (e.g. `SETTLEMENT__TRACKER__FINALITY=once`).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        Self::build(builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__")))
    }

    fn build(builder: ConfigBuilder<DefaultState>) -> Result<Self> {
        Ok(builder.build()?.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::config::FileFormat;
    use settlement_core::FinalityPolicy;

    #[test]
    fn test_empty_sources_use_defaults() {
        let config = ListenerConfig::build(Config::builder()).unwrap();
        assert_eq!(config, ListenerConfig::default());
    }

    #[test]
    fn test_file_overrides() {
        let source = File::from_str(
            r#"{
                "event_channel_capacity": 8,
                "stop_on_query_error": true,
                "tracker": { "finality": "once" }
            }"#,
            FileFormat::Json,
        );
        let config = ListenerConfig::build(Config::builder().add_source(source)).unwrap();

        assert_eq!(config.event_channel_capacity, 8);
        assert_eq!(config.output_channel_capacity, 1000);
        assert!(config.stop_on_query_error);
        assert_eq!(config.tracker.finality, FinalityPolicy::Once);
    }

    #[test]
    fn test_unknown_policy_is_rejected() {
        let source = File::from_str(r#"{ "tracker": { "finality": "never" } }"#, FileFormat::Json);
        assert!(ListenerConfig::build(Config::builder().add_source(source)).is_err());
    }
}
