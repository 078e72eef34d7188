#![warn(clippy::all)]

mod config;
mod error;
mod ingest;
mod listener;

pub use crate::config::ListenerConfig;
pub use error::{ListenerError, Result};
pub use ingest::forward_json_lines;
pub use listener::{EventHandle, SettlementListener};

// Re-export the tracker crate for consumers
pub use settlement_core;

pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
}
