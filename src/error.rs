//! Error types for the settlement listener

use settlement_core::TrackerError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ListenerError {
    #[error("Tracker error: {0}")]
    Tracker(#[from] TrackerError),

    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Event channel error: {0}")]
    EventChannel(String),

    #[error("Tracker task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("Listener is already running")]
    AlreadyRunning,

    #[error("Listener has already finished")]
    Finished,

    #[error("Listener is not running")]
    NotRunning,
}

pub type Result<T> = std::result::Result<T, ListenerError>;
