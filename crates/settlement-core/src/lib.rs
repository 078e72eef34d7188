//! Transaction settlement tracking
//!
//! This crate follows transactions across incoming blocks, reports in which
//! blocks each one settled (valid and successful, valid but failed, or
//! invalid) and reports settlements that became final.

pub mod chain;
pub mod config;
pub mod error;
pub mod events;
pub mod models;
pub mod tracker;

// Re-export main types for convenience
pub use chain::{ChainQuery, QueryCall, QueryKind, StaticChain, TxOutcome};
pub use config::{FinalityPolicy, TrackerConfig};
pub use error::{QueryError, Result, TrackerError};
pub use events::{EventEmitter, EventSubscriber, OutputSink};
pub use models::{IncomingEvent, OutputEvent, SettlementState, TxRecord};
pub use tracker::SettlementTracker;
