//! Configuration types for the settlement tracker

use serde::{Deserialize, Serialize};

/// Which finalized blocks may report a transaction as done
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinalityPolicy {
    /// Only re-finalizing the block recorded last is rejected. A transaction
    /// settled in several blocks is reported again when a different one of
    /// them is finalized.
    PerBlock,
    /// A transaction is reported done at most once.
    Once,
}

impl Default for FinalityPolicy {
    fn default() -> Self {
        FinalityPolicy::PerBlock
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerConfig {
    #[serde(default)]
    pub finality: FinalityPolicy,
}

impl TrackerConfig {
    pub fn with_finality(finality: FinalityPolicy) -> Self {
        Self { finality }
    }
}
