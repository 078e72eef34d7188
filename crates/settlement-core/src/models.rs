//! Data models for the settlement tracker

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Settlement of one transaction within one block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SettlementState {
    #[serde(rename_all = "camelCase")]
    Valid { block_hash: String, successful: bool },
    #[serde(rename_all = "camelCase")]
    Invalid { block_hash: String },
}

impl SettlementState {
    pub fn valid(block_hash: impl Into<String>, successful: bool) -> Self {
        SettlementState::Valid {
            block_hash: block_hash.into(),
            successful,
        }
    }

    pub fn invalid(block_hash: impl Into<String>) -> Self {
        SettlementState::Invalid {
            block_hash: block_hash.into(),
        }
    }

    pub fn block_hash(&self) -> &str {
        match self {
            SettlementState::Valid { block_hash, .. } => block_hash,
            SettlementState::Invalid { block_hash } => block_hash,
        }
    }
}

/// Everything the tracker knows about one transaction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TxRecord {
    pub hash: String,
    /// Blocks whose settlement has already been reported.
    pub seen_in_blocks: HashSet<String>,
    /// Last block this transaction was finalized in. Always a member of `seen_in_blocks`.
    pub finalized_in: Option<String>,
}

impl TxRecord {
    pub fn new(hash: impl Into<String>) -> Self {
        Self {
            hash: hash.into(),
            seen_in_blocks: HashSet::new(),
            finalized_in: None,
        }
    }

    pub fn is_settled_in(&self, block_hash: &str) -> bool {
        self.seen_in_blocks.contains(block_hash)
    }
}

/// Events driving the tracker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum IncomingEvent {
    NewTransaction {
        value: String,
    },
    #[serde(rename_all = "camelCase")]
    NewBlock {
        block_hash: String,
        /// Carried through from the block source, not interpreted.
        #[serde(default)]
        parent: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Finalized {
        block_hash: String,
    },
}

impl IncomingEvent {
    pub fn new_transaction(hash: impl Into<String>) -> Self {
        IncomingEvent::NewTransaction { value: hash.into() }
    }

    pub fn new_block(block_hash: impl Into<String>) -> Self {
        IncomingEvent::NewBlock {
            block_hash: block_hash.into(),
            parent: None,
        }
    }

    pub fn finalized(block_hash: impl Into<String>) -> Self {
        IncomingEvent::Finalized {
            block_hash: block_hash.into(),
        }
    }
}

/// Notifications published by the tracker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum OutputEvent {
    #[serde(rename_all = "camelCase")]
    TxSettled { tx_hash: String, state: SettlementState },
    #[serde(rename_all = "camelCase")]
    TxDone { tx_hash: String, state: SettlementState },
}
