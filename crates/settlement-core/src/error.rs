//! Error types for the settlement tracker

use thiserror::Error;

/// Failure reported by a [`ChainQuery`](crate::chain::ChainQuery) implementation.
#[derive(Error, Debug)]
pub enum QueryError {
    /// The transaction is not part of the block's execution trace.
    #[error("Transaction {tx_hash} not found in block {block_hash}")]
    NotFound { block_hash: String, tx_hash: String },

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl QueryError {
    pub fn not_found(block_hash: impl Into<String>, tx_hash: impl Into<String>) -> Self {
        QueryError::NotFound {
            block_hash: block_hash.into(),
            tx_hash: tx_hash.into(),
        }
    }

    /// True for the benign "not in this block" outcome.
    pub fn is_not_found(&self) -> bool {
        matches!(self, QueryError::NotFound { .. })
    }
}

#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("Chain query error: {0}")]
    Query(#[from] QueryError),

    #[error("Event system error: {0}")]
    EventSystem(String),
}

pub type Result<T> = std::result::Result<T, TrackerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_is_distinguishable() {
        let err = QueryError::not_found("B1", "T1");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Transaction T1 not found in block B1");

        let err = QueryError::Rpc("connection reset".to_string());
        assert!(!err.is_not_found());

        let err: QueryError = anyhow::anyhow!("decode failure").into();
        assert!(!err.is_not_found());
        assert_eq!(err.to_string(), "decode failure");
    }
}
