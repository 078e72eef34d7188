//! Chain query seam and an in-memory implementation

use crate::error::QueryError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Answers validity questions about a (block, transaction) pair.
///
/// Both queries return [`QueryError::NotFound`] when the transaction is not
/// part of the block's execution. `is_tx_successful` is only asked after
/// `is_tx_valid` returned `true` for the same pair.
#[async_trait]
pub trait ChainQuery: Send + Sync {
    async fn is_tx_valid(&self, block_hash: &str, tx_hash: &str) -> Result<bool, QueryError>;

    async fn is_tx_successful(&self, block_hash: &str, tx_hash: &str)
        -> Result<bool, QueryError>;
}

#[async_trait]
impl<T: ChainQuery + ?Sized> ChainQuery for Arc<T> {
    async fn is_tx_valid(&self, block_hash: &str, tx_hash: &str) -> Result<bool, QueryError> {
        (**self).is_tx_valid(block_hash, tx_hash).await
    }

    async fn is_tx_successful(
        &self,
        block_hash: &str,
        tx_hash: &str,
    ) -> Result<bool, QueryError> {
        (**self).is_tx_successful(block_hash, tx_hash).await
    }
}

/// Execution result of a transaction inside a block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxOutcome {
    pub valid: bool,
    pub successful: bool,
}

impl TxOutcome {
    pub fn successful() -> Self {
        Self { valid: true, successful: true }
    }

    pub fn failed() -> Self {
        Self { valid: true, successful: false }
    }

    pub fn invalid() -> Self {
        Self { valid: false, successful: false }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    Valid,
    Successful,
}

/// One query received by a [`StaticChain`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryCall {
    pub kind: QueryKind,
    pub block_hash: String,
    pub tx_hash: String,
}

#[derive(Debug, Clone)]
enum Entry {
    Executed(TxOutcome),
    /// Valid, but the success query answers `NotFound`.
    MissingReceipt,
    Failing(String),
}

/// In-memory chain keyed by (block, transaction).
///
/// Pairs without an entry answer with `NotFound`. Every query is recorded.
#[derive(Debug, Default)]
pub struct StaticChain {
    entries: RwLock<HashMap<(String, String), Entry>>,
    calls: RwLock<Vec<QueryCall>>,
}

impl StaticChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_outcome(
        mut self,
        block_hash: impl Into<String>,
        tx_hash: impl Into<String>,
        outcome: TxOutcome,
    ) -> Self {
        self.entries
            .get_mut()
            .insert((block_hash.into(), tx_hash.into()), Entry::Executed(outcome));
        self
    }

    /// Make every query for the pair fail with an RPC error
    pub fn with_failure(
        mut self,
        block_hash: impl Into<String>,
        tx_hash: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        self.entries
            .get_mut()
            .insert((block_hash.into(), tx_hash.into()), Entry::Failing(message.into()));
        self
    }

    /// Answer `true` to the validity query and `NotFound` to the success query
    pub fn with_missing_receipt(
        mut self,
        block_hash: impl Into<String>,
        tx_hash: impl Into<String>,
    ) -> Self {
        self.entries
            .get_mut()
            .insert((block_hash.into(), tx_hash.into()), Entry::MissingReceipt);
        self
    }

    pub async fn set_missing_receipt(
        &self,
        block_hash: impl Into<String>,
        tx_hash: impl Into<String>,
    ) {
        self.entries
            .write()
            .await
            .insert((block_hash.into(), tx_hash.into()), Entry::MissingReceipt);
    }

    pub async fn set_outcome(
        &self,
        block_hash: impl Into<String>,
        tx_hash: impl Into<String>,
        outcome: TxOutcome,
    ) {
        self.entries
            .write()
            .await
            .insert((block_hash.into(), tx_hash.into()), Entry::Executed(outcome));
    }

    pub async fn set_failure(
        &self,
        block_hash: impl Into<String>,
        tx_hash: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.entries
            .write()
            .await
            .insert((block_hash.into(), tx_hash.into()), Entry::Failing(message.into()));
    }

    /// Drop the pair so that further queries answer `NotFound`
    pub async fn remove_outcome(&self, block_hash: &str, tx_hash: &str) {
        self.entries
            .write()
            .await
            .remove(&(block_hash.to_string(), tx_hash.to_string()));
    }

    pub async fn calls(&self) -> Vec<QueryCall> {
        self.calls.read().await.clone()
    }

    pub async fn call_count(&self, kind: QueryKind) -> usize {
        self.calls
            .read()
            .await
            .iter()
            .filter(|call| call.kind == kind)
            .count()
    }

    async fn lookup(
        &self,
        kind: QueryKind,
        block_hash: &str,
        tx_hash: &str,
    ) -> Result<TxOutcome, QueryError> {
        self.calls.write().await.push(QueryCall {
            kind,
            block_hash: block_hash.to_string(),
            tx_hash: tx_hash.to_string(),
        });

        let entries = self.entries.read().await;
        match entries.get(&(block_hash.to_string(), tx_hash.to_string())) {
            Some(Entry::Executed(outcome)) => Ok(*outcome),
            Some(Entry::MissingReceipt) => match kind {
                QueryKind::Valid => Ok(TxOutcome::successful()),
                QueryKind::Successful => Err(QueryError::not_found(block_hash, tx_hash)),
            },
            Some(Entry::Failing(message)) => Err(QueryError::Rpc(message.clone())),
            None => Err(QueryError::not_found(block_hash, tx_hash)),
        }
    }
}

#[async_trait]
impl ChainQuery for StaticChain {
    async fn is_tx_valid(&self, block_hash: &str, tx_hash: &str) -> Result<bool, QueryError> {
        let outcome = self.lookup(QueryKind::Valid, block_hash, tx_hash).await?;
        Ok(outcome.valid)
    }

    async fn is_tx_successful(
        &self,
        block_hash: &str,
        tx_hash: &str,
    ) -> Result<bool, QueryError> {
        let outcome = self.lookup(QueryKind::Successful, block_hash, tx_hash).await?;
        Ok(outcome.successful)
    }
}
