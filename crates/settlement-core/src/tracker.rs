//! Settlement tracker state machine

use crate::chain::ChainQuery;
use crate::config::{FinalityPolicy, TrackerConfig};
use crate::error::{QueryError, Result};
use crate::events::OutputSink;
use crate::models::{IncomingEvent, SettlementState, TxRecord};
use std::collections::HashMap;
use tracing::{debug, trace};

/// Tracks in which blocks each known transaction settled and which of those
/// settlements became final.
///
/// Events must be handed in one at a time; `handle` takes `&mut self` and
/// awaits every chain query before moving on.
pub struct SettlementTracker<C, S> {
    chain: C,
    sink: S,
    config: TrackerConfig,
    transactions: Vec<TxRecord>,
    index: HashMap<String, usize>,
    blocks: Vec<String>,
}

impl<C: ChainQuery, S: OutputSink> SettlementTracker<C, S> {
    /// Create a tracker with the default finality policy
    pub fn new(chain: C, sink: S) -> Self {
        Self::with_config(chain, sink, TrackerConfig::default())
    }

    /// Create a tracker with an explicit configuration
    pub fn with_config(chain: C, sink: S, config: TrackerConfig) -> Self {
        Self {
            chain,
            sink,
            config,
            transactions: Vec::new(),
            index: HashMap::new(),
            blocks: Vec::new(),
        }
    }

    /// Apply one event.
    ///
    /// A transaction missing from a block is not an error. Any other chain
    /// query failure aborts the event and is returned to the caller.
    pub async fn handle(&mut self, event: IncomingEvent) -> Result<()> {
        match event {
            IncomingEvent::NewTransaction { value } => self.on_new_transaction(value).await,
            IncomingEvent::NewBlock { block_hash, .. } => self.on_new_block(block_hash).await,
            IncomingEvent::Finalized { block_hash } => self.on_finalized(&block_hash).await,
        }
    }

    async fn on_new_transaction(&mut self, hash: String) -> Result<()> {
        let position = self.ensure_record(hash);
        let record = &mut self.transactions[position];
        for block_hash in &self.blocks {
            settle(&self.chain, &self.sink, record, block_hash).await?;
        }
        Ok(())
    }

    async fn on_new_block(&mut self, block_hash: String) -> Result<()> {
        self.blocks.push(block_hash.clone());
        for record in self.transactions.iter_mut() {
            settle(&self.chain, &self.sink, record, &block_hash).await?;
        }
        Ok(())
    }

    async fn on_finalized(&mut self, block_hash: &str) -> Result<()> {
        let policy = self.config.finality;
        for record in self.transactions.iter_mut() {
            if !record.is_settled_in(block_hash) {
                continue;
            }
            let already_final = match policy {
                FinalityPolicy::PerBlock => record.finalized_in.as_deref() == Some(block_hash),
                FinalityPolicy::Once => record.finalized_in.is_some(),
            };
            if already_final {
                continue;
            }
            finalize(&self.chain, &self.sink, record, block_hash).await?;
        }
        Ok(())
    }

    fn ensure_record(&mut self, hash: String) -> usize {
        if let Some(&position) = self.index.get(&hash) {
            return position;
        }
        let position = self.transactions.len();
        self.index.insert(hash.clone(), position);
        self.transactions.push(TxRecord::new(hash));
        position
    }

    /// Look up the record for a transaction hash
    pub fn transaction(&self, hash: &str) -> Option<&TxRecord> {
        self.index.get(hash).map(|&position| &self.transactions[position])
    }

    /// Known transactions in the order they were first seen
    pub fn transactions(&self) -> &[TxRecord] {
        &self.transactions
    }

    /// Block ledger in arrival order, duplicates included
    pub fn blocks(&self) -> &[String] {
        &self.blocks
    }

    pub fn chain(&self) -> &C {
        &self.chain
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }
}

async fn query_state<C: ChainQuery>(
    chain: &C,
    block_hash: &str,
    tx_hash: &str,
) -> std::result::Result<SettlementState, QueryError> {
    let state = if chain.is_tx_valid(block_hash, tx_hash).await? {
        let successful = chain.is_tx_successful(block_hash, tx_hash).await?;
        SettlementState::valid(block_hash, successful)
    } else {
        SettlementState::invalid(block_hash)
    };
    Ok(state)
}

async fn settle<C: ChainQuery, S: OutputSink>(
    chain: &C,
    sink: &S,
    record: &mut TxRecord,
    block_hash: &str,
) -> Result<()> {
    if record.is_settled_in(block_hash) {
        return Ok(());
    }

    let state = match query_state(chain, block_hash, &record.hash).await {
        Ok(state) => state,
        Err(err) if err.is_not_found() => {
            trace!("Transaction {} not in block {}", record.hash, block_hash);
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };

    record.seen_in_blocks.insert(block_hash.to_string());
    debug!("Transaction {} settled in block {}: {:?}", record.hash, block_hash, state);
    sink.on_tx_settled(&record.hash, state);
    Ok(())
}

async fn finalize<C: ChainQuery, S: OutputSink>(
    chain: &C,
    sink: &S,
    record: &mut TxRecord,
    block_hash: &str,
) -> Result<()> {
    // Recorded before querying so a failed query is never retried for this block.
    record.finalized_in = Some(block_hash.to_string());

    let state = match query_state(chain, block_hash, &record.hash).await {
        Ok(state) => state,
        Err(err) if err.is_not_found() => {
            trace!("Transaction {} vanished from finalized block {}", record.hash, block_hash);
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };

    debug!("Transaction {} final in block {}", record.hash, block_hash);
    sink.on_tx_done(&record.hash, state);
    Ok(())
}
