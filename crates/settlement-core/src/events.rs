//! Output side of the tracker: the sink trait and a broadcast-backed emitter

use crate::error::{Result, TrackerError};
use crate::models::{OutputEvent, SettlementState};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Receives settlement notifications. Calls are fire-and-forget.
pub trait OutputSink: Send + Sync {
    fn on_tx_settled(&self, tx_hash: &str, state: SettlementState);

    fn on_tx_done(&self, tx_hash: &str, state: SettlementState);
}

impl<T: OutputSink + ?Sized> OutputSink for Arc<T> {
    fn on_tx_settled(&self, tx_hash: &str, state: SettlementState) {
        (**self).on_tx_settled(tx_hash, state)
    }

    fn on_tx_done(&self, tx_hash: &str, state: SettlementState) {
        (**self).on_tx_done(tx_hash, state)
    }
}

/// Event emitter for broadcasting settlement events
#[derive(Clone)]
pub struct EventEmitter {
    sender: broadcast::Sender<OutputEvent>,
}

impl EventEmitter {
    /// Create a new event emitter with the specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    fn emit(&self, event: OutputEvent) {
        match self.sender.send(event) {
            Ok(count) => log::debug!("Event sent to {} subscribers", count),
            Err(_) => log::debug!("No active subscribers for event"),
        }
    }

    /// Subscribe to events
    pub fn subscribe(&self) -> broadcast::Receiver<OutputEvent> {
        self.sender.subscribe()
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventEmitter {
    fn default() -> Self {
        Self::new(1000)
    }
}

impl OutputSink for EventEmitter {
    fn on_tx_settled(&self, tx_hash: &str, state: SettlementState) {
        self.emit(OutputEvent::TxSettled {
            tx_hash: tx_hash.to_string(),
            state,
        });
    }

    fn on_tx_done(&self, tx_hash: &str, state: SettlementState) {
        self.emit(OutputEvent::TxDone {
            tx_hash: tx_hash.to_string(),
            state,
        });
    }
}

/// Event subscriber for receiving settlement events
pub struct EventSubscriber {
    receiver: broadcast::Receiver<OutputEvent>,
}

impl EventSubscriber {
    /// Create a new event subscriber from an emitter
    pub fn new(emitter: &EventEmitter) -> Self {
        Self {
            receiver: emitter.subscribe(),
        }
    }

    /// Receive the next event
    pub async fn recv(&mut self) -> Result<OutputEvent> {
        self.receiver
            .recv()
            .await
            .map_err(|e| TrackerError::EventSystem(e.to_string()))
    }

    /// Try to receive the next event without blocking
    pub fn try_recv(&mut self) -> Result<Option<OutputEvent>> {
        match self.receiver.try_recv() {
            Ok(event) => Ok(Some(event)),
            Err(broadcast::error::TryRecvError::Empty) => Ok(None),
            Err(e) => Err(TrackerError::EventSystem(e.to_string())),
        }
    }

    /// Everything currently buffered, in emission order
    pub fn drain(&mut self) -> Result<Vec<OutputEvent>> {
        let mut events = Vec::new();
        while let Some(event) = self.try_recv()? {
            events.push(event);
        }
        Ok(events)
    }
}
