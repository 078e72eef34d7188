//! Host task that serializes incoming events into one tracker

use crate::config::ListenerConfig;
use crate::error::{ListenerError, Result};
use settlement_core::{ChainQuery, IncomingEvent, OutputSink, SettlementTracker};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, RwLock};
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Runs one [`SettlementTracker`] on a dedicated task and feeds it the events
/// submitted through any number of [`EventHandle`]s, one at a time.
pub struct SettlementListener<C, S> {
    inner: Arc<RwLock<ListenerInner<C, S>>>,
    config: ListenerConfig,
}

struct ListenerInner<C, S> {
    tracker: Option<SettlementTracker<C, S>>,
    is_running: bool,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<SettlementTracker<C, S>>>,
}

/// Cloneable entry point for event producers
#[derive(Clone)]
pub struct EventHandle {
    sender: mpsc::Sender<IncomingEvent>,
}

impl EventHandle {
    pub async fn submit(&self, event: IncomingEvent) -> Result<()> {
        self.sender
            .send(event)
            .await
            .map_err(|e| ListenerError::EventChannel(e.to_string()))
    }
}

impl<C, S> SettlementListener<C, S>
where
    C: ChainQuery + 'static,
    S: OutputSink + 'static,
{
    pub fn new(chain: C, sink: S, config: ListenerConfig) -> Self {
        let tracker = SettlementTracker::with_config(chain, sink, config.tracker.clone());
        Self {
            inner: Arc::new(RwLock::new(ListenerInner {
                tracker: Some(tracker),
                is_running: false,
                shutdown_tx: None,
                task: None,
            })),
            config,
        }
    }

    pub fn config(&self) -> &ListenerConfig {
        &self.config
    }

    /// Spawn the tracker task. The task ends when `stop` is called, when
    /// every handle has been dropped, or on a query failure if
    /// `stop_on_query_error` is set.
    pub async fn start(&self) -> Result<EventHandle> {
        let mut guard = self.inner.write().await;
        if guard.is_running {
            return Err(ListenerError::AlreadyRunning);
        }
        let mut tracker = guard.tracker.take().ok_or(ListenerError::Finished)?;

        let (event_tx, mut event_rx) = mpsc::channel(self.config.event_channel_capacity);
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();
        let stop_on_query_error = self.config.stop_on_query_error;
        let inner = self.inner.clone();

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = &mut shutdown_rx => {
                        info!("Settlement tracker stopped by request");
                        break;
                    }
                    event = event_rx.recv() => {
                        let Some(event) = event else {
                            info!("All event producers closed");
                            break;
                        };
                        if let Err(e) = tracker.handle(event).await {
                            error!("Failed to apply event: {}", e);
                            if stop_on_query_error {
                                break;
                            }
                        }
                    }
                }
            }

            inner.write().await.is_running = false;
            tracker
        });

        guard.is_running = true;
        guard.shutdown_tx = Some(shutdown_tx);
        guard.task = Some(task);

        info!("Settlement listener started");
        Ok(EventHandle { sender: event_tx })
    }

    /// Signal the task to stop and hand back the tracker.
    ///
    /// Events still queued at that point are dropped.
    pub async fn stop(&self) -> Result<SettlementTracker<C, S>> {
        let shutdown_tx = self.inner.write().await.shutdown_tx.take();
        if let Some(shutdown_tx) = shutdown_tx {
            let _ = shutdown_tx.send(());
        }
        self.join().await
    }

    /// Wait for the task to finish on its own and hand back the tracker.
    pub async fn join(&self) -> Result<SettlementTracker<C, S>> {
        // The task takes the write lock on exit, so the guard is released
        // before awaiting it. The shutdown sender must outlive the task.
        let task = self.inner.write().await.task.take();
        let task = task.ok_or(ListenerError::NotRunning)?;
        let tracker = task.await?;
        self.inner.write().await.shutdown_tx = None;
        info!("Settlement listener finished");
        Ok(tracker)
    }

    pub async fn is_running(&self) -> bool {
        self.inner.read().await.is_running
    }
}
