//! Integration tests for the settlement-core crate

use settlement_core::{
    EventEmitter, EventSubscriber, IncomingEvent, OutputEvent, QueryKind, SettlementState,
    SettlementTracker, StaticChain, TxOutcome,
};
use std::sync::Arc;

type Tracker = SettlementTracker<Arc<StaticChain>, EventEmitter>;

fn tracker(chain: StaticChain) -> (Tracker, Arc<StaticChain>, EventSubscriber) {
    let chain = Arc::new(chain);
    let emitter = EventEmitter::default();
    let subscriber = EventSubscriber::new(&emitter);
    (SettlementTracker::new(chain.clone(), emitter), chain, subscriber)
}

async fn replay(tracker: &mut Tracker, events: Vec<IncomingEvent>) {
    for event in events {
        tracker.handle(event).await.unwrap();
    }
}

fn settled(tx_hash: &str, state: SettlementState) -> OutputEvent {
    OutputEvent::TxSettled {
        tx_hash: tx_hash.to_string(),
        state,
    }
}

fn done(tx_hash: &str, state: SettlementState) -> OutputEvent {
    OutputEvent::TxDone {
        tx_hash: tx_hash.to_string(),
        state,
    }
}

#[tokio::test]
async fn test_settlement_is_idempotent() {
    let (mut tracker, chain, mut subscriber) =
        tracker(StaticChain::new().with_outcome("B1", "T1", TxOutcome::successful()));

    replay(
        &mut tracker,
        vec![
            IncomingEvent::new_transaction("T1"),
            IncomingEvent::new_block("B1"),
            IncomingEvent::new_block("B1"),
            IncomingEvent::new_transaction("T1"),
        ],
    )
    .await;

    assert_eq!(
        subscriber.drain().unwrap(),
        vec![settled("T1", SettlementState::valid("B1", true))]
    );
    assert_eq!(chain.call_count(QueryKind::Valid).await, 1);
    assert_eq!(tracker.blocks().len(), 2);
}

#[tokio::test]
async fn test_done_only_after_settled() {
    let chain = StaticChain::new()
        .with_outcome("B1", "T1", TxOutcome::successful())
        .with_outcome("B2", "T2", TxOutcome::failed());
    let (mut tracker, _chain, mut subscriber) = tracker(chain);

    replay(
        &mut tracker,
        vec![
            IncomingEvent::finalized("B1"),
            IncomingEvent::new_transaction("T1"),
            IncomingEvent::finalized("B1"),
            IncomingEvent::new_block("B1"),
            IncomingEvent::new_transaction("T2"),
            IncomingEvent::new_block("B2"),
            IncomingEvent::finalized("B2"),
            IncomingEvent::finalized("B1"),
        ],
    )
    .await;

    let events = subscriber.drain().unwrap();
    for (position, event) in events.iter().enumerate() {
        if let OutputEvent::TxDone { tx_hash, state } = event {
            let expected = settled(tx_hash, state.clone());
            assert!(
                events[..position].contains(&expected),
                "{:?} reported done before settled",
                event
            );
        }
    }
    assert_eq!(
        events,
        vec![
            settled("T1", SettlementState::valid("B1", true)),
            settled("T2", SettlementState::valid("B2", false)),
            done("T2", SettlementState::valid("B2", false)),
            done("T1", SettlementState::valid("B1", true)),
        ]
    );
}

#[tokio::test]
async fn test_not_found_is_silent() {
    let (mut tracker, chain, mut subscriber) = tracker(StaticChain::new());

    replay(
        &mut tracker,
        vec![
            IncomingEvent::new_block("B1"),
            IncomingEvent::new_transaction("T1"),
            IncomingEvent::finalized("B1"),
        ],
    )
    .await;

    assert!(subscriber.drain().unwrap().is_empty());
    let record = tracker.transaction("T1").unwrap();
    assert!(record.seen_in_blocks.is_empty());
    assert!(record.finalized_in.is_none());
    assert_eq!(chain.call_count(QueryKind::Successful).await, 0);

    // The transaction lands later and is picked up by the next block event.
    chain.set_outcome("B2", "T1", TxOutcome::successful()).await;
    tracker.handle(IncomingEvent::new_block("B2")).await.unwrap();
    assert_eq!(
        subscriber.drain().unwrap(),
        vec![settled("T1", SettlementState::valid("B2", true))]
    );
}

#[tokio::test]
async fn test_event_order_does_not_change_settlement() {
    let outcomes = || StaticChain::new().with_outcome("B1", "T1", TxOutcome::failed());

    let (mut tx_first, _, mut tx_first_events) = tracker(outcomes());
    replay(
        &mut tx_first,
        vec![IncomingEvent::new_transaction("T1"), IncomingEvent::new_block("B1")],
    )
    .await;

    let (mut block_first, _, mut block_first_events) = tracker(outcomes());
    replay(
        &mut block_first,
        vec![IncomingEvent::new_block("B1"), IncomingEvent::new_transaction("T1")],
    )
    .await;

    let expected = vec![settled("T1", SettlementState::valid("B1", false))];
    assert_eq!(tx_first_events.drain().unwrap(), expected);
    assert_eq!(block_first_events.drain().unwrap(), expected);
    assert_eq!(tx_first.transaction("T1"), block_first.transaction("T1"));
}

#[tokio::test]
async fn test_settle_then_finalize_scenario() {
    let (mut tracker, _chain, mut subscriber) =
        tracker(StaticChain::new().with_outcome("B1", "T1", TxOutcome::successful()));

    replay(
        &mut tracker,
        vec![IncomingEvent::new_block("B1"), IncomingEvent::new_transaction("T1")],
    )
    .await;
    assert_eq!(
        subscriber.drain().unwrap(),
        vec![settled("T1", SettlementState::valid("B1", true))]
    );

    tracker.handle(IncomingEvent::finalized("B1")).await.unwrap();
    assert_eq!(
        subscriber.drain().unwrap(),
        vec![done("T1", SettlementState::valid("B1", true))]
    );
    assert_eq!(tracker.transaction("T1").unwrap().finalized_in.as_deref(), Some("B1"));

    tracker.handle(IncomingEvent::finalized("B1")).await.unwrap();
    assert!(subscriber.drain().unwrap().is_empty());
}

#[tokio::test]
async fn test_invalid_transaction_skips_success_query() {
    let (mut tracker, chain, mut subscriber) =
        tracker(StaticChain::new().with_outcome("B2", "T2", TxOutcome::invalid()));

    replay(
        &mut tracker,
        vec![IncomingEvent::new_transaction("T2"), IncomingEvent::new_block("B2")],
    )
    .await;

    assert_eq!(
        subscriber.drain().unwrap(),
        vec![settled("T2", SettlementState::invalid("B2"))]
    );
    assert_eq!(chain.call_count(QueryKind::Successful).await, 0);
}

#[tokio::test]
async fn test_finalizing_unseen_block_is_noop() {
    let (mut tracker, chain, mut subscriber) =
        tracker(StaticChain::new().with_outcome("B1", "T1", TxOutcome::successful()));

    replay(
        &mut tracker,
        vec![
            IncomingEvent::new_block("B1"),
            IncomingEvent::new_transaction("T1"),
            IncomingEvent::new_block("B3"),
        ],
    )
    .await;
    subscriber.drain().unwrap();
    let queries_before = chain.calls().await.len();

    tracker.handle(IncomingEvent::finalized("B3")).await.unwrap();

    assert!(subscriber.drain().unwrap().is_empty());
    assert!(tracker.transaction("T1").unwrap().finalized_in.is_none());
    assert_eq!(chain.calls().await.len(), queries_before);
}
