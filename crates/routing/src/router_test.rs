//! Weighted router tests

use ferry_protocol::Message;
use tokio::sync::mpsc;

use crate::{AnalyzerHandle, AnalyzerId, WeightedRouter, MAX_ROUTE_ATTEMPTS};

fn handle(id: &str, capacity: usize) -> (AnalyzerHandle, Vec<mpsc::Receiver<Message>>) {
    AnalyzerHandle::channel(AnalyzerId::new(id), capacity)
}

fn drain(rx: &mut mpsc::Receiver<Message>) -> usize {
    let mut n = 0;
    while rx.try_recv().is_ok() {
        n += 1;
    }
    n
}

// ============================================================================
// Membership
// ============================================================================

#[test]
fn test_register_publishes_total_weight() {
    let router = WeightedRouter::new();
    assert_eq!(router.analyzer_count(), 0);
    assert_eq!(router.total_weight(), 0.0);

    let (a, _rx_a) = handle("a", 1);
    let (b, _rx_b) = handle("b", 1);
    router.register(a, 0.75);
    router.register(b, 0.25);

    assert_eq!(router.analyzer_count(), 2);
    assert!((router.total_weight() - 1.0).abs() < 1e-6);
}

#[test]
fn test_unregister_removes_weight() {
    let router = WeightedRouter::new();
    let (a, _rx_a) = handle("a", 1);
    let (b, _rx_b) = handle("b", 1);
    router.register(a, 0.75);
    router.register(b, 0.25);

    assert!(router.unregister(&AnalyzerId::new("a")));
    assert_eq!(router.analyzer_count(), 1);
    assert!((router.total_weight() - 0.25).abs() < 1e-6);

    // Second unregister of the same id is a no-op
    assert!(!router.unregister(&AnalyzerId::new("a")));
    assert_eq!(router.analyzer_count(), 1);
}

#[test]
fn test_update_weight_replaces_share() {
    let router = WeightedRouter::new();
    let (a, _rx_a) = handle("a", 1);
    router.register(a, 0.25);

    assert!(router.update_weight(&AnalyzerId::new("a"), 0.9));
    assert_eq!(router.analyzer_count(), 1);
    assert!((router.total_weight() - 0.9).abs() < 1e-6);
}

#[test]
fn test_update_weight_same_value_is_idempotent() {
    let router = WeightedRouter::new();
    let (a, _rx_a) = handle("a", 1);
    let (b, _rx_b) = handle("b", 1);
    router.register(a, 0.5);
    router.register(b, 0.5);

    assert!(router.update_weight(&AnalyzerId::new("a"), 0.5));
    assert_eq!(router.analyzer_count(), 2);
    assert!((router.total_weight() - 1.0).abs() < 1e-6);
}

#[test]
fn test_update_weight_unknown_id() {
    let router = WeightedRouter::new();
    assert!(!router.update_weight(&AnalyzerId::new("ghost"), 1.0));
}

// ============================================================================
// Routing
// ============================================================================

#[tokio::test]
async fn test_route_delivers_to_priority_queue() {
    let router = WeightedRouter::new();
    let (a, mut receivers) = handle("a", 16);
    router.register(a, 1.0);

    assert!(router.route(Message::build(2, b"hello")).await);

    let msg = receivers[2].try_recv().unwrap();
    assert_eq!(msg.payload(), b"hello");
    assert_eq!(router.metrics().snapshot().messages_routed, 1);
}

#[tokio::test]
async fn test_route_with_no_analyzers_drops() {
    let router = WeightedRouter::new();

    assert!(!router.route(Message::build(0, b"orphan")).await);

    let snapshot = router.metrics().snapshot();
    assert_eq!(snapshot.messages_dropped, 1);
    assert_eq!(snapshot.route_retries, MAX_ROUTE_ATTEMPTS as u64);
}

#[tokio::test]
async fn test_route_zero_total_weight_drops() {
    let router = WeightedRouter::new();
    let (a, _rx) = handle("a", 16);
    router.register(a, 0.0);

    assert!(!router.route(Message::build(0, b"x")).await);
    assert_eq!(router.metrics().snapshot().messages_dropped, 1);
}

#[tokio::test]
async fn test_route_full_queue_exhausts_attempts() {
    let router = WeightedRouter::new();
    let (a, mut receivers) = handle("a", 1);
    router.register(a, 1.0);

    assert!(router.route(Message::build(7, b"first")).await);
    assert!(!router.route(Message::build(7, b"second")).await);

    let snapshot = router.metrics().snapshot();
    assert_eq!(snapshot.messages_routed, 1);
    assert_eq!(snapshot.messages_dropped, 1);
    assert_eq!(snapshot.route_retries, MAX_ROUTE_ATTEMPTS as u64);

    // Only the first message made it; no duplicates materialised
    let msg = receivers[7].try_recv().unwrap();
    assert_eq!(msg.payload(), b"first");
    assert!(receivers[7].try_recv().is_err());
}

#[tokio::test]
async fn test_route_other_priorities_unaffected_by_full_queue() {
    let router = WeightedRouter::new();
    let (a, mut receivers) = handle("a", 1);
    router.register(a, 1.0);

    assert!(router.route(Message::build(7, b"fills")).await);
    assert!(router.route(Message::build(0, b"urgent")).await);

    assert_eq!(receivers[0].try_recv().unwrap().payload(), b"urgent");
    assert_eq!(receivers[7].try_recv().unwrap().payload(), b"fills");
}

#[tokio::test]
async fn test_route_recovers_after_registration() {
    let router = WeightedRouter::new();
    let (a, mut receivers) = handle("a", 4);
    router.register(a, 1.0);
    router.unregister(&AnalyzerId::new("a"));

    // Unregistered: drops
    assert!(!router.route(Message::build(1, b"lost")).await);

    // Re-registered under a fresh handle: delivers again
    let (a2, mut receivers2) = handle("a", 4);
    router.register(a2, 1.0);
    assert!(router.route(Message::build(1, b"found")).await);

    assert_eq!(drain(&mut receivers[1]), 0);
    assert_eq!(drain(&mut receivers2[1]), 1);
}

#[tokio::test]
async fn test_route_distribution_follows_weights() {
    let router = WeightedRouter::new();
    let (a, mut rx_a) = handle("a", 8192);
    let (b, mut rx_b) = handle("b", 8192);
    router.register(a, 0.75);
    router.register(b, 0.25);

    const TOTAL: usize = 4_000;
    for _ in 0..TOTAL {
        assert!(router.route(Message::build(0, b"m")).await);
    }

    let got_a = drain(&mut rx_a[0]);
    let got_b = drain(&mut rx_b[0]);
    assert_eq!(got_a + got_b, TOTAL);

    // 0.75 of 4000 = 3000; 200 is far outside statistical noise
    assert!(
        (2_800..=3_200).contains(&got_a),
        "analyzer a received {got_a} of {TOTAL}"
    );
}
