//! Pending list tests

use ferry_protocol::{Message, SEQ_MASK};

use crate::pending::PendingList;

fn msg(tag: u8) -> Message {
    Message::build(1, &[tag])
}

#[test]
fn test_sequences_start_at_one() {
    let mut pending = PendingList::new();

    assert_eq!(pending.push(msg(0)), 1);
    assert_eq!(pending.push(msg(1)), 2);
    assert_eq!(pending.push(msg(2)), 3);
    assert_eq!(pending.last_assigned(), 3);
    assert_eq!(pending.last_acked(), 0);
}

#[test]
fn test_fifo_order_and_invariant() {
    let mut pending = PendingList::new();
    for i in 0..10u8 {
        pending.push(msg(i));
    }

    assert_eq!(pending.len(), 10);
    assert_eq!(pending.in_flight(), 10);

    // Entries are FIFO by sequence number
    let seqs: Vec<u32> = pending.entries().iter().map(|e| e.seq).collect();
    assert_eq!(seqs, (1..=10).collect::<Vec<u32>>());
}

#[test]
fn test_cumulative_ack_pops_head_first() {
    let mut pending = PendingList::new();
    for i in 0..5u8 {
        pending.push(msg(i));
    }

    assert_eq!(pending.ack(3), 3);
    assert_eq!(pending.last_acked(), 3);
    assert_eq!(pending.len(), 2);
    assert_eq!(pending.in_flight(), 2);

    // The surviving entries are the unacked tail
    let seqs: Vec<u32> = pending.entries().iter().map(|e| e.seq).collect();
    assert_eq!(seqs, vec![4, 5]);

    assert_eq!(pending.ack(5), 2);
    assert!(pending.is_empty());
    assert_eq!(pending.in_flight(), 0);
}

#[test]
fn test_duplicate_ack_is_noop() {
    let mut pending = PendingList::new();
    pending.push(msg(0));
    pending.push(msg(1));

    assert_eq!(pending.ack(2), 2);
    assert_eq!(pending.ack(2), 0);
    assert_eq!(pending.last_acked(), 2);
}

#[test]
fn test_ack_beyond_pending_stops_at_empty() {
    let mut pending = PendingList::new();
    for i in 0..3u8 {
        pending.push(msg(i));
    }

    // Acks more than was ever sent: releases what exists, then stops
    assert_eq!(pending.ack(100), 3);
    assert!(pending.is_empty());
    assert_eq!(pending.last_acked(), 3);
}

#[test]
fn test_sequence_wrap_at_two_to_the_thirty_one() {
    let near_wrap = SEQ_MASK - 1;
    let mut pending = PendingList::with_counters(near_wrap, near_wrap);

    assert_eq!(pending.push(msg(0)), SEQ_MASK);
    assert_eq!(pending.push(msg(1)), 0);
    assert_eq!(pending.push(msg(2)), 1);
    assert_eq!(pending.in_flight(), 3);
    assert_eq!(pending.len(), 3);

    // Cumulative ACK across the wrap boundary
    assert_eq!(pending.ack(0), 2);
    assert_eq!(pending.last_acked(), 0);
    assert_eq!(pending.in_flight(), 1);

    assert_eq!(pending.ack(1), 1);
    assert!(pending.is_empty());
}

#[test]
fn test_drain_preserves_fifo() {
    let mut pending = PendingList::new();
    for i in 0..4u8 {
        pending.push(msg(i));
    }

    let drained = pending.drain();
    assert!(pending.is_empty());

    let tags: Vec<u8> = drained.iter().map(|m| m.payload()[0]).collect();
    assert_eq!(tags, vec![0, 1, 2, 3]);

    // Counters survive the drain: in_flight reflects unacked assignments
    assert_eq!(pending.in_flight(), 4);
}

#[test]
fn test_oldest_sent_at_tracks_head() {
    let mut pending = PendingList::new();
    assert!(pending.oldest_sent_at().is_none());

    pending.push(msg(0));
    let first = pending.oldest_sent_at().unwrap();
    pending.push(msg(1));

    // Head timestamp is the first message's, not the latest push
    assert_eq!(pending.oldest_sent_at().unwrap(), first);

    pending.ack(1);
    assert!(pending.oldest_sent_at().unwrap() >= first);
}
