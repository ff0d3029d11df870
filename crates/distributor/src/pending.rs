//! Pending-acknowledgement list
//!
//! FIFO of messages written to an analyzer socket but not yet covered by a
//! cumulative ACK. Sequence numbers live in a 31-bit space (the wire reserves
//! the MSB for frame discrimination): the first message gets sequence 1 and
//! the counter wraps from 2³¹ − 1 back to 0.
//!
//! Invariant: `(next_seq − last_acked) mod 2³¹ == len()` - the list holds
//! exactly the messages between the last acknowledged sequence number and the
//! last assigned one.

use std::collections::VecDeque;
use std::time::Instant;

use ferry_protocol::{Message, SEQ_MASK};

/// One unacknowledged message
#[derive(Debug)]
pub(crate) struct PendingEntry {
    pub(crate) seq: u32,
    pub(crate) message: Message,
    pub(crate) sent_at: Instant,
}

/// Sequence-numbered FIFO of unacknowledged messages
#[derive(Debug, Default)]
pub(crate) struct PendingList {
    entries: VecDeque<PendingEntry>,
    /// Last assigned sequence number (0 before the first message)
    next_seq: u32,
    /// Last sequence number covered by an ACK
    last_acked: u32,
}

impl PendingList {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Test entry point for exercising the wrap-around
    #[cfg(test)]
    pub(crate) fn with_counters(next_seq: u32, last_acked: u32) -> Self {
        Self {
            entries: VecDeque::new(),
            next_seq,
            last_acked,
        }
    }

    /// Assign the next sequence number and append the message
    pub(crate) fn push(&mut self, message: Message) -> u32 {
        self.next_seq = (self.next_seq + 1) & SEQ_MASK;
        let seq = self.next_seq;
        self.entries.push_back(PendingEntry {
            seq,
            message,
            sent_at: Instant::now(),
        });
        seq
    }

    /// Apply a cumulative ACK: pop from the head until `last_acked` catches
    /// up with the acknowledged sequence number
    ///
    /// Popping stops early if the list runs dry (a duplicate or bogus ACK),
    /// leaving `last_acked` where the real progress ended. Returns the number
    /// of messages released.
    pub(crate) fn ack(&mut self, acked_seq: u32) -> usize {
        let mut released = 0;
        while self.last_acked != acked_seq {
            let Some(entry) = self.entries.pop_front() else {
                break;
            };
            self.last_acked = (self.last_acked + 1) & SEQ_MASK;
            debug_assert_eq!(entry.seq, self.last_acked, "pending list out of order");
            released += 1;
        }
        released
    }

    /// Send time of the oldest unacknowledged message
    pub(crate) fn oldest_sent_at(&self) -> Option<Instant> {
        self.entries.front().map(|e| e.sent_at)
    }

    /// Take every unacknowledged message, oldest first
    pub(crate) fn drain(&mut self) -> Vec<Message> {
        self.entries.drain(..).map(|e| e.message).collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(next_seq − last_acked) mod 2³¹`, which must equal `len()`
    #[cfg(test)]
    pub(crate) fn in_flight(&self) -> u32 {
        self.next_seq.wrapping_sub(self.last_acked) & SEQ_MASK
    }

    #[cfg(test)]
    pub(crate) fn last_assigned(&self) -> u32 {
        self.next_seq
    }

    #[cfg(test)]
    pub(crate) fn last_acked(&self) -> u32 {
        self.last_acked
    }

    #[cfg(test)]
    pub(crate) fn entries(&self) -> &VecDeque<PendingEntry> {
        &self.entries
    }
}
