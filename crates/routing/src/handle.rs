//! Analyzer handle for routing-side delivery
//!
//! `AnalyzerHandle` wraps an analyzer session's 256 bounded priority queues,
//! letting the router enqueue messages without knowing anything about the
//! session behind them. The session keeps the receive halves; the handle is
//! cloned into the routing tree.

use std::sync::Arc;

use ferry_protocol::Message;
use tokio::sync::mpsc;

use crate::AnalyzerId;

/// Number of distinct priorities (the severity byte's full range)
pub const PRIORITY_LEVELS: usize = 256;

/// Send side of an analyzer's priority queues
///
/// # Design
///
/// - One bounded `mpsc` channel per priority; producers (router threads) use
///   `try_send`, so a full queue is an immediate failure signal, never a wait.
/// - Cloning shares the underlying senders, so every tree rebuild reuses the
///   same queues.
#[derive(Clone)]
pub struct AnalyzerHandle {
    /// Identity of the owning session
    id: AnalyzerId,

    /// Senders indexed by priority, 0 = highest
    queues: Arc<[mpsc::Sender<Message>]>,
}

impl AnalyzerHandle {
    /// Create the priority queues for a new session
    ///
    /// Returns the handle (for registration with the router) and the receive
    /// halves (for the session writer), indexed by priority.
    pub fn channel(
        id: AnalyzerId,
        capacity: usize,
    ) -> (Self, Vec<mpsc::Receiver<Message>>) {
        let mut senders = Vec::with_capacity(PRIORITY_LEVELS);
        let mut receivers = Vec::with_capacity(PRIORITY_LEVELS);
        for _ in 0..PRIORITY_LEVELS {
            let (tx, rx) = mpsc::channel(capacity);
            senders.push(tx);
            receivers.push(rx);
        }

        let handle = Self {
            id,
            queues: senders.into(),
        };
        (handle, receivers)
    }

    /// The owning session's identity
    #[inline]
    pub fn id(&self) -> &AnalyzerId {
        &self.id
    }

    /// Try to enqueue a message on the queue matching its priority
    ///
    /// Non-blocking. On failure the message is handed back so the caller can
    /// retry the routing attempt; a closed queue (session torn down) fails
    /// the same way as a full one.
    #[inline]
    pub fn try_enqueue(&self, msg: Message) -> Result<(), Message> {
        let priority = msg.priority() as usize;
        self.queues[priority].try_send(msg).map_err(|e| match e {
            mpsc::error::TrySendError::Full(m) => m,
            mpsc::error::TrySendError::Closed(m) => m,
        })
    }
}

impl std::fmt::Debug for AnalyzerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalyzerHandle")
            .field("id", &self.id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enqueue_lands_on_priority_queue() {
        let (handle, mut receivers) = AnalyzerHandle::channel(AnalyzerId::new("a"), 4);

        handle.try_enqueue(Message::build(3, b"x")).unwrap();

        assert!(receivers[0].try_recv().is_err());
        let msg = receivers[3].try_recv().unwrap();
        assert_eq!(msg.priority(), 3);
    }

    #[test]
    fn test_full_queue_returns_message() {
        let (handle, _receivers) = AnalyzerHandle::channel(AnalyzerId::new("a"), 1);

        handle.try_enqueue(Message::build(0, b"first")).unwrap();
        let rejected = handle.try_enqueue(Message::build(0, b"second")).unwrap_err();
        assert_eq!(rejected.payload(), b"second");

        // Other priorities are unaffected
        handle.try_enqueue(Message::build(1, b"other")).unwrap();
    }

    #[test]
    fn test_closed_queue_returns_message() {
        let (handle, receivers) = AnalyzerHandle::channel(AnalyzerId::new("a"), 1);
        drop(receivers);

        assert!(handle.try_enqueue(Message::build(5, b"gone")).is_err());
    }
}
