//! Latest-request-wins ordering for overlapping fetches

use std::sync::atomic::{AtomicU64, Ordering};

/// Ticket of one issued request
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

/// Hands out increasing tickets; only the newest one is current
///
/// A listing issues a ticket before each fetch and applies the result only
/// if the ticket is still current when the fetch returns.
#[derive(Debug, Default)]
pub struct RequestSequence {
    latest: AtomicU64,
}

impl RequestSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&self) -> Ticket {
        Ticket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }

    /// `Some(value)` when `ticket` is still current
    pub fn accept<T>(&self, ticket: Ticket, value: T) -> Option<T> {
        self.is_current(ticket).then_some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_only_latest_is_current() {
        let seq = RequestSequence::new();
        let first = seq.issue();
        assert!(seq.is_current(first));
        let second = seq.issue();
        assert!(second > first);
        assert!(!seq.is_current(first));
        assert!(seq.is_current(second));
        assert_eq!(seq.accept(first, 1), None);
        assert_eq!(seq.accept(second, 2), Some(2));
    }

    #[tokio::test]
    async fn test_slow_stale_response_is_dropped() {
        let seq = Arc::new(RequestSequence::new());

        let slow = {
            let seq = seq.clone();
            let ticket = seq.issue();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                seq.accept(ticket, "stale")
            })
        };
        let fast = {
            let seq = seq.clone();
            let ticket = seq.issue();
            tokio::spawn(async move { seq.accept(ticket, "fresh") })
        };

        assert_eq!(fast.await.unwrap(), Some("fresh"));
        assert_eq!(slow.await.unwrap(), None);
    }
}
