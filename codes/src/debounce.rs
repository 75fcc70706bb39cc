//! Last-write-wins handling for keystroke-driven verification.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::{Verifier, VerifyOutcome};

/// Identifies one submission in a [`LatestOnly`] sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

/// Keeps only the result of the most recently issued ticket.
///
/// Responses for superseded tickets are discarded, so a slow answer to an
/// older keystroke can never overwrite a newer one.
pub struct LatestOnly<T> {
    latest: AtomicU64,
    result: Mutex<Option<T>>,
}

impl<T: Clone> LatestOnly<T> {
    pub fn new() -> Self {
        Self {
            latest: AtomicU64::new(0),
            result: Mutex::new(None),
        }
    }

    /// Start a new submission, superseding all earlier tickets.
    pub fn issue(&self) -> Ticket {
        Ticket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }

    /// Store `value` if `ticket` is still the latest. Returns whether it was.
    pub fn resolve(&self, ticket: Ticket, value: Option<T>) -> bool {
        let mut result = self.result.lock().unwrap_or_else(|p| p.into_inner());
        if !self.is_current(ticket) {
            return false;
        }
        *result = value;
        true
    }

    /// The latest accepted result.
    pub fn current(&self) -> Option<T> {
        self.result
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }
}

impl<T: Clone> Default for LatestOnly<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Debounced verifier for input fields that check as the user types.
///
/// A submission fires only when its length equals the trigger length and no
/// newer submission arrives during the quiet period.
pub struct VerifyDebouncer {
    verifier: Arc<Verifier>,
    latest: LatestOnly<VerifyOutcome>,
    delay: Duration,
    trigger_len: usize,
}

impl VerifyDebouncer {
    pub fn new(verifier: Arc<Verifier>, delay: Duration, trigger_len: usize) -> Self {
        Self {
            verifier,
            latest: LatestOnly::new(),
            delay,
            trigger_len,
        }
    }

    /// Submit the current input value.
    ///
    /// Returns the outcome when this submission was verified and is still
    /// the latest, `None` when it was skipped or superseded.
    pub async fn submit(&self, input: &str) -> Option<VerifyOutcome> {
        let ticket = self.latest.issue();
        if input.chars().count() != self.trigger_len {
            self.latest.resolve(ticket, None);
            return None;
        }

        tokio::time::sleep(self.delay).await;
        if !self.latest.is_current(ticket) {
            return None;
        }

        let outcome = self.verifier.verify(input);
        if self.latest.resolve(ticket, Some(outcome.clone())) {
            Some(outcome)
        } else {
            None
        }
    }

    /// The outcome shown for the latest submission.
    pub fn current(&self) -> Option<VerifyOutcome> {
        self.latest.current()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use venue_nullables::{NullClock, NullVenueCodeStore};
    use venue_types::{Timestamp, VenueCode, VenueCodeId, DEFAULT_CREATED_BY};

    fn debouncer(delay_ms: u64) -> VerifyDebouncer {
        let store = Arc::new(NullVenueCodeStore::new());
        store.insert_raw(VenueCode {
            id: VenueCodeId::generate(),
            code: "12345".into(),
            venue_name: Some("Tokyo Stadium".into()),
            created_by: DEFAULT_CREATED_BY.into(),
            created_at: Timestamp::EPOCH,
            expires_at: Timestamp::from_secs(86_400),
        });
        let verifier = Arc::new(Verifier::new(store, Arc::new(NullClock::new(1_000)), 10));
        VerifyDebouncer::new(verifier, Duration::from_millis(delay_ms), 5)
    }

    #[test]
    fn stale_ticket_cannot_resolve() {
        let latest: LatestOnly<u32> = LatestOnly::new();
        let old = latest.issue();
        let new = latest.issue();
        assert!(!latest.resolve(old, Some(1)));
        assert!(latest.resolve(new, Some(2)));
        assert_eq!(latest.current(), Some(2));
    }

    #[tokio::test]
    async fn short_input_does_not_verify() {
        let d = debouncer(1);
        assert_eq!(d.submit("123").await, None);
        assert_eq!(d.current(), None);
    }

    #[tokio::test]
    async fn full_length_input_verifies() {
        let d = debouncer(1);
        let outcome = d.submit("12345").await.unwrap();
        assert!(outcome.matched);
        assert_eq!(d.current(), Some(outcome));
    }

    #[tokio::test]
    async fn newer_submission_wins() {
        let d = debouncer(30);
        let (first, second) = tokio::join!(d.submit("54321"), async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            d.submit("12345").await
        });

        assert_eq!(first, None);
        assert!(second.unwrap().matched);
        assert!(d.current().unwrap().matched);
    }

    #[tokio::test]
    async fn editing_away_clears_the_result() {
        let d = debouncer(1);
        d.submit("12345").await;
        assert!(d.current().is_some());
        d.submit("1234").await;
        assert_eq!(d.current(), None);
    }
}
