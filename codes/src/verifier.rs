//! Matching a submitted code against the current venue code.

use std::sync::Arc;

use venue_store::VenueCodeStore;
use venue_types::Clock;

/// Why a verification did not match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MismatchReason {
    /// The submission was empty after trimming.
    NoCode,
    /// No stored code is currently active.
    NoActiveCode,
    /// The submission differs from the active code.
    Mismatch,
    /// The store could not be read.
    Internal,
}

impl MismatchReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            MismatchReason::NoCode => "no-code",
            MismatchReason::NoActiveCode => "no-active-code",
            MismatchReason::Mismatch => "mismatch",
            MismatchReason::Internal => "internal-error",
        }
    }
}

/// Result of a verification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerifyOutcome {
    pub matched: bool,
    /// Venue label of the matched code; always `None` without a match.
    pub venue_name: Option<String>,
    /// Set exactly when `matched` is false.
    pub reason: Option<MismatchReason>,
}

impl VerifyOutcome {
    pub fn matched(venue_name: Option<String>) -> Self {
        Self {
            matched: true,
            venue_name,
            reason: None,
        }
    }

    pub fn rejected(reason: MismatchReason) -> Self {
        Self {
            matched: false,
            venue_name: None,
            reason: Some(reason),
        }
    }
}

/// Read-only verifier, safe to call concurrently and on every keystroke.
pub struct Verifier {
    store: Arc<dyn VenueCodeStore>,
    clock: Arc<dyn Clock>,
    lookback: usize,
}

impl Verifier {
    pub fn new(store: Arc<dyn VenueCodeStore>, clock: Arc<dyn Clock>, lookback: usize) -> Self {
        Self {
            store,
            clock,
            lookback: lookback.max(1),
        }
    }

    /// Compare `submitted` with the newest unexpired code.
    ///
    /// Comparison is exact and case-sensitive on trimmed values. Expired rows
    /// among the newest `lookback` records are skipped, so a stale newer row
    /// never hides an older active one. Storage faults yield
    /// [`MismatchReason::Internal`].
    pub fn verify(&self, submitted: &str) -> VerifyOutcome {
        let submitted = submitted.trim();
        if submitted.is_empty() {
            return VerifyOutcome::rejected(MismatchReason::NoCode);
        }

        let recent = match self.store.recent(self.lookback) {
            Ok(recent) => recent,
            Err(e) => {
                tracing::warn!(error = %e, "venue code lookup failed, treating as non-match");
                return VerifyOutcome::rejected(MismatchReason::Internal);
            }
        };

        let now = self.clock.now();
        match recent.into_iter().find(|c| c.is_active_at(now)) {
            Some(current) if current.code.trim() == submitted => {
                VerifyOutcome::matched(current.venue_name)
            }
            Some(_) => VerifyOutcome::rejected(MismatchReason::Mismatch),
            None => VerifyOutcome::rejected(MismatchReason::NoActiveCode),
        }
    }
}
