//! Candidate-code generation.

use std::sync::Arc;
use std::time::Duration;

use venue_types::{CandidateCode, CodeSource, Timestamp};

/// Produces candidate codes with server-assigned timestamps.
///
/// The only side effect is a draw from the code source when no explicit code
/// was supplied.
pub struct CodeGenerator {
    source: Arc<dyn CodeSource>,
    ttl: Duration,
}

impl CodeGenerator {
    pub fn new(source: Arc<dyn CodeSource>, ttl: Duration) -> Self {
        Self { source, ttl }
    }

    /// Build a candidate valid from `now` until `now + ttl`.
    ///
    /// A non-blank `explicit` code is used as given (trimmed); otherwise a
    /// random five-digit code is drawn. A blank venue name becomes `None`.
    pub fn generate(
        &self,
        explicit: Option<&str>,
        venue_name: Option<&str>,
        now: Timestamp,
    ) -> CandidateCode {
        let code = match non_blank(explicit) {
            Some(code) => code,
            None => format!("{:05}", self.source.draw()),
        };
        CandidateCode {
            code,
            venue_name: non_blank(venue_name),
            created_at: now,
            expires_at: now.plus(self.ttl),
        }
    }
}

/// Trimmed copy of `value`, or `None` when it is absent or blank.
pub(crate) fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
