//! Batched deletion of expired venue codes.

use std::sync::Arc;

use venue_store::VenueCodeStore;
use venue_types::{Clock, Timestamp};

use crate::CodeError;

/// Outcome of one sweep run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Expired records found by the query.
    pub expired_found: usize,
    /// Records actually removed.
    pub deleted: usize,
    /// Batches attempted.
    pub batches: usize,
    /// Batches whose commit failed; their records stay for the next run.
    pub failed_batches: usize,
}

/// Deletes every record with `expires_at <= now`, independent of any request.
///
/// The scheduling (interval task, CLI, REST trigger) lives with the caller;
/// [`ExpirySweeper::sweep`] runs exactly one pass synchronously.
pub struct ExpirySweeper {
    store: Arc<dyn VenueCodeStore>,
    clock: Arc<dyn Clock>,
    batch_size: usize,
}

impl ExpirySweeper {
    pub fn new(store: Arc<dyn VenueCodeStore>, clock: Arc<dyn Clock>, batch_size: usize) -> Self {
        Self {
            store,
            clock,
            batch_size: batch_size.max(1),
        }
    }

    /// Run one sweep at the clock's current time.
    ///
    /// Fails only when the expired set cannot be queried. Batch failures are
    /// logged and counted, and the remaining batches still run.
    pub fn sweep(&self) -> Result<SweepReport, CodeError> {
        let report = sweep_expired(self.store.as_ref(), self.clock.now(), self.batch_size)?;
        if report.deleted > 0 || report.failed_batches > 0 {
            tracing::info!(
                deleted = report.deleted,
                batches = report.batches,
                failed_batches = report.failed_batches,
                "deleted expired venue codes"
            );
        } else {
            tracing::debug!("no expired venue codes found");
        }
        Ok(report)
    }
}

pub(crate) fn sweep_expired(
    store: &dyn VenueCodeStore,
    now: Timestamp,
    batch_size: usize,
) -> Result<SweepReport, CodeError> {
    let expired = store.expired_ids(now)?;
    let mut report = SweepReport {
        expired_found: expired.len(),
        ..SweepReport::default()
    };

    for chunk in expired.chunks(batch_size.max(1)) {
        report.batches += 1;
        match store.delete_batch(chunk, now) {
            Ok(removed) => report.deleted += removed,
            Err(e) => {
                report.failed_batches += 1;
                tracing::warn!(error = %e, size = chunk.len(), "expired venue code batch failed");
            }
        }
    }
    Ok(report)
}
