//! Venue-code storage trait.

use crate::StoreError;
use venue_types::{Timestamp, VenueCode, VenueCodeId};

/// Trait for persisting venue codes under the single-active-code policy.
///
/// A code is *active* at `now` while `now < expires_at`. Implementations must
/// make [`upsert_active`](Self::upsert_active) atomic: two concurrent calls
/// may never leave two active records behind.
pub trait VenueCodeStore: Send + Sync {
    /// Create or replace the active code.
    ///
    /// Activity is evaluated at `record.created_at`. If an active record
    /// exists, the newest one keeps its `id` and takes every other field from
    /// `record`; any further active records are deleted in the same write.
    /// Otherwise `record` is inserted as-is. Returns the stored record.
    fn upsert_active(&self, record: &VenueCode) -> Result<VenueCode, StoreError>;

    /// Fetch a record by id, expired or not.
    fn get(&self, id: &VenueCodeId) -> Result<Option<VenueCode>, StoreError>;

    /// All records active at `now`, newest `created_at` first.
    fn list_active(&self, now: Timestamp) -> Result<Vec<VenueCode>, StoreError>;

    /// Up to `limit` records regardless of expiry, newest `created_at` first.
    fn recent(&self, limit: usize) -> Result<Vec<VenueCode>, StoreError>;

    /// Ids of every record with `expires_at <= now`, oldest expiry first.
    fn expired_ids(&self, now: Timestamp) -> Result<Vec<VenueCodeId>, StoreError>;

    /// Delete one record. Returns whether it existed.
    fn delete_by_id(&self, id: &VenueCodeId) -> Result<bool, StoreError>;

    /// Delete a batch of expired records in one commit.
    ///
    /// Expiry is re-checked against `now` inside the write: a record that was
    /// regenerated after its id was listed is no longer expired and is kept.
    /// Ids that are already gone are skipped. Returns how many records were
    /// actually removed.
    fn delete_batch(&self, ids: &[VenueCodeId], now: Timestamp) -> Result<usize, StoreError>;

    /// Total number of stored records, expired ones included.
    fn code_count(&self) -> Result<u64, StoreError>;
}
