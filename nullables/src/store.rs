//! Nullable store: thread-safe in-memory venue-code storage for testing.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::Mutex;

use venue_store::{StoreError, VenueCodeStore};
use venue_types::{Timestamp, VenueCode, VenueCodeId};

/// An in-memory venue-code store for testing.
///
/// Thread-safe for use with tokio's multi-threaded runtime. Faults can be
/// injected to exercise the error paths of callers: failing reads, failing
/// writes, upsert conflicts and individual failing delete batches.
pub struct NullVenueCodeStore {
    codes: Mutex<HashMap<VenueCodeId, VenueCode>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    pending_conflicts: AtomicU32,
    batch_calls: AtomicUsize,
    failing_batches: Mutex<HashSet<usize>>,
}

impl NullVenueCodeStore {
    pub fn new() -> Self {
        Self {
            codes: Mutex::new(HashMap::new()),
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
            pending_conflicts: AtomicU32::new(0),
            batch_calls: AtomicUsize::new(0),
            failing_batches: Mutex::new(HashSet::new()),
        }
    }

    /// Insert a record directly, bypassing the single-active policy.
    pub fn insert_raw(&self, record: VenueCode) {
        self.codes.lock().unwrap().insert(record.id, record);
    }

    /// Make every read fail with [`StoreError::Unavailable`].
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every write fail with [`StoreError::Unavailable`].
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make the next `n` upserts fail with [`StoreError::Conflict`].
    pub fn inject_conflicts(&self, n: u32) {
        self.pending_conflicts.store(n, Ordering::SeqCst);
    }

    /// Make the `call`-th invocation (0-based) of `delete_batch` fail.
    pub fn fail_delete_batch_call(&self, call: usize) {
        self.failing_batches.lock().unwrap().insert(call);
    }

    /// Number of `delete_batch` invocations so far.
    pub fn delete_batch_calls(&self) -> usize {
        self.batch_calls.load(Ordering::SeqCst)
    }

    fn check_read(&self) -> Result<(), StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("null store: reads disabled".into()));
        }
        Ok(())
    }

    fn check_write(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("null store: writes disabled".into()));
        }
        Ok(())
    }

    fn sorted_newest_first(codes: &HashMap<VenueCodeId, VenueCode>) -> Vec<VenueCode> {
        let mut all: Vec<VenueCode> = codes.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        all
    }
}

impl Default for NullVenueCodeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl VenueCodeStore for NullVenueCodeStore {
    fn upsert_active(&self, record: &VenueCode) -> Result<VenueCode, StoreError> {
        self.check_write()?;
        let conflict = self
            .pending_conflicts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if conflict {
            return Err(StoreError::Conflict("null store: injected conflict".into()));
        }

        let now = record.created_at;
        let mut codes = self.codes.lock().unwrap();
        let active: Vec<VenueCode> = Self::sorted_newest_first(&codes)
            .into_iter()
            .filter(|c| c.is_active_at(now))
            .collect();

        let stored = match active.split_first() {
            Some((current, duplicates)) => {
                for dup in duplicates {
                    codes.remove(&dup.id);
                }
                VenueCode {
                    id: current.id,
                    ..record.clone()
                }
            }
            None => record.clone(),
        };
        codes.insert(stored.id, stored.clone());
        Ok(stored)
    }

    fn get(&self, id: &VenueCodeId) -> Result<Option<VenueCode>, StoreError> {
        self.check_read()?;
        Ok(self.codes.lock().unwrap().get(id).cloned())
    }

    fn list_active(&self, now: Timestamp) -> Result<Vec<VenueCode>, StoreError> {
        self.check_read()?;
        let codes = self.codes.lock().unwrap();
        Ok(Self::sorted_newest_first(&codes)
            .into_iter()
            .filter(|c| c.is_active_at(now))
            .collect())
    }

    fn recent(&self, limit: usize) -> Result<Vec<VenueCode>, StoreError> {
        self.check_read()?;
        let codes = self.codes.lock().unwrap();
        Ok(Self::sorted_newest_first(&codes)
            .into_iter()
            .take(limit)
            .collect())
    }

    fn expired_ids(&self, now: Timestamp) -> Result<Vec<VenueCodeId>, StoreError> {
        self.check_read()?;
        let codes = self.codes.lock().unwrap();
        let mut expired: Vec<&VenueCode> =
            codes.values().filter(|c| c.is_expired_at(now)).collect();
        expired.sort_by(|a, b| a.expires_at.cmp(&b.expires_at).then(a.id.cmp(&b.id)));
        Ok(expired.into_iter().map(|c| c.id).collect())
    }

    fn delete_by_id(&self, id: &VenueCodeId) -> Result<bool, StoreError> {
        self.check_write()?;
        Ok(self.codes.lock().unwrap().remove(id).is_some())
    }

    fn delete_batch(&self, ids: &[VenueCodeId], now: Timestamp) -> Result<usize, StoreError> {
        let call = self.batch_calls.fetch_add(1, Ordering::SeqCst);
        self.check_write()?;
        if self.failing_batches.lock().unwrap().contains(&call) {
            return Err(StoreError::Unavailable(format!(
                "null store: delete batch {call} failed"
            )));
        }
        let mut codes = self.codes.lock().unwrap();
        let mut removed = 0;
        for id in ids {
            if codes.get(id).is_some_and(|c| c.is_expired_at(now)) {
                codes.remove(id);
                removed += 1;
            }
        }
        Ok(removed)
    }

    fn code_count(&self) -> Result<u64, StoreError> {
        self.check_read()?;
        Ok(self.codes.lock().unwrap().len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use venue_types::DEFAULT_CREATED_BY;

    fn code_at(code: &str, created_ms: u64, expires_ms: u64) -> VenueCode {
        VenueCode {
            id: VenueCodeId::generate(),
            code: code.to_string(),
            venue_name: None,
            created_by: DEFAULT_CREATED_BY.to_string(),
            created_at: Timestamp::from_millis(created_ms),
            expires_at: Timestamp::from_millis(expires_ms),
        }
    }

    #[test]
    fn test_upsert_keeps_single_active() {
        let store = NullVenueCodeStore::new();
        let first = store.upsert_active(&code_at("11111", 0, 100)).unwrap();
        let second = store.upsert_active(&code_at("22222", 10, 110)).unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(store.code_count().unwrap(), 1);
        assert_eq!(store.list_active(Timestamp::from_millis(20)).unwrap()[0].code, "22222");
    }

    #[test]
    fn test_expired_ids_sorted_by_expiry() {
        let store = NullVenueCodeStore::new();
        let late = code_at("11111", 0, 50);
        let early = code_at("22222", 0, 40);
        store.insert_raw(late.clone());
        store.insert_raw(early.clone());
        assert_eq!(
            store.expired_ids(Timestamp::from_millis(50)).unwrap(),
            vec![early.id, late.id]
        );
    }

    #[test]
    fn test_injected_conflicts_are_consumed() {
        let store = NullVenueCodeStore::new();
        store.inject_conflicts(1);
        assert!(matches!(
            store.upsert_active(&code_at("11111", 0, 100)),
            Err(StoreError::Conflict(_))
        ));
        assert!(store.upsert_active(&code_at("11111", 0, 100)).is_ok());
    }

    #[test]
    fn test_failing_batch_is_isolated() {
        let store = NullVenueCodeStore::new();
        let a = code_at("11111", 0, 10);
        store.insert_raw(a.clone());
        store.fail_delete_batch_call(0);
        let now = Timestamp::from_millis(10);
        assert!(store.delete_batch(&[a.id], now).is_err());
        assert_eq!(store.delete_batch(&[a.id], now).unwrap(), 1);
        assert_eq!(store.delete_batch_calls(), 2);
    }

    #[test]
    fn test_delete_batch_skips_unexpired_records() {
        let store = NullVenueCodeStore::new();
        let a = code_at("11111", 0, 10);
        store.insert_raw(a.clone());
        let expired = store.expired_ids(Timestamp::from_millis(10)).unwrap();

        let fresh = store.upsert_active(&code_at("22222", 9, 109)).unwrap();
        assert_eq!(fresh.id, a.id);

        assert_eq!(store.delete_batch(&expired, Timestamp::from_millis(10)).unwrap(), 0);
        assert_eq!(store.get(&a.id).unwrap().unwrap().code, "22222");
    }

    #[test]
    fn test_read_faults() {
        let store = NullVenueCodeStore::new();
        store.set_fail_reads(true);
        assert!(matches!(store.recent(10), Err(StoreError::Unavailable(_))));
        store.set_fail_reads(false);
        assert!(store.recent(10).unwrap().is_empty());
    }
}
