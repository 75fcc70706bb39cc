//! LMDB implementation of VenueCodeStore.
//!
//! Primary database: `id (16 bytes) -> bincode(VenueCode)`.
//! Index databases: `timestamp_be (8 bytes) ++ id (16 bytes) -> id`, one for
//! `created_at` and one for `expires_at`. Big-endian timestamps make LMDB's
//! lexicographic key order equal to chronological order, so "newest first"
//! is a reverse scan and "expired at now" is a bounded forward range.
//!
//! LMDB admits a single write transaction at a time, which is what makes
//! [`VenueCodeStore::upsert_active`] atomic: the read of the active set and
//! the replacement happen inside the same write transaction.

use std::ops::Bound;
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, RoTxn, RwTxn};

use venue_store::{StoreError, VenueCodeStore};
use venue_types::{Timestamp, VenueCode, VenueCodeId};

use crate::LmdbError;

const INDEX_KEY_LEN: usize = 24;

pub struct LmdbVenueCodeStore {
    pub(crate) env: Arc<Env>,
    pub(crate) codes_db: Database<Bytes, Bytes>,
    pub(crate) created_db: Database<Bytes, Bytes>,
    pub(crate) expiry_db: Database<Bytes, Bytes>,
}

/// Build the index key `timestamp_be ++ id_bytes`.
fn index_key(ts: Timestamp, id: &VenueCodeId) -> [u8; INDEX_KEY_LEN] {
    let mut key = [0u8; INDEX_KEY_LEN];
    key[..8].copy_from_slice(&ts.to_be_bytes());
    key[8..].copy_from_slice(id.as_bytes());
    key
}

fn id_from_index_value(bytes: &[u8]) -> Result<VenueCodeId, LmdbError> {
    let arr: [u8; 16] = bytes
        .try_into()
        .map_err(|_| LmdbError::Corruption("index value is not a 16-byte id".to_string()))?;
    Ok(VenueCodeId::from_bytes(arr))
}

impl LmdbVenueCodeStore {
    fn load(&self, txn: &RoTxn, id: &VenueCodeId) -> Result<Option<VenueCode>, LmdbError> {
        match self.codes_db.get(txn, id.as_bytes())? {
            Some(bytes) => Ok(Some(bincode::deserialize(bytes)?)),
            None => Ok(None),
        }
    }

    /// Reverse scan of the creation index, keeping records accepted by
    /// `keep` until `limit` of them have been collected.
    fn newest_first<F>(
        &self,
        txn: &RoTxn,
        limit: usize,
        keep: F,
    ) -> Result<Vec<VenueCode>, LmdbError>
    where
        F: Fn(&VenueCode) -> bool,
    {
        let mut out = Vec::new();
        if limit == 0 {
            return Ok(out);
        }
        for entry in self.created_db.rev_iter(txn)? {
            let (_key, val) = entry?;
            let id = id_from_index_value(val)?;
            let record = self.load(txn, &id)?.ok_or_else(|| {
                LmdbError::Corruption(format!("creation index points at missing code {id}"))
            })?;
            if keep(&record) {
                out.push(record);
                if out.len() >= limit {
                    break;
                }
            }
        }
        Ok(out)
    }

    fn put_record(&self, wtxn: &mut RwTxn, record: &VenueCode) -> Result<(), LmdbError> {
        let bytes = bincode::serialize(record)?;
        self.codes_db.put(wtxn, record.id.as_bytes(), &bytes)?;
        self.created_db.put(
            wtxn,
            &index_key(record.created_at, &record.id),
            record.id.as_bytes(),
        )?;
        self.expiry_db.put(
            wtxn,
            &index_key(record.expires_at, &record.id),
            record.id.as_bytes(),
        )?;
        Ok(())
    }

    fn remove_record(&self, wtxn: &mut RwTxn, record: &VenueCode) -> Result<(), LmdbError> {
        self.codes_db.delete(wtxn, record.id.as_bytes())?;
        self.created_db
            .delete(wtxn, &index_key(record.created_at, &record.id))?;
        self.expiry_db
            .delete(wtxn, &index_key(record.expires_at, &record.id))?;
        Ok(())
    }
}

impl VenueCodeStore for LmdbVenueCodeStore {
    fn upsert_active(&self, record: &VenueCode) -> Result<VenueCode, StoreError> {
        let now = record.created_at;
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let active = self.newest_first(&wtxn, usize::MAX, |c| c.is_active_at(now))?;

        let stored = match active.split_first() {
            Some((current, duplicates)) => {
                for dup in duplicates {
                    tracing::warn!(code_id = %dup.id, "removing duplicate active venue code");
                    self.remove_record(&mut wtxn, dup)?;
                }
                self.remove_record(&mut wtxn, current)?;
                let replaced = VenueCode {
                    id: current.id,
                    ..record.clone()
                };
                self.put_record(&mut wtxn, &replaced)?;
                replaced
            }
            None => {
                self.put_record(&mut wtxn, record)?;
                record.clone()
            }
        };

        wtxn.commit().map_err(LmdbError::from)?;
        Ok(stored)
    }

    fn get(&self, id: &VenueCodeId) -> Result<Option<VenueCode>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        Ok(self.load(&rtxn, id)?)
    }

    fn list_active(&self, now: Timestamp) -> Result<Vec<VenueCode>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        Ok(self.newest_first(&rtxn, usize::MAX, |c| c.is_active_at(now))?)
    }

    fn recent(&self, limit: usize) -> Result<Vec<VenueCode>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        Ok(self.newest_first(&rtxn, limit, |_| true)?)
    }

    fn expired_ids(&self, now: Timestamp) -> Result<Vec<VenueCodeId>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        // Every key whose timestamp prefix is <= now sorts below `now + 1`.
        let upper = now.as_millis().checked_add(1).map(u64::to_be_bytes);
        let bounds: (Bound<&[u8]>, Bound<&[u8]>) = match &upper {
            Some(upper) => (Bound::Unbounded, Bound::Excluded(upper.as_slice())),
            None => (Bound::Unbounded, Bound::Unbounded),
        };
        let iter = self
            .expiry_db
            .range(&rtxn, &bounds)
            .map_err(LmdbError::from)?;
        let mut ids = Vec::new();
        for entry in iter {
            let (_key, val) = entry.map_err(LmdbError::from)?;
            ids.push(id_from_index_value(val)?);
        }
        Ok(ids)
    }

    fn delete_by_id(&self, id: &VenueCodeId) -> Result<bool, StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let existing = self.load(&wtxn, id)?;
        if let Some(record) = &existing {
            self.remove_record(&mut wtxn, record)?;
        }
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(existing.is_some())
    }

    fn delete_batch(&self, ids: &[VenueCodeId], now: Timestamp) -> Result<usize, StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let mut removed = 0;
        for id in ids {
            match self.load(&wtxn, id)? {
                Some(record) if record.is_expired_at(now) => {
                    self.remove_record(&mut wtxn, &record)?;
                    removed += 1;
                }
                Some(record) => {
                    tracing::debug!(code_id = %record.id, "skipping venue code regenerated since listing");
                }
                None => {}
            }
        }
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(removed)
    }

    fn code_count(&self) -> Result<u64, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let count = self.codes_db.len(&rtxn).map_err(LmdbError::from)?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LmdbEnvironment;
    use venue_types::DEFAULT_CREATED_BY;

    const DAY_MS: u64 = 24 * 60 * 60 * 1000;

    fn open_test_env() -> (tempfile::TempDir, LmdbEnvironment) {
        let dir = tempfile::tempdir().unwrap();
        let env = LmdbEnvironment::open(dir.path(), 4, 1 << 20).unwrap();
        (dir, env)
    }

    fn code_at(code: &str, venue: Option<&str>, created_ms: u64) -> VenueCode {
        VenueCode {
            id: VenueCodeId::generate(),
            code: code.to_string(),
            venue_name: venue.map(str::to_string),
            created_by: DEFAULT_CREATED_BY.to_string(),
            created_at: Timestamp::from_millis(created_ms),
            expires_at: Timestamp::from_millis(created_ms + DAY_MS),
        }
    }

    #[test]
    fn upsert_into_empty_store_inserts() {
        let (_dir, env) = open_test_env();
        let store = env.venue_code_store();
        let record = code_at("12345", Some("Tokyo Stadium"), 1_000);

        let stored = store.upsert_active(&record).unwrap();
        assert_eq!(stored, record);
        assert_eq!(store.get(&record.id).unwrap(), Some(record));
        assert_eq!(store.code_count().unwrap(), 1);
    }

    #[test]
    fn upsert_replaces_active_code_in_place() {
        let (_dir, env) = open_test_env();
        let store = env.venue_code_store();
        let first = store.upsert_active(&code_at("11111", Some("A"), 1_000)).unwrap();
        let second = store.upsert_active(&code_at("22222", Some("B"), 2_000)).unwrap();

        assert_eq!(second.id, first.id);
        assert_eq!(second.code, "22222");
        assert_eq!(second.venue_name.as_deref(), Some("B"));
        assert_eq!(second.created_at, Timestamp::from_millis(2_000));

        let active = store.list_active(Timestamp::from_millis(3_000)).unwrap();
        assert_eq!(active, vec![second]);
        assert_eq!(store.code_count().unwrap(), 1);
    }

    #[test]
    fn upsert_after_expiry_creates_new_record() {
        let (_dir, env) = open_test_env();
        let store = env.venue_code_store();
        let old = store.upsert_active(&code_at("11111", None, 0)).unwrap();
        let fresh = store
            .upsert_active(&code_at("22222", None, DAY_MS + 1))
            .unwrap();

        assert_ne!(fresh.id, old.id);
        assert_eq!(store.code_count().unwrap(), 2);
        let active = store.list_active(Timestamp::from_millis(DAY_MS + 2)).unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].code, "22222");
    }

    #[test]
    fn upsert_heals_duplicate_active_rows() {
        let (_dir, env) = open_test_env();
        let store = env.venue_code_store();
        let older = code_at("11111", None, 1_000);
        let newer = code_at("22222", None, 2_000);

        // Seed two active rows directly, bypassing the upsert policy.
        let mut wtxn = store.env.write_txn().unwrap();
        store.put_record(&mut wtxn, &older).unwrap();
        store.put_record(&mut wtxn, &newer).unwrap();
        wtxn.commit().unwrap();

        let stored = store.upsert_active(&code_at("33333", None, 3_000)).unwrap();
        assert_eq!(stored.id, newer.id);
        assert_eq!(store.get(&older.id).unwrap(), None);
        assert_eq!(store.code_count().unwrap(), 1);
    }

    #[test]
    fn recent_is_newest_first_and_limited() {
        let (_dir, env) = open_test_env();
        let store = env.venue_code_store();
        let a = code_at("11111", None, 0);
        let b = code_at("22222", None, DAY_MS);
        let c = code_at("33333", None, 2 * DAY_MS);
        for record in [&a, &b, &c] {
            store.upsert_active(record).unwrap();
        }

        let recent = store.recent(2).unwrap();
        let codes: Vec<_> = recent.iter().map(|r| r.code.as_str()).collect();
        assert_eq!(codes, vec!["33333", "22222"]);
        assert!(store.recent(0).unwrap().is_empty());
    }

    #[test]
    fn expired_ids_include_the_boundary() {
        let (_dir, env) = open_test_env();
        let store = env.venue_code_store();
        let a = store.upsert_active(&code_at("11111", None, 0)).unwrap();

        assert!(store
            .expired_ids(Timestamp::from_millis(DAY_MS - 1))
            .unwrap()
            .is_empty());
        assert_eq!(
            store.expired_ids(Timestamp::from_millis(DAY_MS)).unwrap(),
            vec![a.id]
        );
    }

    #[test]
    fn delete_batch_skips_missing_ids() {
        let (_dir, env) = open_test_env();
        let store = env.venue_code_store();
        let a = store.upsert_active(&code_at("11111", None, 0)).unwrap();
        let b = store.upsert_active(&code_at("22222", None, DAY_MS)).unwrap();

        let later = Timestamp::from_millis(3 * DAY_MS);

        assert_eq!(store.delete_batch(&[a.id, b.id], later).unwrap(), 2);
        assert_eq!(store.delete_batch(&[a.id, b.id], later).unwrap(), 0);
        assert_eq!(store.code_count().unwrap(), 0);
        assert!(store.expired_ids(Timestamp::from_millis(u64::MAX)).unwrap().is_empty());
    }

    #[test]
    fn delete_batch_keeps_code_regenerated_after_listing() {
        let (_dir, env) = open_test_env();
        let store = env.venue_code_store();
        let original = store.upsert_active(&code_at("11111", None, 0)).unwrap();

        // The sweep lists the code as expired at its deadline...
        let now = Timestamp::from_millis(DAY_MS);
        let expired = store.expired_ids(now).unwrap();
        assert_eq!(expired, vec![original.id]);

        // ...an admin regenerates it in place before the batch commits...
        let regenerated = store
            .upsert_active(&code_at("22222", Some("Osaka Dome"), DAY_MS - 1))
            .unwrap();
        assert_eq!(regenerated.id, original.id);

        // ...and the batch leaves the fresh code alone.
        assert_eq!(store.delete_batch(&expired, now).unwrap(), 0);
        let active = store.list_active(now).unwrap();
        assert_eq!(active, vec![regenerated]);
    }

    #[test]
    fn delete_by_id_reports_existence() {
        let (_dir, env) = open_test_env();
        let store = env.venue_code_store();
        let a = store.upsert_active(&code_at("11111", None, 0)).unwrap();

        assert!(store.delete_by_id(&a.id).unwrap());
        assert!(!store.delete_by_id(&a.id).unwrap());
        assert!(store.recent(10).unwrap().is_empty());
    }

    #[test]
    fn records_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let record = code_at("12345", Some("Tokyo Stadium"), 1_000);
        {
            let env = LmdbEnvironment::open(dir.path(), 4, 1 << 20).unwrap();
            env.venue_code_store().upsert_active(&record).unwrap();
        }
        let env = LmdbEnvironment::open(dir.path(), 4, 1 << 20).unwrap();
        assert_eq!(env.venue_code_store().get(&record.id).unwrap(), Some(record));
    }
}
