//! LMDB environment setup.

use std::path::Path;
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};

use crate::venue_code::LmdbVenueCodeStore;
use crate::LmdbError;

/// Number of named databases the environment needs.
pub const MAX_DBS: u32 = 4;

const CODES_DB: &str = "venue_codes";
const CREATED_INDEX_DB: &str = "venue_codes_by_created";
const EXPIRY_INDEX_DB: &str = "venue_codes_by_expiry";

/// Wraps the LMDB environment and all database handles.
pub struct LmdbEnvironment {
    env: Arc<Env>,
    codes_db: Database<Bytes, Bytes>,
    created_db: Database<Bytes, Bytes>,
    expiry_db: Database<Bytes, Bytes>,
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment at the given path.
    ///
    /// The directory is created if missing. `map_size` is in bytes.
    pub fn open(path: &Path, max_dbs: u32, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path).map_err(|e| LmdbError::Io(e.to_string()))?;

        // SAFETY: the environment is opened once per path by this process and
        // the memory map is never accessed outside of heed transactions.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(max_dbs.max(MAX_DBS))
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let codes_db = env.create_database(&mut wtxn, Some(CODES_DB))?;
        let created_db = env.create_database(&mut wtxn, Some(CREATED_INDEX_DB))?;
        let expiry_db = env.create_database(&mut wtxn, Some(EXPIRY_INDEX_DB))?;
        wtxn.commit()?;

        tracing::debug!(path = %path.display(), map_size, "opened LMDB environment");

        Ok(Self {
            env: Arc::new(env),
            codes_db,
            created_db,
            expiry_db,
        })
    }

    /// A venue-code store sharing this environment.
    pub fn venue_code_store(&self) -> LmdbVenueCodeStore {
        LmdbVenueCodeStore {
            env: Arc::clone(&self.env),
            codes_db: self.codes_db,
            created_db: self.created_db,
            expiry_db: self.expiry_db,
        }
    }
}
