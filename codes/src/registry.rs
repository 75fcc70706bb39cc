//! Admin operations on venue codes.

use std::sync::Arc;

use venue_store::{StoreError, VenueCodeStore};
use venue_types::{Clock, VenueCode, VenueCodeId, DEFAULT_CREATED_BY};

use crate::generator::non_blank;
use crate::sweeper::sweep_expired;
use crate::{CodeError, CodeFormat, CodeGenerator};

/// Input to [`CodeRegistry::create_or_regenerate`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IssueRequest {
    /// Explicit code; blank or absent draws a random five-digit code.
    pub code: Option<String>,
    pub venue_name: Option<String>,
    /// Issuing admin; defaults to [`DEFAULT_CREATED_BY`].
    pub created_by: Option<String>,
}

impl IssueRequest {
    pub fn random() -> Self {
        Self::default()
    }

    pub fn explicit(code: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            ..Self::default()
        }
    }

    pub fn with_venue(mut self, venue_name: impl Into<String>) -> Self {
        self.venue_name = Some(venue_name.into());
        self
    }
}

/// Issues, lists and deletes venue codes while keeping at most one active.
pub struct CodeRegistry {
    store: Arc<dyn VenueCodeStore>,
    clock: Arc<dyn Clock>,
    generator: CodeGenerator,
    format: CodeFormat,
    sweep_batch_size: usize,
    regenerate_retries: u32,
}

impl CodeRegistry {
    pub fn new(
        store: Arc<dyn VenueCodeStore>,
        clock: Arc<dyn Clock>,
        generator: CodeGenerator,
        format: CodeFormat,
        sweep_batch_size: usize,
        regenerate_retries: u32,
    ) -> Self {
        Self {
            store,
            clock,
            generator,
            format,
            sweep_batch_size,
            regenerate_retries,
        }
    }

    /// Issue a code, replacing the current active one in place if any.
    ///
    /// Expired records are purged first. The upsert is retried on write
    /// conflicts up to the configured limit; a format error or storage fault
    /// leaves the store untouched.
    pub fn create_or_regenerate(&self, request: &IssueRequest) -> Result<VenueCode, CodeError> {
        let explicit = non_blank(request.code.as_deref());
        if let Some(code) = &explicit {
            self.format.check(code)?;
        }
        let created_by =
            non_blank(request.created_by.as_deref()).unwrap_or_else(|| DEFAULT_CREATED_BY.into());

        let purged = sweep_expired(self.store.as_ref(), self.clock.now(), self.sweep_batch_size)?;
        if purged.deleted > 0 {
            tracing::debug!(deleted = purged.deleted, "purged expired venue codes before issue");
        }

        let max_attempts = self.regenerate_retries.saturating_add(1);
        for attempt in 1..=max_attempts {
            let candidate = self.generator.generate(
                explicit.as_deref(),
                request.venue_name.as_deref(),
                self.clock.now(),
            );
            let record = VenueCode::from_candidate(VenueCodeId::generate(), candidate, &created_by);

            match self.store.upsert_active(&record) {
                Ok(stored) => {
                    tracing::info!(
                        id = %stored.id,
                        venue = stored.venue_name.as_deref().unwrap_or("-"),
                        expires_at = stored.expires_at.as_millis(),
                        "venue code issued"
                    );
                    return Ok(stored);
                }
                Err(StoreError::Conflict(reason)) => {
                    tracing::warn!(attempt, max_attempts, %reason, "venue code upsert conflicted");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(CodeError::ConcurrentRegenerationConflict {
            attempts: max_attempts,
        })
    }

    /// Remove a code by id. Returns `false` when it did not exist.
    pub fn delete_code(&self, id: &VenueCodeId) -> Result<bool, CodeError> {
        let removed = self.store.delete_by_id(id)?;
        if removed {
            tracing::info!(%id, "venue code deleted");
        }
        Ok(removed)
    }

    /// Unexpired codes, newest first.
    pub fn list_active_codes(&self) -> Result<Vec<VenueCode>, CodeError> {
        Ok(self.store.list_active(self.clock.now())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use venue_nullables::{NullClock, NullRandom, NullVenueCodeStore};
    use venue_types::Timestamp;

    const DAY: Duration = Duration::from_secs(86_400);

    struct Fixture {
        store: Arc<NullVenueCodeStore>,
        clock: Arc<NullClock>,
        registry: CodeRegistry,
    }

    fn fixture(format: CodeFormat, retries: u32) -> Fixture {
        let store = Arc::new(NullVenueCodeStore::new());
        let clock = Arc::new(NullClock::new(1_000));
        let generator = CodeGenerator::new(Arc::new(NullRandom::new(vec![12_345, 67_890])), DAY);
        let registry = CodeRegistry::new(store.clone(), clock.clone(), generator, format, 500, retries);
        Fixture {
            store,
            clock,
            registry,
        }
    }

    #[test]
    fn issues_explicit_code_with_ttl() {
        let f = fixture(CodeFormat::Any, 3);
        let req = IssueRequest::explicit("12345").with_venue("Tokyo Stadium");
        let code = f.registry.create_or_regenerate(&req).unwrap();

        assert_eq!(code.code, "12345");
        assert_eq!(code.venue_name.as_deref(), Some("Tokyo Stadium"));
        assert_eq!(code.created_by, DEFAULT_CREATED_BY);
        assert_eq!(code.created_at, Timestamp::from_millis(1_000));
        assert_eq!(code.expires_at, Timestamp::from_millis(1_000).plus(DAY));
    }

    #[test]
    fn regenerate_replaces_in_place() {
        let f = fixture(CodeFormat::Any, 3);
        let first = f
            .registry
            .create_or_regenerate(&IssueRequest::explicit("11111"))
            .unwrap();
        f.clock.advance(Duration::from_secs(60));
        let second = f
            .registry
            .create_or_regenerate(&IssueRequest::explicit("22222").with_venue("Arena"))
            .unwrap();

        assert_eq!(first.id, second.id);
        let active = f.registry.list_active_codes().unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].code, "22222");
        assert_eq!(active[0].expires_at, second.created_at.plus(DAY));
    }

    #[test]
    fn random_codes_are_five_digits() {
        let f = fixture(CodeFormat::Digits(5), 3);
        let code = f.registry.create_or_regenerate(&IssueRequest::random()).unwrap();
        assert_eq!(code.code, "12345");
    }

    #[test]
    fn invalid_format_leaves_store_untouched() {
        let f = fixture(CodeFormat::Digits(5), 3);
        let err = f
            .registry
            .create_or_regenerate(&IssueRequest::explicit("12ab"))
            .unwrap_err();
        assert!(matches!(err, CodeError::InvalidFormat(_)));
        assert_eq!(f.store.code_count().unwrap(), 0);
    }

    #[test]
    fn expired_records_are_purged_before_issue() {
        let f = fixture(CodeFormat::Any, 3);
        f.registry
            .create_or_regenerate(&IssueRequest::explicit("11111"))
            .unwrap();
        f.clock.advance(DAY);
        let fresh = f
            .registry
            .create_or_regenerate(&IssueRequest::explicit("22222"))
            .unwrap();

        assert_eq!(f.store.code_count().unwrap(), 1);
        assert_eq!(f.store.get(&fresh.id).unwrap().unwrap().code, "22222");
    }

    #[test]
    fn conflicts_are_retried() {
        let f = fixture(CodeFormat::Any, 3);
        f.store.inject_conflicts(2);
        let code = f
            .registry
            .create_or_regenerate(&IssueRequest::explicit("12345"))
            .unwrap();
        assert_eq!(code.code, "12345");
    }

    #[test]
    fn persistent_conflict_is_reported() {
        let f = fixture(CodeFormat::Any, 2);
        f.store.inject_conflicts(10);
        let err = f
            .registry
            .create_or_regenerate(&IssueRequest::explicit("12345"))
            .unwrap_err();
        assert!(matches!(
            err,
            CodeError::ConcurrentRegenerationConflict { attempts: 3 }
        ));
        assert!(err.is_retryable());
        assert_eq!(f.store.code_count().unwrap(), 0);
    }

    #[test]
    fn storage_fault_is_retryable_and_writes_nothing() {
        let f = fixture(CodeFormat::Any, 3);
        f.store.set_fail_writes(true);
        let err = f
            .registry
            .create_or_regenerate(&IssueRequest::explicit("12345"))
            .unwrap_err();
        assert!(matches!(err, CodeError::StorageUnavailable(_)));
        assert!(err.is_retryable());
        f.store.set_fail_writes(false);
        assert_eq!(f.store.code_count().unwrap(), 0);
    }

    #[test]
    fn delete_reports_whether_anything_was_removed() {
        let f = fixture(CodeFormat::Any, 3);
        let code = f
            .registry
            .create_or_regenerate(&IssueRequest::random())
            .unwrap();
        assert!(f.registry.delete_code(&code.id).unwrap());
        assert!(!f.registry.delete_code(&code.id).unwrap());
        assert!(f.registry.list_active_codes().unwrap().is_empty());
    }

    #[test]
    fn custom_issuer_is_recorded() {
        let f = fixture(CodeFormat::Any, 3);
        let req = IssueRequest {
            created_by: Some("ops@cheerain".into()),
            ..IssueRequest::random()
        };
        let code = f.registry.create_or_regenerate(&req).unwrap();
        assert_eq!(code.created_by, "ops@cheerain");
    }
}
