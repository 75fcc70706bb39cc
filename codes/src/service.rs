//! Facade bundling issuance, sweeping and verification over one store.

use std::sync::Arc;

use venue_store::VenueCodeStore;
use venue_types::{Clock, CodeSource, VenueCode, VenueCodeId};

use crate::{
    AttendanceStamp, CodeConfig, CodeError, CodeGenerator, CodeRegistry, ExpirySweeper,
    IssueRequest, SweepReport, Verifier, VerifyDebouncer, VerifyOutcome,
};

/// The venue-code service used by the RPC layer, the node and the CLI.
pub struct VenueCodeService {
    registry: CodeRegistry,
    verifier: Arc<Verifier>,
    sweeper: ExpirySweeper,
    config: CodeConfig,
}

impl VenueCodeService {
    pub fn new(
        store: Arc<dyn VenueCodeStore>,
        clock: Arc<dyn Clock>,
        source: Arc<dyn CodeSource>,
        config: &CodeConfig,
    ) -> Result<Self, CodeError> {
        config.validate()?;
        let generator = CodeGenerator::new(source, config.code_ttl());
        let registry = CodeRegistry::new(
            store.clone(),
            clock.clone(),
            generator,
            config.code_format(),
            config.sweep_batch_size,
            config.regenerate_retries,
        );
        let verifier = Arc::new(Verifier::new(
            store.clone(),
            clock.clone(),
            config.verify_lookback,
        ));
        let sweeper = ExpirySweeper::new(store, clock, config.sweep_batch_size);
        Ok(Self {
            registry,
            verifier,
            sweeper,
            config: config.clone(),
        })
    }

    pub fn create_or_regenerate_code(&self, request: &IssueRequest) -> Result<VenueCode, CodeError> {
        self.registry.create_or_regenerate(request)
    }

    pub fn delete_code(&self, id: &VenueCodeId) -> Result<bool, CodeError> {
        self.registry.delete_code(id)
    }

    pub fn list_active_codes(&self) -> Result<Vec<VenueCode>, CodeError> {
        self.registry.list_active_codes()
    }

    pub fn verify(&self, submitted: &str) -> VerifyOutcome {
        self.verifier.verify(submitted)
    }

    pub fn stamp_attendance(&self, submitted: Option<&str>) -> AttendanceStamp {
        crate::stamp_attendance(&self.verifier, submitted)
    }

    pub fn sweep(&self) -> Result<SweepReport, CodeError> {
        self.sweeper.sweep()
    }

    /// A debouncer sharing this service's verifier and timing knobs.
    pub fn debouncer(&self) -> VerifyDebouncer {
        VerifyDebouncer::new(
            self.verifier.clone(),
            self.config.verify_debounce(),
            self.config.verify_trigger_len,
        )
    }
}
