//! Prometheus metrics for the venue-code node.
//!
//! The [`VenueMetrics`] struct owns a dedicated [`Registry`] that the REST
//! `/metrics` endpoint encodes into the Prometheus text exposition format.

use prometheus::{
    register_int_counter_vec_with_registry, register_int_counter_with_registry,
    register_int_gauge_with_registry, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
};
use venue_codes::SweepReport;
use venue_rpc::RpcMetrics;

/// Central collection of all venue-code metrics.
pub struct VenueMetrics {
    /// The Prometheus registry that owns every metric below.
    pub registry: Registry,

    // ── Counters ────────────────────────────────────────────────────────
    /// Codes issued or regenerated through the admin API.
    pub codes_issued: IntCounter,
    /// Expired codes removed by sweeps.
    pub codes_swept: IntCounter,
    /// Completed sweep runs.
    pub sweeps: IntCounter,
    /// Verifications, labelled by outcome.
    pub verifications: IntCounterVec,

    // ── Gauges ──────────────────────────────────────────────────────────
    /// Active codes at the last listing.
    pub active_codes: IntGauge,
}

impl VenueMetrics {
    /// Create a fresh set of metrics, all registered under a new
    /// [`Registry`].
    pub fn new() -> Self {
        let registry = Registry::new();

        let codes_issued = register_int_counter_with_registry!(
            Opts::new(
                "venue_codes_issued_total",
                "Venue codes issued or regenerated"
            ),
            registry
        )
        .expect("failed to register codes_issued counter");

        let codes_swept = register_int_counter_with_registry!(
            Opts::new(
                "venue_codes_swept_total",
                "Expired venue codes deleted by sweeps"
            ),
            registry
        )
        .expect("failed to register codes_swept counter");

        let sweeps = register_int_counter_with_registry!(
            Opts::new("venue_sweeps_total", "Completed expiry sweep runs"),
            registry
        )
        .expect("failed to register sweeps counter");

        let verifications = register_int_counter_vec_with_registry!(
            Opts::new(
                "venue_verifications_total",
                "Venue code verifications by outcome"
            ),
            &["outcome"],
            registry
        )
        .expect("failed to register verifications counter");

        let active_codes = register_int_gauge_with_registry!(
            Opts::new("venue_active_codes", "Active venue codes at last listing"),
            registry
        )
        .expect("failed to register active_codes gauge");

        Self {
            registry,
            codes_issued,
            codes_swept,
            sweeps,
            verifications,
            active_codes,
        }
    }

    pub fn record_sweep(&self, report: &SweepReport) {
        self.sweep_completed(report.deleted);
    }
}

impl Default for VenueMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl RpcMetrics for VenueMetrics {
    fn code_issued(&self) {
        self.codes_issued.inc();
    }

    fn active_codes(&self, count: usize) {
        self.active_codes.set(i64::try_from(count).unwrap_or(i64::MAX));
    }

    fn sweep_completed(&self, deleted: usize) {
        self.sweeps.inc();
        self.codes_swept.inc_by(deleted as u64);
    }

    fn verification(&self, outcome: &str) {
        self.verifications.with_label_values(&[outcome]).inc();
    }
}
