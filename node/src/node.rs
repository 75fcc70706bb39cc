//! The running venue-code node: storage, background sweeping and REST.

use std::sync::Arc;

use tokio::task::JoinHandle;
use venue_codes::{SweepReport, VenueCodeService};
use venue_rpc::{RpcServer, RpcState};
use venue_store::VenueCodeStore;
use venue_store_lmdb::{LmdbEnvironment, MAX_DBS};
use venue_types::{Clock, CodeSource, SystemClock, ThreadRngSource};

use crate::{NodeConfig, NodeError, ShutdownController, VenueMetrics};

/// A running venue-code node.
pub struct VenueNode {
    pub config: NodeConfig,
    pub service: Arc<VenueCodeService>,
    pub metrics: Arc<VenueMetrics>,
    shutdown: Arc<ShutdownController>,
    /// Handles for spawned background tasks (joined during shutdown).
    task_handles: Vec<JoinHandle<()>>,
}

impl VenueNode {
    /// Open the LMDB environment at `config.data_dir` and wire the service
    /// with the system clock and the thread-local RNG.
    pub fn new(config: NodeConfig) -> Result<Self, NodeError> {
        config.validate()?;
        let env = LmdbEnvironment::open(&config.data_dir, MAX_DBS, config.map_size_bytes())?;
        let store: Arc<dyn VenueCodeStore> = Arc::new(env.venue_code_store());
        tracing::info!(data_dir = %config.data_dir.display(), "venue code store opened");

        Self::with_parts(
            config,
            store,
            Arc::new(SystemClock),
            Arc::new(ThreadRngSource),
        )
    }

    /// Build a node over explicit collaborators (tests, embedding).
    pub fn with_parts(
        config: NodeConfig,
        store: Arc<dyn VenueCodeStore>,
        clock: Arc<dyn Clock>,
        source: Arc<dyn CodeSource>,
    ) -> Result<Self, NodeError> {
        let service = Arc::new(VenueCodeService::new(store, clock, source, &config.codes)?);
        Ok(Self {
            config,
            service,
            metrics: Arc::new(VenueMetrics::new()),
            shutdown: Arc::new(ShutdownController::new()),
            task_handles: Vec::new(),
        })
    }

    pub fn shutdown_controller(&self) -> Arc<ShutdownController> {
        Arc::clone(&self.shutdown)
    }

    /// Run one expiry sweep now and record it.
    pub fn sweep_once(&self) -> Result<SweepReport, NodeError> {
        let report = self.service.sweep()?;
        self.metrics.record_sweep(&report);
        Ok(report)
    }

    /// Spawn the background tasks enabled in the configuration.
    pub fn start(&mut self) -> Result<(), NodeError> {
        tracing::info!("venue node starting");

        // ── Expiry sweeper ────────────────────────────────────────────────
        if self.config.enable_sweeper {
            let service = Arc::clone(&self.service);
            let metrics = Arc::clone(&self.metrics);
            let period = self.config.codes.sweep_interval();
            let mut shutdown_rx = self.shutdown.subscribe();

            let sweep_handle = tokio::spawn(async move {
                let mut interval = tokio::time::interval(period);
                interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
                loop {
                    tokio::select! {
                        biased;
                        _ = shutdown_rx.recv() => {
                            tracing::info!("expiry sweeper shutting down");
                            break;
                        }
                        _ = interval.tick() => {
                            match service.sweep() {
                                Ok(report) => metrics.record_sweep(&report),
                                Err(e) => tracing::warn!(error = %e, "expiry sweep failed"),
                            }
                        }
                    }
                }
            });
            self.task_handles.push(sweep_handle);
        }

        // ── REST server ───────────────────────────────────────────────────
        if self.config.enable_rpc {
            let mut state = RpcState::new(Arc::clone(&self.service));
            if self.config.enable_metrics {
                state = state.with_metrics(
                    Arc::clone(&self.metrics) as Arc<dyn venue_rpc::RpcMetrics>,
                    self.metrics.registry.clone(),
                );
            }
            let server = RpcServer::with_state(
                self.config.rpc_host.clone(),
                self.config.rpc_port,
                Arc::new(state),
            );
            let signalled = self.shutdown.signalled();

            let rpc_handle = tokio::spawn(async move {
                match server.start(signalled).await {
                    Ok(()) => tracing::info!("REST server exited"),
                    Err(e) => tracing::error!(error = %e, "REST server error"),
                }
            });
            self.task_handles.push(rpc_handle);
        }

        Ok(())
    }

    /// Start, wait for SIGINT/SIGTERM, then stop.
    pub async fn run(&mut self) -> Result<(), NodeError> {
        self.start()?;
        self.shutdown.wait_for_signal().await;
        self.stop().await
    }

    /// Signal every task and wait for them to finish.
    pub async fn stop(&mut self) -> Result<(), NodeError> {
        tracing::info!("venue node stopping");
        self.shutdown.shutdown();
        for handle in self.task_handles.drain(..) {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "background task ended abnormally");
            }
        }
        tracing::info!("venue node stopped");
        Ok(())
    }
}
