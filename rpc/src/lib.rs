//! REST server for the venue-code subsystem.
//!
//! Provides endpoints for:
//! - Issuing, listing and deleting venue codes (admin)
//! - Triggering an expiry sweep from an external scheduler
//! - Verifying a fan-submitted code
//! - Health and Prometheus metrics

pub mod error;
pub mod handlers;
pub mod server;

pub use error::RpcError;
pub use handlers::ApiResponse;
pub use server::{router, RpcMetrics, RpcServer, RpcState};
