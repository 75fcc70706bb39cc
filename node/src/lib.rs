//! Venue-code node: wires the LMDB store, the venue-code service, the
//! background expiry sweeper and the REST server together.

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod node;
pub mod shutdown;

pub use config::NodeConfig;
pub use error::NodeError;
pub use logging::{init_logging, LogFormat};
pub use metrics::VenueMetrics;
pub use node::VenueNode;
pub use shutdown::ShutdownController;
