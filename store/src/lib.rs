//! Abstract storage traits for venue codes.
//!
//! Every storage backend (LMDB, in-memory for testing) implements these
//! traits. The rest of the codebase depends only on the traits.

pub mod error;
pub mod venue_code;

pub use error::StoreError;
pub use venue_code::VenueCodeStore;
