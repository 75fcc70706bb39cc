//! LMDB storage backend for venue codes.
//!
//! Implements [`venue_store::VenueCodeStore`] using the `heed` LMDB bindings.
//! Records live in one database keyed by id, with two secondary indexes
//! (creation time and expiry time) kept in step inside every write
//! transaction.

pub mod environment;
pub mod error;
pub mod venue_code;

pub use environment::{LmdbEnvironment, MAX_DBS};
pub use error::LmdbError;
pub use venue_code::LmdbVenueCodeStore;
