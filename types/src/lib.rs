//! Fundamental types for the venue-code subsystem.
//!
//! This crate defines the types shared by every other crate in the workspace:
//! timestamps and clocks, venue-code identifiers and records, and the random
//! source used to draw fallback codes.

pub mod code;
pub mod error;
pub mod id;
pub mod source;
pub mod time;

pub use code::{CandidateCode, VenueCode, DEFAULT_CREATED_BY};
pub use error::TypesError;
pub use id::VenueCodeId;
pub use source::{CodeSource, ThreadRngSource, RANDOM_CODE_MAX, RANDOM_CODE_MIN};
pub use time::{Clock, SystemClock, Timestamp};
