//! Venue-code issuance, expiry sweeping and verification.
//!
//! A venue code is a short-lived, human-enterable proof that a fan was at the
//! stadium. Admins issue one code at a time; fans type it while creating an
//! NFT, and a match sets the attendee flag on that NFT.
//!
//! - [`CodeGenerator`] turns an optional explicit code into a candidate with
//!   server-assigned timestamps.
//! - [`CodeRegistry`] runs the admin operations against a
//!   [`venue_store::VenueCodeStore`], enforcing a single active code.
//! - [`ExpirySweeper`] deletes expired codes in bounded batches.
//! - [`Verifier`] compares a submission with the current code. It never
//!   fails; faults degrade to a non-match.
//! - [`VerifyDebouncer`] applies last-write-wins to keystroke-driven
//!   verification.

pub mod attendance;
pub mod config;
pub mod debounce;
pub mod error;
pub mod format;
pub mod generator;
pub mod registry;
pub mod service;
pub mod sweeper;
pub mod verifier;

pub use attendance::{stamp_attendance, AttendanceStamp};
pub use config::CodeConfig;
pub use debounce::{LatestOnly, Ticket, VerifyDebouncer};
pub use error::CodeError;
pub use format::CodeFormat;
pub use generator::CodeGenerator;
pub use registry::{CodeRegistry, IssueRequest};
pub use service::VenueCodeService;
pub use sweeper::{ExpirySweeper, SweepReport};
pub use verifier::{MismatchReason, Verifier, VerifyOutcome};
