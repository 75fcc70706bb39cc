//! The venue-code record and its pre-storage candidate form.

use serde::{Deserialize, Serialize};

use crate::{Timestamp, VenueCodeId};

/// Issuer recorded when the caller does not identify an admin.
pub const DEFAULT_CREATED_BY: &str = "admin";

/// A code value plus server-assigned timestamps, not yet bound to a store
/// record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateCode {
    pub code: String,
    pub venue_name: Option<String>,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
}

/// A persisted venue code.
///
/// `expires_at` is always derived from `created_at` plus the configured TTL
/// and is never taken from user input.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VenueCode {
    pub id: VenueCodeId,
    pub code: String,
    pub venue_name: Option<String>,
    pub created_by: String,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
}

impl VenueCode {
    /// Bind a candidate to an identity and issuer.
    pub fn from_candidate(
        id: VenueCodeId,
        candidate: CandidateCode,
        created_by: impl Into<String>,
    ) -> Self {
        Self {
            id,
            code: candidate.code,
            venue_name: candidate.venue_name,
            created_by: created_by.into(),
            created_at: candidate.created_at,
            expires_at: candidate.expires_at,
        }
    }

    /// Whether the code can still be redeemed at `now`.
    pub fn is_active_at(&self, now: Timestamp) -> bool {
        !self.expires_at.is_reached_at(now)
    }

    /// Whether the code is past its expiry at `now`.
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        self.expires_at.is_reached_at(now)
    }
}
