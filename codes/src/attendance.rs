//! Attendance stamping for NFT creation.

use crate::Verifier;

/// Attendance fields written onto a newly minted NFT.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AttendanceStamp {
    pub is_venue_attendee: bool,
    pub venue_name: Option<String>,
}

/// Derive attendance from the venue code a fan typed, if any.
///
/// An absent or unmatched code yields a non-attendee stamp. Verification
/// faults never block NFT creation.
pub fn stamp_attendance(verifier: &Verifier, submitted: Option<&str>) -> AttendanceStamp {
    let Some(submitted) = submitted else {
        return AttendanceStamp::default();
    };
    let outcome = verifier.verify(submitted);
    AttendanceStamp {
        is_venue_attendee: outcome.matched,
        venue_name: outcome.venue_name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use venue_nullables::{NullClock, NullVenueCodeStore};
    use venue_types::{Timestamp, VenueCode, VenueCodeId, DEFAULT_CREATED_BY};

    fn verifier_with(code: &str) -> Verifier {
        let store = Arc::new(NullVenueCodeStore::new());
        store.insert_raw(VenueCode {
            id: VenueCodeId::generate(),
            code: code.into(),
            venue_name: Some("Tokyo Stadium".into()),
            created_by: DEFAULT_CREATED_BY.into(),
            created_at: Timestamp::EPOCH,
            expires_at: Timestamp::from_secs(86_400),
        });
        Verifier::new(store, Arc::new(NullClock::new(1_000)), 10)
    }

    #[test]
    fn matching_code_marks_attendee() {
        let stamp = stamp_attendance(&verifier_with("12345"), Some("12345"));
        assert!(stamp.is_venue_attendee);
        assert_eq!(stamp.venue_name.as_deref(), Some("Tokyo Stadium"));
    }

    #[test]
    fn missing_or_wrong_code_is_not_attendee() {
        let verifier = verifier_with("12345");
        assert_eq!(stamp_attendance(&verifier, None), AttendanceStamp::default());
        assert_eq!(
            stamp_attendance(&verifier, Some("99999")),
            AttendanceStamp::default()
        );
    }
}
