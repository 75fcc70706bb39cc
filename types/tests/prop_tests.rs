use proptest::prelude::*;

use std::time::Duration;
use venue_types::{Timestamp, VenueCodeId};

proptest! {
    /// VenueCodeId roundtrip: from_bytes -> as_bytes produces identical bytes.
    #[test]
    fn venue_code_id_roundtrip(bytes in prop::array::uniform16(0u8..)) {
        let id = VenueCodeId::from_bytes(bytes);
        prop_assert_eq!(id.as_bytes(), &bytes);
    }

    /// Big-endian key bytes sort the same way as the timestamps themselves.
    #[test]
    fn timestamp_key_order_matches_numeric_order(a in 0u64.., b in 0u64..) {
        let ta = Timestamp::from_millis(a);
        let tb = Timestamp::from_millis(b);
        prop_assert_eq!(ta.cmp(&tb), ta.to_be_bytes().cmp(&tb.to_be_bytes()));
    }

    /// A deadline `ttl` after `t` is never reached before `t + ttl`.
    #[test]
    fn deadline_not_reached_early(t in 0u64..1_000_000_000_000, ttl_ms in 1u64..1_000_000_000) {
        let start = Timestamp::from_millis(t);
        let deadline = start.plus(Duration::from_millis(ttl_ms));
        prop_assert!(!deadline.is_reached_at(Timestamp::from_millis(t + ttl_ms - 1)));
        prop_assert!(deadline.is_reached_at(Timestamp::from_millis(t + ttl_ms)));
    }
}
