//! Property tests for the TOTP countdown

use bwpalette_core::palette::TimeUrgency;
use bwpalette_core::remaining_seconds;
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// The countdown never leaves 1..=30, whatever the clock says
    #[test]
    fn remaining_is_always_in_window(t in any::<i64>()) {
        let remaining = remaining_seconds(t);
        prop_assert!((1..=30).contains(&remaining));
    }

    /// One second later the countdown drops by one, or wraps from 1 to 30
    #[test]
    fn remaining_counts_down_and_wraps(t in -1_000_000_000_000i64..1_000_000_000_000i64) {
        let now = remaining_seconds(t);
        let next = remaining_seconds(t + 1);
        if now == 1 {
            prop_assert_eq!(next, 30);
        } else {
            prop_assert_eq!(next, now - 1);
        }
    }

    /// Window boundaries read a full 30 seconds
    #[test]
    fn boundaries_read_full_window(k in -10_000_000_000i64..10_000_000_000i64) {
        prop_assert_eq!(remaining_seconds(k * 30), 30);
    }

    /// Urgency never relaxes as the countdown runs down
    #[test]
    fn urgency_is_monotonic(a in 1u32..=30, b in 1u32..=30) {
        let rank = |u: TimeUrgency| match u {
            TimeUrgency::Normal => 0,
            TimeUrgency::Warning => 1,
            TimeUrgency::Critical => 2,
        };
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(
            rank(TimeUrgency::from_remaining(low)) >= rank(TimeUrgency::from_remaining(high))
        );
    }
}
