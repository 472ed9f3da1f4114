use alloy_primitives::U256;
use common::validate::{
    deadline_after, format_amount, is_address, is_bytes32, parse_amount, SECONDS_PER_MINUTE,
};
use proptest::prelude::*;

proptest! {
    /// Any 40-hex-char body is an address; any other length is not.
    #[test]
    fn address_shape_is_length_exact(body in "[0-9a-fA-F]{1,80}") {
        let candidate = format!("0x{body}");
        prop_assert_eq!(is_address(&candidate), body.len() == 40);
        prop_assert_eq!(is_bytes32(&candidate), body.len() == 64);
    }

    /// Validators never panic on arbitrary input.
    #[test]
    fn validators_never_panic(input in ".*") {
        let _ = is_address(&input);
        let _ = is_bytes32(&input);
        let _ = parse_amount(&input);
        let _ = deadline_after(0, &input, SECONDS_PER_MINUTE);
    }

    /// Up to six decimals convert exactly and format back to the same value.
    #[test]
    fn amount_conversion_is_exact(whole in 0u64..1_000_000_000, frac in 0u64..1_000_000) {
        let text = format!("{whole}.{frac:06}");
        let raw = parse_amount(&text).unwrap();
        prop_assert_eq!(raw, U256::from(whole) * U256::from(1_000_000u64) + U256::from(frac));
        prop_assert_eq!(parse_amount(&format_amount(raw)).unwrap(), raw);
    }

    /// A seventh fractional digit is always rejected, never truncated.
    #[test]
    fn seven_decimals_always_rejected(whole in 0u64..1_000, frac in 0u64..10_000_000) {
        let text = format!("{whole}.{frac:07}");
        prop_assert!(parse_amount(&text).is_err());
    }

    #[test]
    fn lock_deadline_is_now_plus_minutes(now in 0u64..4_000_000_000, mins in 0u64..1_000_000) {
        let deadline = deadline_after(now, &mins.to_string(), SECONDS_PER_MINUTE).unwrap();
        prop_assert_eq!(deadline, now + mins * 60);
    }
}
