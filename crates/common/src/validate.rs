// Raw user strings: surrounding whitespace is ignored, the `0x` prefix is
// required and lowercase, hex digits are case-insensitive.

use alloy_primitives::{Address, Bytes, B256, U256};

use crate::{Error, Result};

/// The escrowed token uses 6 decimals.
pub const AMOUNT_DECIMALS: usize = 6;

pub const SECONDS_PER_MINUTE: u64 = 60;
pub const SECONDS_PER_HOUR: u64 = 3_600;

fn hex_body(input: &str) -> Option<&str> {
    let body = input.trim().strip_prefix("0x")?;
    if !body.is_empty() && body.bytes().all(|b| b.is_ascii_hexdigit()) {
        Some(body)
    } else {
        None
    }
}

/// `0x` followed by exactly 40 hex characters.
pub fn is_address(input: &str) -> bool {
    hex_body(input).is_some_and(|body| body.len() == 40)
}

/// `0x` followed by exactly 64 hex characters.
pub fn is_bytes32(input: &str) -> bool {
    hex_body(input).is_some_and(|body| body.len() == 64)
}

/// `0x` followed by at least one hex character.
pub fn is_hex(input: &str) -> bool {
    hex_body(input).is_some()
}

pub fn parse_address(input: &str) -> Result<Address> {
    match hex_body(input) {
        Some(body) if body.len() == 40 => {
            let raw = hex::decode(body).map_err(|e| Error::validation(e.to_string()))?;
            Ok(Address::from_slice(&raw))
        }
        _ => Err(Error::validation(format!("'{}' is not a 0x address", input.trim()))),
    }
}

pub fn parse_bytes32(input: &str) -> Result<B256> {
    match hex_body(input) {
        Some(body) if body.len() == 64 => {
            let raw = hex::decode(body).map_err(|e| Error::validation(e.to_string()))?;
            Ok(B256::from_slice(&raw))
        }
        _ => Err(Error::validation(format!("'{}' is not bytes32", input.trim()))),
    }
}

/// Arbitrary-length hex payload. Odd-length bodies are rejected since they
/// cannot be split into whole bytes.
pub fn parse_hex_bytes(input: &str) -> Result<Bytes> {
    let body = hex_body(input)
        .ok_or_else(|| Error::validation(format!("'{}' is not a 0x hex string", input.trim())))?;
    let raw = hex::decode(body).map_err(|e| Error::validation(format!("invalid hex: {e}")))?;
    Ok(Bytes::from(raw))
}

/// Convert a decimal string to a fixed-point integer with [`AMOUNT_DECIMALS`]
/// places. More fractional digits than that are rejected, never rounded.
pub fn parse_amount(input: &str) -> Result<U256> {
    let s = input.trim();
    let (whole, frac) = s.split_once('.').unwrap_or((s, ""));

    let digits_only = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
    if (whole.is_empty() && frac.is_empty()) || !digits_only(whole) || !digits_only(frac) {
        return Err(Error::validation(format!("Amount '{s}' is not a decimal number.")));
    }
    if frac.len() > AMOUNT_DECIMALS {
        return Err(Error::validation(format!(
            "Amount supports at most {AMOUNT_DECIMALS} decimal places."
        )));
    }

    let scaled = format!("{whole}{frac:0<width$}", width = AMOUNT_DECIMALS);
    U256::from_str_radix(&scaled, 10)
        .map_err(|_| Error::validation(format!("Amount '{s}' is too large.")))
}

/// Render a fixed-point amount back to a decimal string without trailing zeros.
pub fn format_amount(raw: U256) -> String {
    let scale = U256::from(10u64).pow(U256::from(AMOUNT_DECIMALS));
    let whole = raw / scale;
    let frac = raw % scale;
    if frac.is_zero() {
        return whole.to_string();
    }
    let frac = format!("{:0>width$}", frac.to_string(), width = AMOUNT_DECIMALS);
    format!("{whole}.{}", frac.trim_end_matches('0'))
}

/// Non-empty run of decimal digits, parsed as an unsigned integer.
pub fn parse_whole_number(input: &str) -> Result<u64> {
    let s = input.trim();
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::validation(format!("'{s}' is not a whole number")));
    }
    s.parse::<u64>()
        .map_err(|_| Error::validation(format!("'{s}' is out of range")))
}

/// Absolute deadline `now + offset * unit_secs`, where `offset` is a raw
/// whole-number string such as the "minutes from now" field.
pub fn deadline_after(now: u64, offset: &str, unit_secs: u64) -> Result<u64> {
    let offset = parse_whole_number(offset)?;
    offset
        .checked_mul(unit_secs)
        .and_then(|secs| now.checked_add(secs))
        .ok_or_else(|| Error::validation("Deadline is out of range."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_needs_exactly_forty_hex_chars() {
        assert!(is_address("0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512"));
        assert!(is_address("  0xe7f1725e7734ce288f8367e1bb143e90bb3f0512\n"));
        assert!(!is_address("0xe7f1725E7734CE288F8367e1Bb143E90bb3F051"));
        assert!(!is_address("0xe7f1725E7734CE288F8367e1Bb143E90bb3F05123"));
        assert!(!is_address("0xg7f1725E7734CE288F8367e1Bb143E90bb3F0512"));
        assert!(!is_address("e7f1725E7734CE288F8367e1Bb143E90bb3F0512"));
        assert!(!is_address("0X e7f1725E7734CE288F8367e1Bb143E90bb3F0512"));
        assert!(!is_address(""));
    }

    #[test]
    fn bytes32_needs_exactly_sixty_four_hex_chars() {
        let ok = format!("0x{}", "aB".repeat(32));
        assert!(is_bytes32(&ok));
        assert!(!is_bytes32(&format!("0x{}", "a".repeat(63))));
        assert!(!is_bytes32(&format!("0x{}", "a".repeat(65))));
        assert!(!is_bytes32(&format!("0x{}z", "a".repeat(63))));
        assert!(!is_bytes32("0x"));
    }

    #[test]
    fn parsed_address_keeps_bytes() {
        let addr = parse_address("0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512").unwrap();
        assert_eq!(addr.as_slice()[0], 0xe7);
        assert_eq!(addr.as_slice()[19], 0x12);
        assert!(parse_address("0x1234").is_err());
    }

    #[test]
    fn hex_payload_rejects_odd_length() {
        assert_eq!(parse_hex_bytes("0xdeadbeef").unwrap().len(), 4);
        assert!(parse_hex_bytes("0xabc").is_err());
        assert!(parse_hex_bytes("0x").is_err());
    }

    #[test]
    fn whole_amount_scales_by_six_decimals() {
        assert_eq!(parse_amount("10").unwrap(), U256::from(10_000_000u64));
    }

    #[test]
    fn smallest_unit_is_one() {
        assert_eq!(parse_amount("0.000001").unwrap(), U256::from(1u64));
    }

    #[test]
    fn seventh_decimal_is_rejected() {
        let err = parse_amount("0.0000001").unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn malformed_amounts_are_rejected() {
        for bad in ["", ".", "abc", "1,5", "-1", "1.2.3", "1e6", " "] {
            assert!(parse_amount(bad).is_err(), "{bad:?} should be rejected");
        }
        assert_eq!(parse_amount(".5").unwrap(), U256::from(500_000u64));
        assert_eq!(parse_amount("5.").unwrap(), U256::from(5_000_000u64));
    }

    #[test]
    fn amount_formats_without_trailing_zeros() {
        assert_eq!(format_amount(U256::from(10_000_000u64)), "10");
        assert_eq!(format_amount(U256::from(10_500_000u64)), "10.5");
        assert_eq!(format_amount(U256::from(1u64)), "0.000001");
        assert_eq!(format_amount(U256::ZERO), "0");
    }

    #[test]
    fn lock_deadline_adds_minutes() {
        assert_eq!(deadline_after(1000, "10", SECONDS_PER_MINUTE).unwrap(), 1600);
        assert_eq!(deadline_after(1000, "24", SECONDS_PER_HOUR).unwrap(), 87_400);
    }

    #[test]
    fn deadline_rejects_garbage_and_overflow() {
        assert!(deadline_after(1000, "ten", SECONDS_PER_MINUTE).is_err());
        assert!(deadline_after(1000, "", SECONDS_PER_MINUTE).is_err());
        assert!(deadline_after(1000, "-5", SECONDS_PER_MINUTE).is_err());
        assert!(deadline_after(u64::MAX, "1", SECONDS_PER_MINUTE).is_err());
    }
}
