use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Signed money amount in integer cents. All arithmetic that has to preserve
/// totals (allocation, balances, settlement) happens on this type; floats
/// only appear at the JSON boundary.
pub type Cents = i64;

/// Equality tolerance for summed shares against a target.
pub const CENT_TOLERANCE: Cents = 1;

/// Round a wire amount (JSON number) to the nearest cent, half away from zero.
pub fn to_cents(amount: f64) -> Cents {
    (amount * 100.0).round() as Cents
}

/// Decimal form of a cent amount, for responses.
pub fn from_cents(cents: Cents) -> f64 {
    cents as f64 / 100.0
}

/// Convert a `NUMERIC(12,2)` column value to cents.
pub fn decimal_to_cents(value: Decimal) -> Cents {
    (value * Decimal::from(100)).round().to_i64().unwrap_or(0)
}

/// Convert cents back to the fixed-precision form stored in the database.
pub fn cents_to_decimal(cents: Cents) -> Decimal {
    Decimal::new(cents, 2)
}

/// Two-decimal display with a leading sign for negatives.
pub fn format_cents(cents: Cents) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

/// User-facing "settled" check: within 0.01 of zero.
pub fn is_settled(cents: Cents) -> bool {
    cents.abs() < CENT_TOLERANCE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_half_up() {
        // 0.125 dollars is exactly representable: 12.5 cents rounds up
        assert_eq!(to_cents(0.125), 13);
        assert_eq!(to_cents(10.004), 1000);
        assert_eq!(to_cents(0.0), 0);
        assert_eq!(to_cents(36.0), 3600);
    }

    #[test]
    fn survives_float_representation_noise() {
        // 10.05 is not exactly representable; the product must still land on 1005
        assert_eq!(to_cents(10.05), 1005);
        assert_eq!(to_cents(13.49), 1349);
        assert_eq!(to_cents(29.99), 2999);
    }

    #[test]
    fn decimal_round_trip() {
        let d = Decimal::new(1234, 2); // 12.34
        assert_eq!(decimal_to_cents(d), 1234);
        assert_eq!(cents_to_decimal(1234), d);
        assert_eq!(decimal_to_cents(cents_to_decimal(-501)), -501);
    }

    #[test]
    fn formats_with_sign_and_padding() {
        assert_eq!(format_cents(1234), "12.34");
        assert_eq!(format_cents(-7), "-0.07");
        assert_eq!(format_cents(0), "0.00");
        assert_eq!(format_cents(100000), "1000.00");
    }

    #[test]
    fn settled_threshold() {
        assert!(is_settled(0));
        assert!(!is_settled(1));
        assert!(!is_settled(-1));
    }
}
