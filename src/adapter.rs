//! Adapter layer: converts between the game's f64 modifiers and the
//! Decimal arithmetic used for prices.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};

/// Convert f64 to Decimal (lossy but sufficient for prices).
pub fn to_decimal(v: f64) -> Decimal {
    Decimal::from_f64(v).unwrap_or(Decimal::ZERO)
}

/// Round to a whole coin count, halves away from zero.
///
/// Negative values round to 0; values beyond `u32::MAX` saturate.
pub fn round_coins(d: Decimal) -> u32 {
    let rounded = d.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    if rounded.is_sign_negative() {
        return 0;
    }
    rounded.to_u32().unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(round_coins(dec!(96.5)), 97);
        assert_eq!(round_coins(dec!(96.49)), 96);
        assert_eq!(round_coins(dec!(0.5)), 1);
    }

    #[test]
    fn negative_and_huge_values_saturate() {
        assert_eq!(round_coins(dec!(-3)), 0);
        assert_eq!(round_coins(dec!(1000000000000)), u32::MAX);
    }

    #[test]
    fn non_finite_maps_to_zero() {
        assert_eq!(to_decimal(f64::NAN), Decimal::ZERO);
        assert_eq!(to_decimal(f64::INFINITY), Decimal::ZERO);
    }
}
