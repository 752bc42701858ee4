// Copyright © 2026 Hypermesh Foundation. All rights reserved.
// Licensed under the Business Source License 1.1.
// See the LICENSE file in the repository root for full license text.

//! Price recomputation math.
//!
//! ```text
//! modifier  = saturation_modifier * (1 + volatility)
//! new_price = clamp(round(base * modifier), round(base * 0.5), round(base * 2.0))
//! ```
//!
//! Prices are whole coins; the multiplication and rounding happen in
//! `Decimal` so boundary prices round the same way on every target.

use rand::Rng;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::adapter::{round_coins, to_decimal};
use crate::config::{
    DAMPENING_SLOPE, PRICE_CEILING_MULTIPLE, PRICE_FLOOR_MULTIPLE, SATURATION_MARKUP,
    STOCK_RETENTION,
};
use crate::locations::MarketPriceEntry;

/// Dampening factor: 1.0 at or below the threshold, then falling by 0.3
/// per 100 units of excess saturation. Not clamped here; the price clamp
/// bounds the final result.
pub fn saturation_modifier(saturation: f64, threshold: f64) -> f64 {
    if saturation > threshold {
        1.0 - ((saturation - threshold) / 100.0) * DAMPENING_SLOPE
    } else {
        1.0
    }
}

/// Uniform draw in `[-half_width, +half_width]`. A zero width never touches
/// the RNG.
pub fn draw_volatility<R: Rng + ?Sized>(rng: &mut R, half_width: f64) -> f64 {
    if half_width <= 0.0 || !half_width.is_finite() {
        return 0.0;
    }
    rng.gen_range(-half_width..=half_width)
}

/// Inclusive price clamp derived from a base price.
///
/// Normally `[round(base × 0.5), round(base × 2)]`, except that the floor is
/// never below one coin and the ceiling never below the floor. For a base
/// under 0.25 both raw bounds round to 0, and the band is `[1, 1]` instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceBounds {
    pub floor: u32,
    pub ceiling: u32,
}

impl PriceBounds {
    pub fn for_base(base_price: f64) -> Self {
        let base = to_decimal(base_price);
        let scaled = |m: Decimal| base.checked_mul(m).map_or(u32::MAX, round_coins);
        let floor = scaled(PRICE_FLOOR_MULTIPLE).max(1);
        let ceiling = scaled(PRICE_CEILING_MULTIPLE).max(floor);
        Self { floor, ceiling }
    }

    pub fn contains(&self, price: u32) -> bool {
        (self.floor..=self.ceiling).contains(&price)
    }
}

/// Bounded price for one pair in one pass.
pub fn quote_price(base_price: f64, saturation_modifier: f64, volatility: f64) -> u32 {
    // Anything outside [0, 4] lands on a bound anyway; clamping first keeps
    // the Decimal product in range for huge saturations.
    let modifier = to_decimal((saturation_modifier * (1.0 + volatility)).clamp(0.0, 4.0));
    let raw = to_decimal(base_price)
        .checked_mul(modifier)
        .map_or(u32::MAX, round_coins);
    let bounds = PriceBounds::for_base(base_price);
    raw.clamp(bounds.floor, bounds.ceiling)
}

/// Scarcity after a saturation crossing: stock drops by 30% (never below 1)
/// and the current price rises by 10%.
pub fn apply_saturation_effects(entry: &mut MarketPriceEntry) {
    let kept = (Decimal::from(entry.stock) * STOCK_RETENTION)
        .floor()
        .to_u32()
        .unwrap_or(0);
    entry.stock = kept.max(1);
    entry.price = round_coins(Decimal::from(entry.price) * SATURATION_MARKUP);
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn modifier_neutral_at_threshold() {
        assert_eq!(saturation_modifier(10.0, 10.0), 1.0);
        assert_eq!(saturation_modifier(0.0, 10.0), 1.0);
    }

    #[test]
    fn modifier_dampens_above_threshold() {
        assert!((saturation_modifier(20.0, 10.0) - 0.97).abs() < 1e-12);
        assert!((saturation_modifier(110.0, 10.0) - 0.7).abs() < 1e-12);
    }

    #[test]
    fn quote_matches_worked_example() {
        let m = saturation_modifier(20.0, 10.0);
        assert_eq!(quote_price(100.0, m, 0.0), 97);
    }

    #[test]
    fn quote_clamps_to_floor_and_ceiling() {
        // Huge saturation drives the modifier negative.
        let m = saturation_modifier(1_000.0, 10.0);
        assert!(m < 0.0);
        assert_eq!(quote_price(100.0, m, 0.0), 50);
        assert_eq!(quote_price(100.0, 3.0, 0.0), 200);
    }

    #[test]
    fn bounds_round_and_stay_positive() {
        assert_eq!(PriceBounds::for_base(15.0), PriceBounds { floor: 8, ceiling: 30 });
        assert_eq!(PriceBounds::for_base(0.6), PriceBounds { floor: 1, ceiling: 1 });
    }

    #[test]
    fn tiny_base_quotes_one_coin() {
        // round(0.2 × 2) = 0, lifted to the one-coin floor.
        assert_eq!(PriceBounds::for_base(0.2), PriceBounds { floor: 1, ceiling: 1 });
        assert_eq!(quote_price(0.2, 1.0, 0.0), 1);
        assert_eq!(quote_price(0.2, saturation_modifier(500.0, 10.0), 0.0), 1);
    }

    #[test]
    fn volatility_stays_in_half_width() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..1_000 {
            let v = draw_volatility(&mut rng, 0.05);
            assert!((-0.05..=0.05).contains(&v), "draw {v} out of range");
        }
    }

    #[test]
    fn zero_volatility_is_exact() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let before = rng.clone();
        assert_eq!(draw_volatility(&mut rng, 0.0), 0.0);
        assert_eq!(rng, before, "zero width must not consume randomness");
    }

    #[test]
    fn saturation_effects_cut_stock_and_mark_up() {
        let mut entry = MarketPriceEntry::new(100, 10);
        apply_saturation_effects(&mut entry);
        assert_eq!(entry, MarketPriceEntry::new(110, 7));
    }

    #[test]
    fn saturation_effects_never_empty_stock() {
        let mut entry = MarketPriceEntry::new(9, 1);
        apply_saturation_effects(&mut entry);
        assert_eq!(entry.stock, 1);
        assert_eq!(entry.price, 10); // 9.9 rounds up

        let mut empty = MarketPriceEntry::new(5, 0);
        apply_saturation_effects(&mut empty);
        assert_eq!(empty.stock, 1);
    }

    #[test]
    fn saturation_effects_compound() {
        let mut entry = MarketPriceEntry::new(100, 100);
        apply_saturation_effects(&mut entry);
        apply_saturation_effects(&mut entry);
        assert_eq!(entry, MarketPriceEntry::new(121, 49));
    }
}
