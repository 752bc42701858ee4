// Poisson Trade Generator: seedable player buy/sell traffic per market pass

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use market_engine::SaturationKey;

pub struct TrafficGenerator {
    rng: ChaCha8Rng,
    pairs: Vec<SaturationKey>,
    pub trade_count: u32,
    pub units_traded: u64,
}

impl TrafficGenerator {
    pub fn new(rng: ChaCha8Rng, pairs: Vec<SaturationKey>) -> Self {
        Self { rng, pairs, trade_count: 0, units_traded: 0 }
    }

    /// Trades for one pass as `(pair, signed quantity)`. Quantities are never
    /// zero; negative means the player sold.
    ///
    /// `hot_share` of trades go to the first pair, the rest are uniform.
    pub fn generate_pass(
        &mut self,
        lambda: f64,
        sell_bias: f64,
        max_lot: u32,
        hot_share: f64,
    ) -> Vec<(SaturationKey, i64)> {
        if self.pairs.is_empty() || lambda <= 0.0 {
            return Vec::new();
        }

        let n_trades = poisson_sample(&mut self.rng, lambda);
        let mut trades = Vec::with_capacity(n_trades as usize);

        for _ in 0..n_trades {
            let idx = if self.rng.gen::<f64>() < hot_share {
                0
            } else {
                self.rng.gen_range(0..self.pairs.len())
            };
            let units = self.rng.gen_range(1..=max_lot.max(1));
            let signed = if self.rng.gen::<f64>() < sell_bias {
                -i64::from(units)
            } else {
                i64::from(units)
            };

            trades.push((self.pairs[idx].clone(), signed));
            self.trade_count += 1;
            self.units_traded += u64::from(units);
        }

        trades
    }
}

/// Knuth for small lambda, normal approximation above 30.
fn poisson_sample(rng: &mut ChaCha8Rng, lambda: f64) -> u32 {
    if lambda < 30.0 {
        let l = (-lambda).exp();
        let mut k: u32 = 0;
        let mut p: f64 = 1.0;
        loop {
            k += 1;
            p *= rng.gen::<f64>();
            if p <= l {
                return k - 1;
            }
        }
    } else {
        let u1: f64 = rng.gen::<f64>().max(f64::MIN_POSITIVE);
        let u2: f64 = rng.gen();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        (lambda + lambda.sqrt() * z).round().max(0.0) as u32
    }
}
