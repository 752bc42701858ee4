// Copyright © 2026 Hypermesh Foundation. All rights reserved.
// Licensed under the Business Source License 1.1.
// See the LICENSE file in the repository root for full license text.

//! Saturation ledger: cumulative trade volume per (location, item).
//!
//! Volumes only grow. Saturation is the total volume scaled by a linear
//! decay on elapsed days since the last trade:
//!
//! ```text
//! saturation = (buy + sell) * max(0.5, 1 - elapsed_days * 0.05)
//! ```
//!
//! The 0.5 floor keeps a residual market memory for long-idle goods.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::{DECAY_FLOOR, DECAY_PER_DAY, MILLIS_PER_DAY};
use crate::types::{SaturationKey, TradeSide};

/// Errors raised when recording trades.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("trade quantity must be non-zero")]
    ZeroQuantity,
}

// ---------------------------------------------------------------------------
// SaturationRecord
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaturationRecord {
    pub buy_volume: u64,
    pub sell_volume: u64,
    /// Milliseconds since the Unix epoch of the last recorded trade.
    pub last_update_ms: u64,
}

impl SaturationRecord {
    pub fn total_volume(&self) -> u64 {
        self.buy_volume.saturating_add(self.sell_volume)
    }

    /// Add `units` to the side's volume and stamp the record.
    pub fn record(&mut self, side: TradeSide, units: u64, now_ms: u64) {
        match side {
            TradeSide::Buy => self.buy_volume = self.buy_volume.saturating_add(units),
            TradeSide::Sell => self.sell_volume = self.sell_volume.saturating_add(units),
        }
        self.last_update_ms = now_ms;
    }

    /// Decayed saturation as seen at `now_ms`.
    pub fn saturation_at(&self, now_ms: u64) -> f64 {
        let days = elapsed_days(self.last_update_ms, now_ms);
        self.total_volume() as f64 * decay_factor(days)
    }
}

/// Fractional days between two timestamps. A `since` in the future counts
/// as zero elapsed time.
pub fn elapsed_days(since_ms: u64, now_ms: u64) -> f64 {
    now_ms.saturating_sub(since_ms) as f64 / MILLIS_PER_DAY
}

/// Linear decay, 5% per day, floored at one half.
pub fn decay_factor(elapsed_days: f64) -> f64 {
    (1.0 - elapsed_days.max(0.0) * DECAY_PER_DAY).max(DECAY_FLOOR)
}

// ---------------------------------------------------------------------------
// SaturationLedger
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SaturationLedger {
    records: HashMap<SaturationKey, SaturationRecord>,
}

impl SaturationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get-or-insert the pair's record and add the trade to it.
    pub fn record(
        &mut self,
        key: SaturationKey,
        side: TradeSide,
        units: u64,
        now_ms: u64,
    ) -> &SaturationRecord {
        let record = self.records.entry(key).or_default();
        record.record(side, units, now_ms);
        record
    }

    pub fn get(&self, key: &SaturationKey) -> Option<&SaturationRecord> {
        self.records.get(key)
    }

    /// Decayed saturation for the pair; 0 when nothing was ever traded.
    pub fn saturation(&self, key: &SaturationKey, now_ms: u64) -> f64 {
        self.records
            .get(key)
            .map(|r| r.saturation_at(now_ms))
            .unwrap_or(0.0)
    }

    /// Replace (or create) a record verbatim. Used by save import.
    pub fn insert(&mut self, key: SaturationKey, record: SaturationRecord) {
        self.records.insert(key, record);
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SaturationKey, &SaturationRecord)> {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: u64 = 86_400_000;

    fn key() -> SaturationKey {
        SaturationKey::new("riverdale", "wheat")
    }

    #[test]
    fn decay_factor_linear_then_floored() {
        assert_eq!(decay_factor(0.0), 1.0);
        assert!((decay_factor(2.0) - 0.9).abs() < 1e-12);
        assert!((decay_factor(10.0) - 0.5).abs() < 1e-12);
        assert_eq!(decay_factor(365.0), 0.5);
    }

    #[test]
    fn negative_elapsed_does_not_inflate() {
        assert_eq!(decay_factor(-4.0), 1.0);
        assert_eq!(elapsed_days(2 * DAY, DAY), 0.0);
    }

    #[test]
    fn record_accumulates_per_side() {
        let mut ledger = SaturationLedger::new();
        ledger.record(key(), TradeSide::Buy, 5, 10);
        let r = *ledger.record(key(), TradeSide::Sell, 3, 20);
        assert_eq!(r.buy_volume, 5);
        assert_eq!(r.sell_volume, 3);
        assert_eq!(r.last_update_ms, 20);
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn saturation_decays_from_last_trade() {
        let mut ledger = SaturationLedger::new();
        ledger.record(key(), TradeSide::Buy, 20, 0);
        assert_eq!(ledger.saturation(&key(), 0), 20.0);
        assert!((ledger.saturation(&key(), 4 * DAY) - 16.0).abs() < 1e-9);
        assert_eq!(ledger.saturation(&key(), 100 * DAY), 10.0);
    }

    #[test]
    fn new_trade_resets_decay_clock() {
        let mut ledger = SaturationLedger::new();
        ledger.record(key(), TradeSide::Buy, 10, 0);
        ledger.record(key(), TradeSide::Sell, 10, 20 * DAY);
        assert_eq!(ledger.saturation(&key(), 20 * DAY), 20.0);
    }

    #[test]
    fn unknown_pair_is_zero() {
        let ledger = SaturationLedger::new();
        assert_eq!(ledger.saturation(&key(), 0), 0.0);
        assert!(ledger.get(&key()).is_none());
    }

    #[test]
    fn clear_drops_everything() {
        let mut ledger = SaturationLedger::new();
        ledger.record(key(), TradeSide::Buy, 1, 0);
        ledger.clear();
        assert!(ledger.is_empty());
    }
}
