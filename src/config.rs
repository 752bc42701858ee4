// Copyright © 2026 Hypermesh Foundation. All rights reserved.
// Licensed under the Business Source License 1.1.
// See the LICENSE file in the repository root for full license text.

//! Market engine configuration and fixed model constants.
//!
//! The three tunables (pass cadence, volatility, saturation threshold) can be
//! overridden at construction. Everything else in the pricing model is a
//! named constant below.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

// -- Model constants -------------------------------------------------------

/// Fraction of raw saturation lost per elapsed day.
pub const DECAY_PER_DAY: f64 = 0.05;
/// Saturation never decays below this fraction of raw volume.
pub const DECAY_FLOOR: f64 = 0.5;
/// Price dampening per 100 units of saturation above the threshold.
pub const DAMPENING_SLOPE: f64 = 0.3;
/// Lower price clamp as a multiple of base price.
pub const PRICE_FLOOR_MULTIPLE: Decimal = dec!(0.5);
/// Upper price clamp as a multiple of base price.
pub const PRICE_CEILING_MULTIPLE: Decimal = dec!(2.0);
/// Share of stock kept when saturation effects apply.
pub const STOCK_RETENTION: Decimal = dec!(0.7);
/// Markup applied to the current price when saturation effects apply.
pub const SATURATION_MARKUP: Decimal = dec!(1.1);
/// Maximum number of market news lines.
pub const NEWS_LIMIT: usize = 5;
/// Saturation above `threshold * SOARING_MULTIPLE` reports a shortage.
pub const SOARING_MULTIPLE: f64 = 1.5;
/// Saturation below `threshold * PLUMMETING_MULTIPLE` reports an oversupply.
pub const PLUMMETING_MULTIPLE: f64 = 0.5;

pub const MILLIS_PER_DAY: f64 = 86_400_000.0;

pub const DEFAULT_STORAGE_KEY: &str = "marketSupplyDemand";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("update interval must be at least one game minute")]
    ZeroInterval,

    #[error("volatility factor must be finite and in [0, 2), got {0}")]
    Volatility(f64),

    #[error("saturation threshold must be finite and non-negative, got {0}")]
    Threshold(f64),

    #[error("storage key must not be empty")]
    EmptyStorageKey,

    #[error("malformed market config: {0}")]
    Parse(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// MarketConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MarketConfig {
    /// Game minutes between recomputation passes.
    pub update_interval_minutes: u32,
    /// Full width of the uniform price noise; each draw lies in `±factor/2`.
    pub volatility_factor: f64,
    /// Saturation level above which prices are dampened.
    pub saturation_threshold: f64,
    /// Durable-store key holding the saturation table.
    pub storage_key: String,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            update_interval_minutes: 5,
            volatility_factor: 0.10,
            saturation_threshold: 10.0,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
        }
    }
}

impl MarketConfig {
    /// Parse a (possibly partial) JSON document and validate it.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.update_interval_minutes == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        if !self.volatility_factor.is_finite()
            || !(0.0..2.0).contains(&self.volatility_factor)
        {
            return Err(ConfigError::Volatility(self.volatility_factor));
        }
        if !self.saturation_threshold.is_finite() || self.saturation_threshold < 0.0 {
            return Err(ConfigError::Threshold(self.saturation_threshold));
        }
        if self.storage_key.is_empty() {
            return Err(ConfigError::EmptyStorageKey);
        }
        Ok(())
    }

    /// Half-width of the volatility draw.
    pub fn volatility_half_width(&self) -> f64 {
        self.volatility_factor / 2.0
    }
}
