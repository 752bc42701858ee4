// Copyright © 2026 Hypermesh Foundation. All rights reserved.
// Licensed under the Business Source License 1.1.
// See the LICENSE file in the repository root for full license text.

//! Identifiers shared across the market engine.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// LocationId
// ---------------------------------------------------------------------------

/// Town, village or trading post identifier (e.g. `"riverdale"`).
#[derive(Debug, Clone, Hash, Eq, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationId(pub String);

impl LocationId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for LocationId {
    fn from(s: String) -> Self { LocationId(s) }
}

impl From<&str> for LocationId {
    fn from(s: &str) -> Self { LocationId(s.to_string()) }
}

// ---------------------------------------------------------------------------
// ItemId
// ---------------------------------------------------------------------------

/// Tradable good identifier (e.g. `"wheat"`, `"iron_ore"`).
#[derive(Debug, Clone, Hash, Eq, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub String);

impl ItemId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ItemId {
    fn from(s: String) -> Self { ItemId(s) }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self { ItemId(s.to_string()) }
}

// ---------------------------------------------------------------------------
// SaturationKey
// ---------------------------------------------------------------------------

/// Composite key of the saturation ledger: one (location, item) pair.
#[derive(Debug, Clone, Hash, Eq, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SaturationKey {
    pub location: LocationId,
    pub item: ItemId,
}

impl SaturationKey {
    pub fn new(location: impl Into<LocationId>, item: impl Into<ItemId>) -> Self {
        Self { location: location.into(), item: item.into() }
    }
}

impl fmt::Display for SaturationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.location, self.item)
    }
}

// ---------------------------------------------------------------------------
// TradeSide
// ---------------------------------------------------------------------------

/// Direction of a player trade as seen by the market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeSide {
    /// Player bought from the market: demand pressure.
    Buy,
    /// Player sold to the market: supply pressure.
    Sell,
}

impl TradeSide {
    /// Classify a signed quantity. Zero has no side.
    pub fn from_signed(quantity: i64) -> Option<Self> {
        match quantity.signum() {
            1 => Some(Self::Buy),
            -1 => Some(Self::Sell),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trade_side_from_sign() {
        assert_eq!(TradeSide::from_signed(5), Some(TradeSide::Buy));
        assert_eq!(TradeSide::from_signed(-3), Some(TradeSide::Sell));
        assert_eq!(TradeSide::from_signed(0), None);
    }

    #[test]
    fn ids_serialize_as_plain_strings() {
        let json = serde_json::to_string(&LocationId::from("riverdale"))
            .expect("test: serialize location id");
        assert_eq!(json, "\"riverdale\"");
    }

    #[test]
    fn key_display() {
        let key = SaturationKey::new("riverdale", "wheat");
        assert_eq!(key.to_string(), "riverdale/wheat");
    }
}
