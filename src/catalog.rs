//! Item catalog: reference prices for tradable goods.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::types::{ItemId, LocationId};

/// Source of base prices.
///
/// `location` lets wrappers apply per-town adjustments (reputation
/// discounts); plain catalogs ignore it. `None` means the item is unknown
/// and the pair is skipped for this pass.
pub trait ItemCatalog {
    fn base_price(&self, location: &LocationId, item: &ItemId) -> Option<f64>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub name: String,
    pub base_price: f64,
}

/// Fixed catalog keyed by item id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StaticCatalog {
    items: BTreeMap<ItemId, CatalogItem>,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<ItemId>, name: impl Into<String>, base_price: f64) {
        self.items.insert(id.into(), CatalogItem { name: name.into(), base_price });
    }

    /// Builder-style insert.
    pub fn with_item(mut self, id: impl Into<ItemId>, name: impl Into<String>, base_price: f64) -> Self {
        self.insert(id, name, base_price);
        self
    }

    pub fn remove(&mut self, id: &ItemId) -> Option<CatalogItem> {
        self.items.remove(id)
    }

    pub fn get(&self, id: &ItemId) -> Option<&CatalogItem> {
        self.items.get(id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl ItemCatalog for StaticCatalog {
    fn base_price(&self, _location: &LocationId, item: &ItemId) -> Option<f64> {
        self.items
            .get(item)
            .map(|i| i.base_price)
            .filter(|p| p.is_finite() && *p > 0.0)
    }
}

// -- Reputation ------------------------------------------------------------

pub const MIN_REPUTATION_MODIFIER: f64 = 0.5;
pub const MAX_REPUTATION_MODIFIER: f64 = 1.5;

/// Applies per-location reputation price modifiers on top of another
/// catalog. Modifiers are clamped to `[0.5, 1.5]`; unlisted towns use 1.0.
#[derive(Debug, Clone)]
pub struct ReputationCatalog<C> {
    inner: C,
    modifiers: HashMap<LocationId, f64>,
}

impl<C: ItemCatalog> ReputationCatalog<C> {
    pub fn new(inner: C) -> Self {
        Self { inner, modifiers: HashMap::new() }
    }

    pub fn set_modifier(&mut self, location: impl Into<LocationId>, modifier: f64) {
        let modifier = if modifier.is_finite() { modifier } else { 1.0 };
        self.modifiers.insert(
            location.into(),
            modifier.clamp(MIN_REPUTATION_MODIFIER, MAX_REPUTATION_MODIFIER),
        );
    }

    pub fn modifier(&self, location: &LocationId) -> f64 {
        self.modifiers.get(location).copied().unwrap_or(1.0)
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }
}

impl<C: ItemCatalog> ItemCatalog for ReputationCatalog<C> {
    fn base_price(&self, location: &LocationId, item: &ItemId) -> Option<f64> {
        self.inner
            .base_price(location, item)
            .map(|p| p * self.modifier(location))
    }
}
