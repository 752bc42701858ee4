//! Location registry: every town's market board of item prices and stock.
//!
//! Iteration follows insertion order for both locations and items; market
//! news relies on that ordering.

use serde::{Deserialize, Serialize};

use crate::types::{ItemId, LocationId, SaturationKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketPriceEntry {
    pub price: u32,
    pub stock: u32,
}

impl MarketPriceEntry {
    pub fn new(price: u32, stock: u32) -> Self {
        Self { price, stock }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub name: String,
    #[serde(default)]
    market: Vec<(ItemId, MarketPriceEntry)>,
}

impl Location {
    pub fn new(id: impl Into<LocationId>, name: impl Into<String>) -> Self {
        Self { id: id.into(), name: name.into(), market: Vec::new() }
    }

    /// Insert or replace an item's entry. A replaced item keeps its position.
    pub fn set_entry(&mut self, item: impl Into<ItemId>, entry: MarketPriceEntry) {
        let item = item.into();
        match self.market.iter_mut().find(|(id, _)| *id == item) {
            Some((_, existing)) => *existing = entry,
            None => self.market.push((item, entry)),
        }
    }

    pub fn entry(&self, item: &ItemId) -> Option<&MarketPriceEntry> {
        self.market.iter().find(|(id, _)| id == item).map(|(_, e)| e)
    }

    pub fn entry_mut(&mut self, item: &ItemId) -> Option<&mut MarketPriceEntry> {
        self.market.iter_mut().find(|(id, _)| id == item).map(|(_, e)| e)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&ItemId, &MarketPriceEntry)> {
        self.market.iter().map(|(id, e)| (id, e))
    }

    pub fn entries_mut(&mut self) -> impl Iterator<Item = (&ItemId, &mut MarketPriceEntry)> {
        self.market.iter_mut().map(|(id, e)| (&*id, e))
    }

    pub fn item_count(&self) -> usize {
        self.market.len()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationRegistry {
    locations: Vec<Location>,
}

impl LocationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a location, or rename it if the id already exists.
    pub fn insert_location(
        &mut self,
        id: impl Into<LocationId>,
        name: impl Into<String>,
    ) -> &mut Location {
        let id = id.into();
        let name = name.into();
        match self.locations.iter().position(|l| l.id == id) {
            Some(idx) => {
                let location = &mut self.locations[idx];
                location.name = name;
                location
            }
            None => {
                self.locations.push(Location::new(id, name));
                let last = self.locations.len() - 1;
                &mut self.locations[last]
            }
        }
    }

    pub fn get(&self, id: &LocationId) -> Option<&Location> {
        self.locations.iter().find(|l| &l.id == id)
    }

    pub fn get_mut(&mut self, id: &LocationId) -> Option<&mut Location> {
        self.locations.iter_mut().find(|l| &l.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.locations.iter().any(|l| l.id.as_str() == id)
    }

    /// Display name, if the location is known.
    pub fn display_name(&self, id: &LocationId) -> Option<&str> {
        self.get(id).map(|l| l.name.as_str())
    }

    pub fn entry(&self, key: &SaturationKey) -> Option<&MarketPriceEntry> {
        self.get(&key.location).and_then(|l| l.entry(&key.item))
    }

    pub fn entry_mut(&mut self, key: &SaturationKey) -> Option<&mut MarketPriceEntry> {
        self.get_mut(&key.location).and_then(|l| l.entry_mut(&key.item))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Location> {
        self.locations.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Location> {
        self.locations.iter_mut()
    }

    /// Every priced pair, in registry order.
    pub fn keys(&self) -> Vec<SaturationKey> {
        self.locations
            .iter()
            .flat_map(|l| {
                l.entries().map(move |(item, _)| SaturationKey {
                    location: l.id.clone(),
                    item: item.clone(),
                })
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}
