// Copyright © 2026 Hypermesh Foundation. All rights reserved.
// Licensed under the Business Source License 1.1.
// See the LICENSE file in the repository root for full license text.

//! Durable storage of the saturation table.
//!
//! The persisted blob keeps the save format the browser game already writes:
//!
//! ```text
//! { "<locationId>_<itemId>": { "buyVolume": u64, "sellVolume": u64, "lastUpdate": ms } }
//! ```
//!
//! In memory the key is a [`SaturationKey`]; the string form only exists
//! here. Ids may themselves contain underscores, so decoding resolves the
//! split against known pairs and locations (see [`KeyResolver`]).

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::locations::LocationRegistry;
use crate::saturation::{SaturationLedger, SaturationRecord};
use crate::types::SaturationKey;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("storage i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt saturation blob: {0}")]
    Corrupt(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// KeyValueStore
// ---------------------------------------------------------------------------

/// String blobs under string keys (browser `localStorage` semantics).
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// One `<key>.json` file per key inside a directory.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: std::path::PathBuf,
}

#[cfg(not(target_arch = "wasm32"))]
impl FileStore {
    pub fn new(dir: impl Into<std::path::PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> std::path::PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(self.path_for(key), value)?;
        Ok(())
    }
}

/// `window.localStorage`.
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStorageStore;

#[cfg(target_arch = "wasm32")]
impl LocalStorageStore {
    fn storage() -> Result<web_sys::Storage, StoreError> {
        let window = web_sys::window()
            .ok_or_else(|| StoreError::Unavailable("no window".to_string()))?;
        window
            .local_storage()
            .map_err(|e| StoreError::Unavailable(format!("{e:?}")))?
            .ok_or_else(|| StoreError::Unavailable("localStorage disabled".to_string()))
    }
}

#[cfg(target_arch = "wasm32")]
impl KeyValueStore for LocalStorageStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Self::storage()?
            .get_item(key)
            .map_err(|e| StoreError::Unavailable(format!("{e:?}")))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        Self::storage()?
            .set_item(key, value)
            .map_err(|e| StoreError::Unavailable(format!("{e:?}")))
    }
}

// ---------------------------------------------------------------------------
// Legacy blob
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyRecord {
    pub buy_volume: u64,
    pub sell_volume: u64,
    pub last_update: u64,
}

impl From<&SaturationRecord> for LegacyRecord {
    fn from(r: &SaturationRecord) -> Self {
        Self {
            buy_volume: r.buy_volume,
            sell_volume: r.sell_volume,
            last_update: r.last_update_ms,
        }
    }
}

impl From<LegacyRecord> for SaturationRecord {
    fn from(r: LegacyRecord) -> Self {
        Self {
            buy_volume: r.buy_volume,
            sell_volume: r.sell_volume,
            last_update_ms: r.last_update,
        }
    }
}

/// Exported saturation table, exactly as written to durable storage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SupplyDemandData(pub BTreeMap<String, LegacyRecord>);

impl SupplyDemandData {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

pub fn legacy_key(key: &SaturationKey) -> String {
    format!("{}_{}", key.location, key.item)
}

/// Turns `"<location>_<item>"` strings back into keys.
///
/// Ids may contain underscores, so a raw key is tried against, in order:
/// the known `(location, item)` pairs, the longest known location prefix,
/// and finally the first underscore. Empty halves are rejected.
#[derive(Debug, Clone, Default)]
pub struct KeyResolver {
    pairs: HashMap<String, SaturationKey>,
    locations: HashSet<String>,
}

impl KeyResolver {
    /// Knows every registered location and every priced pair.
    pub fn new(locations: &LocationRegistry) -> Self {
        let mut resolver = Self::default();
        for location in locations.iter() {
            resolver.locations.insert(location.id.as_str().to_string());
        }
        resolver.with_keys(&locations.keys())
    }

    /// Add pairs known from elsewhere. Earlier pairs win on a clash.
    pub fn with_keys<'a>(mut self, keys: impl IntoIterator<Item = &'a SaturationKey>) -> Self {
        for key in keys {
            self.locations.insert(key.location.as_str().to_string());
            self.pairs.entry(legacy_key(key)).or_insert_with(|| key.clone());
        }
        self
    }

    pub fn resolve(&self, raw: &str) -> Option<SaturationKey> {
        if let Some(key) = self.pairs.get(raw) {
            return Some(key.clone());
        }
        let split = |idx: usize| {
            let (loc, item) = (&raw[..idx], &raw[idx + 1..]);
            (!loc.is_empty() && !item.is_empty()).then(|| SaturationKey::new(loc, item))
        };
        // Right to left, so the first hit is the longest prefix.
        raw.rmatch_indices('_')
            .map(|(idx, _)| idx)
            .find(|&idx| idx + 1 < raw.len() && self.locations.contains(&raw[..idx]))
            .or_else(|| raw.find('_'))
            .and_then(split)
    }
}

/// Flatten the ledger into save form.
///
/// Distinct keys can share a string form (`a`/`b_c` and `a_b`/`c`). The
/// smallest key keeps the slot and every other one is logged and left out.
pub fn encode(ledger: &SaturationLedger) -> SupplyDemandData {
    let mut records: Vec<_> = ledger.iter().collect();
    records.sort_by(|a, b| a.0.cmp(b.0));

    let mut owners: HashMap<String, &SaturationKey> = HashMap::with_capacity(records.len());
    let mut table = BTreeMap::new();
    for (key, record) in records {
        let raw = legacy_key(key);
        if let Some(owner) = owners.get(&raw) {
            tracing::warn!(
                %key, kept = %owner, blob_key = %raw,
                "saturation key collides in save format, record not exported"
            );
            continue;
        }
        owners.insert(raw.clone(), key);
        table.insert(raw, LegacyRecord::from(record));
    }
    SupplyDemandData(table)
}

/// Rebuild a ledger from an exported table. Undecodable keys are dropped.
pub fn decode(data: &SupplyDemandData, resolver: &KeyResolver) -> SaturationLedger {
    let mut ledger = SaturationLedger::new();
    for (raw, record) in &data.0 {
        match resolver.resolve(raw) {
            Some(key) => ledger.insert(key, SaturationRecord::from(*record)),
            None => tracing::warn!(key = %raw, "dropping undecodable saturation key"),
        }
    }
    ledger
}

pub fn save_table(
    store: &mut dyn KeyValueStore,
    storage_key: &str,
    ledger: &SaturationLedger,
) -> Result<(), StoreError> {
    let json = serde_json::to_string(&encode(ledger))?;
    store.set(storage_key, &json)
}

/// Read the table; an absent key is an empty table.
pub fn load_table(
    store: &dyn KeyValueStore,
    storage_key: &str,
    resolver: &KeyResolver,
) -> Result<SaturationLedger, StoreError> {
    match store.get(storage_key)? {
        Some(json) => {
            let data: SupplyDemandData = serde_json::from_str(&json)?;
            Ok(decode(&data, resolver))
        }
        None => Ok(SaturationLedger::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locations::MarketPriceEntry;
    use crate::types::TradeSide;

    fn registry() -> LocationRegistry {
        let mut reg = LocationRegistry::new();
        reg.insert_location("riverdale", "Riverdale");
        reg.insert_location("iron_hold", "Iron Hold");
        reg
    }

    fn resolver() -> KeyResolver {
        KeyResolver::new(&registry())
    }

    #[test]
    fn legacy_key_resolves_known_location_with_underscore() {
        let key = resolver().resolve("iron_hold_iron_ore").expect("test: key should parse");
        assert_eq!(key, SaturationKey::new("iron_hold", "iron_ore"));
    }

    #[test]
    fn longest_registered_location_wins() {
        let mut reg = LocationRegistry::new();
        reg.insert_location("north", "North");
        reg.insert_location("north_gate", "North Gate");
        let key = KeyResolver::new(&reg).resolve("north_gate_ale").expect("test: key should parse");
        assert_eq!(key, SaturationKey::new("north_gate", "ale"));
    }

    #[test]
    fn priced_pair_beats_location_prefix() {
        let mut reg = LocationRegistry::new();
        reg.insert_location("north", "North").set_entry("gate_ale", MarketPriceEntry::new(4, 4));
        reg.insert_location("north_gate", "North Gate");
        let key = KeyResolver::new(&reg).resolve("north_gate_ale").expect("test: key should parse");
        assert_eq!(key, SaturationKey::new("north", "gate_ale"));
    }

    #[test]
    fn extra_keys_resolve_unregistered_locations() {
        let known = SaturationKey::new("ghost_town", "salt");
        let resolver = KeyResolver::default().with_keys([&known]);
        assert_eq!(resolver.resolve("ghost_town_salt"), Some(known));
        assert_eq!(resolver.resolve("ghost_town_ale"), Some(SaturationKey::new("ghost_town", "ale")));
    }

    #[test]
    fn legacy_key_falls_back_to_first_underscore() {
        let key = KeyResolver::default().resolve("ghost_town_salt").expect("test: key should parse");
        assert_eq!(key, SaturationKey::new("ghost", "town_salt"));
    }

    #[test]
    fn legacy_key_rejects_malformed() {
        let r = resolver();
        assert!(r.resolve("wheat").is_none());
        assert!(r.resolve("_wheat").is_none());
        assert!(r.resolve("riverdale_").is_none());
    }

    #[test]
    fn colliding_keys_keep_the_smallest() {
        let mut ledger = SaturationLedger::new();
        ledger.record(SaturationKey::new("a_b", "c"), TradeSide::Buy, 9, 0);
        ledger.record(SaturationKey::new("a", "b_c"), TradeSide::Buy, 2, 0);
        let data = encode(&ledger);
        assert_eq!(data.len(), 1);
        assert_eq!(data.0.get("a_b_c").map(|r| r.buy_volume), Some(2));
    }

    #[test]
    fn blob_matches_save_format() {
        let mut ledger = SaturationLedger::new();
        ledger.record(SaturationKey::new("riverdale", "wheat"), TradeSide::Buy, 5, 1_700_000_000_000);
        let json = serde_json::to_string(&encode(&ledger)).expect("test: encode");
        assert_eq!(
            json,
            r#"{"riverdale_wheat":{"buyVolume":5,"sellVolume":0,"lastUpdate":1700000000000}}"#
        );
    }

    #[test]
    fn save_then_load_restores_ledger() {
        let reg = registry();
        let mut ledger = SaturationLedger::new();
        ledger.record(SaturationKey::new("iron_hold", "iron_ore"), TradeSide::Sell, 7, 42);
        ledger.record(SaturationKey::new("riverdale", "wheat"), TradeSide::Buy, 3, 43);

        let mut store = MemoryStore::new();
        save_table(&mut store, "k", &ledger).expect("test: save");
        let loaded = load_table(&store, "k", &KeyResolver::new(&reg)).expect("test: load");
        assert_eq!(loaded, ledger);
    }

    #[test]
    fn missing_key_loads_empty_and_garbage_is_corrupt() {
        let reg = resolver();
        let mut store = MemoryStore::new();
        assert!(load_table(&store, "k", &reg).expect("test: load").is_empty());

        store.set("k", "{\"riverdale_wheat\": 12").expect("test: set");
        let err = load_table(&store, "k", &reg).expect_err("test: corrupt blob");
        assert!(matches!(err, StoreError::Corrupt(_)), "got: {err}");
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn file_store_round_trip() {
        let dir = std::env::temp_dir().join(format!("market-engine-store-{}", std::process::id()));
        let mut store = FileStore::new(&dir);
        assert_eq!(store.get("absent").expect("test: get"), None);
        store.set("k", "{}").expect("test: set");
        assert_eq!(store.get("k").expect("test: get").as_deref(), Some("{}"));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
