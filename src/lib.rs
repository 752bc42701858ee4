// Copyright © 2026 Hypermesh Foundation. All rights reserved.
// Market Pricing Engine ("The Bazaar")

pub mod types;
pub mod config;
pub mod adapter;
pub mod clock;
pub mod saturation;
pub mod pricing;
pub mod locations;
pub mod catalog;
pub mod events;
pub mod notify;
pub mod persistence;
pub mod scheduler;
pub mod news;
pub mod engine;

pub use types::*;
pub use config::{ConfigError, MarketConfig};
pub use engine::{MarketEngine, PassSummary};
pub use locations::{Location, LocationRegistry, MarketPriceEntry};
pub use catalog::{ItemCatalog, ReputationCatalog, StaticCatalog};
pub use events::{EventFeed, MarketEvent};
pub use persistence::{KeyResolver, KeyValueStore, MemoryStore, StoreError, SupplyDemandData};
pub use saturation::{LedgerError, SaturationLedger, SaturationRecord};
pub use scheduler::{GameStatus, MarketTicker, SimulationStatus};

use wasm_bindgen::prelude::*;

use crate::clock::SystemClock;
use crate::notify::NotificationSink;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = console)]
    fn log(s: &str);
}

#[cfg(target_arch = "wasm32")]
struct ConsoleSink;

#[cfg(target_arch = "wasm32")]
impl NotificationSink for ConsoleSink {
    fn post(&self, text: &str) {
        log(text);
    }
}

#[cfg(target_arch = "wasm32")]
fn platform_store() -> Box<dyn KeyValueStore> {
    Box::new(persistence::LocalStorageStore)
}

#[cfg(not(target_arch = "wasm32"))]
fn platform_store() -> Box<dyn KeyValueStore> {
    Box::new(MemoryStore::new())
}

#[cfg(target_arch = "wasm32")]
fn platform_sink() -> impl NotificationSink {
    ConsoleSink
}

#[cfg(not(target_arch = "wasm32"))]
fn platform_sink() -> impl NotificationSink {
    notify::TracingSink
}

// ─── WASM Interface ──────────────────────────────────────────────────────────

/// Browser-facing market: one engine plus the world state it prices.
#[wasm_bindgen]
pub struct WasmMarket {
    engine: MarketEngine,
    locations: LocationRegistry,
    catalog: StaticCatalog,
    status: SimulationStatus,
    ticker: MarketTicker,
    events: Vec<MarketEvent>,
    // False until the saved table has been resolved against the registered
    // locations. Nothing is written back before that.
    restored: bool,
}

impl WasmMarket {
    pub fn from_config(config: MarketConfig) -> Result<Self, ConfigError> {
        Self::with_store(config, platform_store())
    }

    /// Build over `store` and load whatever it already holds.
    pub fn with_store(config: MarketConfig, store: Box<dyn KeyValueStore>) -> Result<Self, ConfigError> {
        let ticker = MarketTicker::new(config.update_interval_minutes);
        let locations = LocationRegistry::new();
        let engine = MarketEngine::open(config, store, Box::new(SystemClock), &locations)?;
        Ok(Self {
            engine,
            locations,
            catalog: StaticCatalog::new(),
            status: SimulationStatus::default(),
            ticker,
            events: Vec::new(),
            restored: false,
        })
    }

    pub fn engine(&self) -> &MarketEngine {
        &self.engine
    }

    pub fn locations(&self) -> &LocationRegistry {
        &self.locations
    }
}

#[wasm_bindgen]
impl WasmMarket {
    /// `config` may be `undefined` for defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<WasmMarket, JsError> {
        #[cfg(target_arch = "wasm32")]
        std::panic::set_hook(Box::new(console_error_panic_hook::hook));

        let config = if config.is_undefined() || config.is_null() {
            MarketConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)?
        };
        Ok(Self::from_config(config)?)
    }

    pub fn add_location(&mut self, id: &str, name: &str) {
        self.locations.insert_location(id, name);
    }

    pub fn add_item(&mut self, id: &str, name: &str, base_price: f64) {
        self.catalog.insert(id, name, base_price);
    }

    /// Returns false when the location is unknown.
    pub fn set_market_entry(&mut self, location: &str, item: &str, price: u32, stock: u32) -> bool {
        match self.locations.get_mut(&location.into()) {
            Some(loc) => {
                loc.set_entry(item, MarketPriceEntry::new(price, stock));
                true
            }
            None => false,
        }
    }

    pub fn set_running(&mut self, running: bool) {
        self.status.running = running;
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.status.paused = paused;
    }

    pub fn set_events(&mut self, events: JsValue) -> Result<(), JsError> {
        self.events = serde_wasm_bindgen::from_value(events)?;
        Ok(())
    }

    /// Reload the saved table against the registered locations.
    ///
    /// The table is already loaded at construction and reloaded before the
    /// first trade, so calling this is only needed to re-resolve ids earlier.
    pub fn restore(&mut self) {
        self.engine.restore(&self.locations);
        self.restored = true;
    }

    pub fn record_transaction(&mut self, location: &str, item: &str, quantity: i32) -> Result<(), JsError> {
        if !self.restored {
            self.restore();
        }
        self.engine
            .record_transaction(&location.into(), &item.into(), i64::from(quantity))?;
        Ok(())
    }

    pub fn saturation(&self, location: &str, item: &str) -> f64 {
        self.engine.saturation(&location.into(), &item.into())
    }

    /// Advance game time; returns the number of passes that ran.
    pub fn tick(&mut self, game_minutes: u32) -> u32 {
        self.engine
            .advance(&mut self.ticker, game_minutes, &self.status, &mut self.locations, &self.catalog)
            .passes
    }

    /// One immediate pass; returns the number of repriced entries.
    pub fn recompute_prices(&mut self) -> u32 {
        self.engine
            .recompute_prices(&self.status, &mut self.locations, &self.catalog)
            .repriced
    }

    pub fn apply_saturation_effects(&mut self, location: &str, item: &str) -> bool {
        self.engine
            .apply_saturation_effects(&mut self.locations, &location.into(), &item.into())
    }

    /// Keys (`location/item`) that crossed the threshold since the last call.
    pub fn apply_saturation_crossings(&mut self) -> Vec<String> {
        self.engine
            .apply_saturation_crossings(&mut self.locations)
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    pub fn market_news(&self) -> Vec<String> {
        self.engine.market_news(&self.locations, &self.events)
    }

    pub fn entry(&self, location: &str, item: &str) -> JsValue {
        let key = SaturationKey::new(location, item);
        match self.locations.entry(&key) {
            Some(e) => serde_wasm_bindgen::to_value(e).unwrap_or_else(|err| {
                tracing::warn!(error = %err, %key, "failed to serialize market entry");
                JsValue::NULL
            }),
            None => JsValue::NULL,
        }
    }

    /// Saturation table as the JSON save blob.
    pub fn export_supply_demand(&self) -> Result<String, JsError> {
        Ok(serde_json::to_string(&self.engine.supply_demand_data())?)
    }

    pub fn import_supply_demand(&mut self, json: &str) -> Result<(), JsError> {
        let data: SupplyDemandData = serde_json::from_str(json)?;
        self.engine.load_supply_demand_data(&data, &self.locations);
        self.restored = true;
        Ok(())
    }

    pub fn reset(&mut self) {
        self.engine.reset_market_saturation(&platform_sink());
        self.restored = true;
    }

    /// Stop scheduled passes for good.
    pub fn stop(&mut self) {
        self.ticker.cancel();
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;

    fn market() -> WasmMarket {
        let config = MarketConfig { volatility_factor: 0.0, ..MarketConfig::default() };
        let mut m = WasmMarket::from_config(config).expect("test: config");
        m.add_location("riverdale", "Riverdale");
        m.add_item("wheat", "Wheat", 100.0);
        assert!(m.set_market_entry("riverdale", "wheat", 100, 40));
        m
    }

    #[test]
    fn tick_is_gated_until_running() {
        let mut m = market();
        assert_eq!(m.tick(10), 0);
        m.set_running(true);
        assert_eq!(m.tick(10), 2);
        m.set_paused(true);
        assert_eq!(m.tick(10), 0);
    }

    #[test]
    fn stop_cancels_future_passes() {
        let mut m = market();
        m.set_running(true);
        m.stop();
        assert_eq!(m.tick(60), 0);
    }

    #[test]
    fn saturated_item_reprices_lower() {
        let mut m = market();
        m.set_running(true);
        m.record_transaction("riverdale", "wheat", 20).expect("test: record");
        assert_eq!(m.recompute_prices(), 1);
        let price = m.locations().entry(&SaturationKey::new("riverdale", "wheat")).map(|e| e.price);
        assert_eq!(price, Some(97));
    }

    #[test]
    fn unknown_location_entry_is_refused() {
        let mut m = market();
        assert!(!m.set_market_entry("atlantis", "wheat", 1, 1));
    }

    #[test]
    fn export_import_round_trips_through_json() {
        let mut m = market();
        m.record_transaction("riverdale", "wheat", -6).expect("test: record");
        let blob = m.export_supply_demand().expect("test: export");
        m.reset();
        assert_eq!(m.saturation("riverdale", "wheat"), 0.0);
        m.import_supply_demand(&blob).expect("test: import");
        assert!((m.saturation("riverdale", "wheat") - 6.0).abs() < 1e-6);
    }

    #[test]
    fn trading_before_restore_keeps_saved_history() {
        let config = MarketConfig::default();
        let mut store = MemoryStore::new();
        let saved = r#"{"iron_hold_iron_ore":{"buyVolume":40,"sellVolume":0,"lastUpdate":0}}"#;
        store.set(&config.storage_key, saved).expect("test: seed");

        let mut m = WasmMarket::with_store(config, Box::new(store)).expect("test: config");
        m.add_location("iron_hold", "Iron Hold");
        m.record_transaction("iron_hold", "ale", 1).expect("test: record");

        let ore = m.engine().record(&"iron_hold".into(), &"iron_ore".into()).map(|r| r.buy_volume);
        assert_eq!(ore, Some(40));
        assert_eq!(m.engine().ledger().len(), 2);
        let storage_key = m.engine().config().storage_key.clone();
        let blob = m.engine().store().get(&storage_key).expect("test: get").expect("test: blob");
        assert!(blob.contains("\"iron_hold_iron_ore\""));
        assert!(blob.contains("\"iron_hold_ale\""));
    }

    #[test]
    fn saved_table_is_readable_before_any_trade() {
        let config = MarketConfig::default();
        let mut store = MemoryStore::new();
        let saved = r#"{"riverdale_wheat":{"buyVolume":0,"sellVolume":9,"lastUpdate":0}}"#;
        store.set(&config.storage_key, saved).expect("test: seed");

        let m = WasmMarket::with_store(config, Box::new(store)).expect("test: config");
        let wheat = m.engine().record(&"riverdale".into(), &"wheat".into()).map(|r| r.sell_volume);
        assert_eq!(wheat, Some(9));
    }

    #[test]
    fn crossings_report_display_keys() {
        let mut m = market();
        m.record_transaction("riverdale", "wheat", 11).expect("test: record");
        assert_eq!(m.apply_saturation_crossings(), vec!["riverdale/wheat"]);
    }
}
