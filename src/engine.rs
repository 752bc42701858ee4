// Copyright © 2026 Hypermesh Foundation. All rights reserved.
// Licensed under the Business Source License 1.1.
// See the LICENSE file in the repository root for full license text.

//! Market Pricing Engine.
//!
//! Owns the saturation ledger and its durable copy. Everything else (the
//! location registry, the item catalog, game status, event feed and
//! notification sink) is passed in per call. One engine is built at startup
//! and handed to every caller that trades or reprices.

use std::collections::HashSet;
use std::ops::AddAssign;

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use crate::catalog::ItemCatalog;
use crate::clock::Clock;
use crate::config::{ConfigError, MarketConfig};
use crate::events::EventFeed;
use crate::locations::LocationRegistry;
use crate::news;
use crate::notify::NotificationSink;
use crate::persistence::{self, KeyResolver, KeyValueStore, SupplyDemandData};
use crate::pricing;
use crate::saturation::{LedgerError, SaturationLedger, SaturationRecord};
use crate::scheduler::{GameStatus, MarketTicker};
use crate::types::{ItemId, LocationId, SaturationKey, TradeSide};

pub const RESET_NOTICE: &str = "Market saturation has been reset. Prices will settle back to normal.";

/// Outcome of one or more recomputation passes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PassSummary {
    /// Passes that actually ran (gated passes are not counted).
    pub passes: u32,
    /// Price entries rewritten.
    pub repriced: u32,
    /// Entries skipped because the catalog did not know the item.
    pub skipped_unknown: u32,
}

impl AddAssign for PassSummary {
    fn add_assign(&mut self, rhs: Self) {
        self.passes += rhs.passes;
        self.repriced += rhs.repriced;
        self.skipped_unknown += rhs.skipped_unknown;
    }
}

pub struct MarketEngine {
    config: MarketConfig,
    ledger: SaturationLedger,
    store: Box<dyn KeyValueStore>,
    clock: Box<dyn Clock>,
    rng: Box<dyn RngCore>,
    // Pairs above threshold at the last crossing check. Not persisted.
    saturated: HashSet<SaturationKey>,
}

impl MarketEngine {
    /// Build an engine with an empty ledger and an entropy-seeded RNG.
    pub fn new(
        config: MarketConfig,
        store: Box<dyn KeyValueStore>,
        clock: Box<dyn Clock>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            ledger: SaturationLedger::new(),
            store,
            clock,
            rng: Box::new(ChaCha8Rng::from_entropy()),
            saturated: HashSet::new(),
        })
    }

    /// Build an engine and load the saved table.
    pub fn open(
        config: MarketConfig,
        store: Box<dyn KeyValueStore>,
        clock: Box<dyn Clock>,
        locations: &LocationRegistry,
    ) -> Result<Self, ConfigError> {
        let mut engine = Self::new(config, store, clock)?;
        engine.restore(locations);
        Ok(engine)
    }

    pub fn with_rng(mut self, rng: impl RngCore + 'static) -> Self {
        self.rng = Box::new(rng);
        self
    }

    pub fn with_seed(self, seed: u64) -> Self {
        self.with_rng(ChaCha8Rng::seed_from_u64(seed))
    }

    pub fn config(&self) -> &MarketConfig {
        &self.config
    }

    pub fn ledger(&self) -> &SaturationLedger {
        &self.ledger
    }

    pub fn store(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    // -- Saturation ledger -------------------------------------------------

    /// Record a player trade. Positive quantities are purchases, negative
    /// ones sales. The whole table is written through to the store.
    pub fn record_transaction(
        &mut self,
        location: &LocationId,
        item: &ItemId,
        signed_quantity: i64,
    ) -> Result<(), LedgerError> {
        let side = TradeSide::from_signed(signed_quantity).ok_or(LedgerError::ZeroQuantity)?;
        let now = self.clock.now_ms();
        let key = SaturationKey { location: location.clone(), item: item.clone() };
        let record = self.ledger.record(key, side, signed_quantity.unsigned_abs(), now);
        tracing::debug!(
            %location, %item, ?side,
            buy = record.buy_volume, sell = record.sell_volume,
            "trade recorded"
        );
        self.persist();
        Ok(())
    }

    /// Decayed saturation for the pair as of now; 0 if never traded.
    pub fn saturation(&self, location: &LocationId, item: &ItemId) -> f64 {
        let key = SaturationKey { location: location.clone(), item: item.clone() };
        self.ledger.saturation(&key, self.clock.now_ms())
    }

    pub fn record(&self, location: &LocationId, item: &ItemId) -> Option<&SaturationRecord> {
        let key = SaturationKey { location: location.clone(), item: item.clone() };
        self.ledger.get(&key)
    }

    // -- Price passes ------------------------------------------------------

    /// One full sweep over every priced pair. No-op unless the game is
    /// running and not paused.
    pub fn recompute_prices(
        &mut self,
        status: &dyn GameStatus,
        locations: &mut LocationRegistry,
        catalog: &dyn ItemCatalog,
    ) -> PassSummary {
        let mut summary = PassSummary::default();
        if !status.allows_market_updates() {
            return summary;
        }
        summary.passes = 1;

        let now = self.clock.now_ms();
        let threshold = self.config.saturation_threshold;
        let half_width = self.config.volatility_half_width();

        for location in locations.iter_mut() {
            let location_id = location.id.clone();
            for (item, entry) in location.entries_mut() {
                let base = catalog
                    .base_price(&location_id, item)
                    .filter(|p| p.is_finite() && *p > 0.0);
                let Some(base) = base else {
                    summary.skipped_unknown += 1;
                    continue;
                };
                let key = SaturationKey { location: location_id.clone(), item: item.clone() };
                let saturation = self.ledger.saturation(&key, now);
                let modifier = pricing::saturation_modifier(saturation, threshold);
                let volatility = pricing::draw_volatility(self.rng.as_mut(), half_width);
                entry.price = pricing::quote_price(base, modifier, volatility);
                summary.repriced += 1;
            }
        }

        tracing::debug!(
            repriced = summary.repriced,
            skipped_unknown = summary.skipped_unknown,
            "market pass complete"
        );
        summary
    }

    /// Feed elapsed game minutes through the ticker and run every due pass.
    pub fn advance(
        &mut self,
        ticker: &mut MarketTicker,
        game_minutes: u32,
        status: &dyn GameStatus,
        locations: &mut LocationRegistry,
        catalog: &dyn ItemCatalog,
    ) -> PassSummary {
        let mut total = PassSummary::default();
        for _ in 0..ticker.advance(game_minutes) {
            total += self.recompute_prices(status, locations, catalog);
        }
        total
    }

    /// Cut stock by 30% and mark the current price up 10% when the pair is
    /// above threshold. Compounds on every call; see
    /// [`apply_saturation_crossings`](Self::apply_saturation_crossings) for
    /// the debounced form.
    pub fn apply_saturation_effects(
        &self,
        locations: &mut LocationRegistry,
        location: &LocationId,
        item: &ItemId,
    ) -> bool {
        if self.saturation(location, item) <= self.config.saturation_threshold {
            return false;
        }
        let key = SaturationKey { location: location.clone(), item: item.clone() };
        match locations.entry_mut(&key) {
            Some(entry) => {
                pricing::apply_saturation_effects(entry);
                true
            }
            None => false,
        }
    }

    /// Apply saturation effects once per upward threshold crossing.
    ///
    /// Returns the pairs that crossed since the previous call, in registry
    /// order. A pair that drops back to or below the threshold is rearmed.
    pub fn apply_saturation_crossings(
        &mut self,
        locations: &mut LocationRegistry,
    ) -> Vec<SaturationKey> {
        let now = self.clock.now_ms();
        let threshold = self.config.saturation_threshold;
        let mut fired = Vec::new();

        for key in locations.keys() {
            if self.ledger.saturation(&key, now) > threshold {
                if self.saturated.insert(key.clone()) {
                    if let Some(entry) = locations.entry_mut(&key) {
                        pricing::apply_saturation_effects(entry);
                    }
                    fired.push(key);
                }
            } else {
                self.saturated.remove(&key);
            }
        }
        fired
    }

    // -- News --------------------------------------------------------------

    pub fn market_news(&self, locations: &LocationRegistry, events: &dyn EventFeed) -> Vec<String> {
        news::market_news(
            &self.ledger,
            self.clock.now_ms(),
            self.config.saturation_threshold,
            locations,
            events,
        )
    }

    // -- Persistence -------------------------------------------------------

    /// Export the table in save-file form.
    pub fn supply_demand_data(&self) -> SupplyDemandData {
        persistence::encode(&self.ledger)
    }

    /// Replace the table with an exported one and write it through.
    ///
    /// Keys already in the ledger resolve as themselves, so an export fed
    /// straight back in leaves the table unchanged.
    pub fn load_supply_demand_data(&mut self, data: &SupplyDemandData, locations: &LocationRegistry) {
        let resolver = KeyResolver::new(locations).with_keys(self.ledger.iter().map(|(key, _)| key));
        self.ledger = persistence::decode(data, &resolver);
        self.saturated.clear();
        self.persist();
    }

    /// Reload from the store, resolving keys against `locations` only.
    /// Unreadable or corrupt data resets to empty.
    pub fn restore(&mut self, locations: &LocationRegistry) {
        self.saturated.clear();
        let resolver = KeyResolver::new(locations);
        self.ledger = match persistence::load_table(self.store.as_ref(), &self.config.storage_key, &resolver) {
            Ok(ledger) => ledger,
            Err(e) => {
                tracing::warn!(error = %e, "saturation table unreadable, starting empty");
                SaturationLedger::new()
            }
        };
    }

    /// Drop every record, persist the empty table and tell the player.
    pub fn reset_market_saturation(&mut self, notifier: &dyn NotificationSink) {
        let dropped = self.ledger.len();
        self.ledger.clear();
        self.saturated.clear();
        self.persist();
        tracing::info!(dropped, "market saturation reset");
        notifier.post(RESET_NOTICE);
    }

    fn persist(&mut self) {
        if let Err(e) = persistence::save_table(self.store.as_mut(), &self.config.storage_key, &self.ledger) {
            tracing::warn!(error = %e, "failed to persist saturation table");
        }
    }
}
