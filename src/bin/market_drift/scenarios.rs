// Drift Scenarios: trade load, pauses, resets and idle stretches
// All scenario logic is data plus curve functions; the engine is untouched

use market_engine::{LocationRegistry, MarketConfig, MarketPriceEntry, StaticCatalog};

pub const HOUR_MS: u64 = 3_600_000;
pub const DAY_MS: u64 = 24 * HOUR_MS;

// ─── Scenario Configuration ─────────────────────────────────────────────────

pub struct Scenario {
    pub name: &'static str,
    pub label: &'static str,
    pub category: &'static str,
    pub passes: u64,
    /// Game minutes fed to the ticker per step.
    pub game_minutes_per_step: u32,
    /// Wall time advanced on the clock per step.
    pub wall_ms_per_step: u64,
    /// Expected trades per step.
    pub trade_rate: f64,
    pub trade_curve: Option<fn(u64) -> f64>,
    pub sell_bias: f64,
    pub max_lot: u32,
    pub hot_share: f64,
    pub paused_curve: Option<fn(u64) -> bool>,
    pub reset_at: Option<u64>,
    pub volatility_override: Option<f64>,
    /// Per-town reputation modifiers applied on top of the catalog.
    pub reputation: &'static [(&'static str, f64)],
    /// `(location, event name, description)`.
    pub events: &'static [(&'static str, &'static str, &'static str)],
    pub criteria: PassCriteria,
}

impl Scenario {
    pub fn config(&self, base: &MarketConfig) -> MarketConfig {
        let mut config = base.clone();
        if let Some(v) = self.volatility_override {
            config.volatility_factor = v;
        }
        config
    }

    pub fn trade_rate_at(&self, step: u64) -> f64 {
        self.trade_curve.map_or(self.trade_rate, |curve| curve(step))
    }

    pub fn paused_at(&self, step: u64) -> bool {
        self.paused_curve.is_some_and(|curve| curve(step))
    }
}

pub struct PassCriteria {
    pub max_bound_breaches: u32,
    pub max_news_lines: usize,
    pub min_stock: u32,
    pub require_decay_floor: bool,
    pub require_gate: bool,
    pub require_reset_clears: bool,
    pub min_crossings: Option<u32>,
    pub min_skipped_unknown: Option<u32>,
}

impl Default for PassCriteria {
    fn default() -> Self {
        Self {
            max_bound_breaches: 0,
            max_news_lines: 5,
            min_stock: 1,
            require_decay_floor: true,
            require_gate: true,
            require_reset_clears: true,
            min_crossings: None,
            min_skipped_unknown: None,
        }
    }
}

// ─── World ──────────────────────────────────────────────────────────────────

/// `(id, name, base price)`
const GOODS: [(&str, &str, f64); 5] = [
    ("wheat", "Wheat", 12.0),
    ("iron_ore", "Iron Ore", 30.0),
    ("salt", "Salt", 8.0),
    ("wool", "Wool", 15.0),
    ("ale", "Ale", 4.0),
];

/// `(id, name, goods sold, starting stock)`
const TOWNS: [(&str, &str, &[&str], u32); 3] = [
    ("riverdale", "Riverdale", &["wheat", "ale", "wool"], 40),
    ("iron_hold", "Iron Hold", &["iron_ore", "ale", "salt"], 25),
    ("saltmarsh", "Saltmarsh", &["salt", "wool", "wheat", "dragon_scale"], 60),
];

/// Three towns and five goods. Saltmarsh also lists a good the catalog does
/// not know, so every pass exercises the unknown-item skip.
pub fn world() -> (LocationRegistry, StaticCatalog) {
    let catalog = GOODS
        .iter()
        .fold(StaticCatalog::new(), |c, &(id, name, base)| c.with_item(id, name, base));

    let mut registry = LocationRegistry::new();
    for &(id, name, goods, stock) in TOWNS.iter() {
        let town = registry.insert_location(id, name);
        for &good in goods {
            let price = GOODS
                .iter()
                .find(|g| g.0 == good)
                .map_or(100, |g| g.2.round() as u32);
            town.set_entry(good, MarketPriceEntry::new(price, stock));
        }
    }
    (registry, catalog)
}

// ─── Curve Functions ────────────────────────────────────────────────────────

fn market_day_rate(step: u64) -> f64 {
    // Busy mornings, quiet nights on a 24-step day.
    let hour = (step % 24) as f64;
    (2.0 + 6.0 * (std::f64::consts::PI * hour / 24.0).sin()).max(0.0)
}

fn trade_then_idle(step: u64) -> f64 {
    if step < 20 { 12.0 } else { 0.0 }
}

fn festival_rush(step: u64) -> f64 {
    if (40..60).contains(&step) { 25.0 } else { 2.0 }
}

fn winter_pause(step: u64) -> bool {
    (30..70).contains(&step)
}

fn always_paused(_step: u64) -> bool {
    true
}

// ─── Scenarios ──────────────────────────────────────────────────────────────

pub fn scenarios() -> Vec<Scenario> {
    vec![
        Scenario {
            name: "STEADY_TRADE",
            label: "Steady trade",
            category: "baseline",
            passes: 200,
            game_minutes_per_step: 5,
            wall_ms_per_step: HOUR_MS,
            trade_rate: 3.0,
            trade_curve: None,
            sell_bias: 0.5,
            max_lot: 4,
            hot_share: 0.0,
            paused_curve: None,
            reset_at: None,
            volatility_override: None,
            reputation: &[],
            events: &[],
            criteria: PassCriteria::default(),
        },
        Scenario {
            name: "MARKET_DAY",
            label: "Market day cycle",
            category: "baseline",
            passes: 240,
            game_minutes_per_step: 5,
            wall_ms_per_step: HOUR_MS,
            trade_rate: 0.0,
            trade_curve: Some(market_day_rate),
            sell_bias: 0.4,
            max_lot: 6,
            hot_share: 0.1,
            paused_curve: None,
            reset_at: None,
            volatility_override: None,
            reputation: &[],
            events: &[("riverdale", "Harvest Fair", "grain carts crowd the square")],
            criteria: PassCriteria::default(),
        },
        Scenario {
            name: "HOT_GOOD_GLUT",
            label: "Single good glut",
            category: "saturation",
            passes: 120,
            game_minutes_per_step: 5,
            wall_ms_per_step: HOUR_MS,
            trade_rate: 8.0,
            trade_curve: None,
            sell_bias: 0.9,
            max_lot: 10,
            hot_share: 0.8,
            paused_curve: None,
            reset_at: None,
            volatility_override: None,
            reputation: &[],
            events: &[],
            criteria: PassCriteria { min_crossings: Some(1), ..PassCriteria::default() },
        },
        Scenario {
            name: "FESTIVAL_RUSH",
            label: "Festival rush",
            category: "saturation",
            passes: 120,
            game_minutes_per_step: 10,
            wall_ms_per_step: 2 * HOUR_MS,
            trade_rate: 0.0,
            trade_curve: Some(festival_rush),
            sell_bias: 0.3,
            max_lot: 8,
            hot_share: 0.2,
            paused_curve: None,
            reset_at: None,
            volatility_override: None,
            reputation: &[],
            events: &[
                ("iron_hold", "Midsummer Festival", "merchants flood in from the coast"),
                ("saltmarsh", "Storm Warning", "fishing boats stay in harbour"),
            ],
            criteria: PassCriteria { min_crossings: Some(1), ..PassCriteria::default() },
        },
        Scenario {
            name: "IDLE_DECAY",
            label: "Trade then idle",
            category: "decay",
            passes: 60,
            game_minutes_per_step: 5,
            wall_ms_per_step: DAY_MS,
            trade_rate: 0.0,
            trade_curve: Some(trade_then_idle),
            sell_bias: 0.5,
            max_lot: 5,
            hot_share: 0.0,
            paused_curve: None,
            reset_at: None,
            volatility_override: Some(0.0),
            reputation: &[],
            events: &[],
            criteria: PassCriteria::default(),
        },
        Scenario {
            name: "WINTER_PAUSE",
            label: "Paused mid-season",
            category: "gating",
            passes: 100,
            game_minutes_per_step: 5,
            wall_ms_per_step: HOUR_MS,
            trade_rate: 4.0,
            trade_curve: None,
            sell_bias: 0.5,
            max_lot: 4,
            hot_share: 0.0,
            paused_curve: Some(winter_pause),
            reset_at: None,
            volatility_override: None,
            reputation: &[],
            events: &[],
            criteria: PassCriteria::default(),
        },
        Scenario {
            name: "FROZEN_WORLD",
            label: "Never unpaused",
            category: "gating",
            passes: 50,
            game_minutes_per_step: 5,
            wall_ms_per_step: HOUR_MS,
            trade_rate: 4.0,
            trade_curve: None,
            sell_bias: 0.5,
            max_lot: 4,
            hot_share: 0.0,
            paused_curve: Some(always_paused),
            reset_at: None,
            volatility_override: None,
            reputation: &[],
            events: &[],
            criteria: PassCriteria::default(),
        },
        Scenario {
            name: "RESET_MIDWAY",
            label: "Saturation reset",
            category: "reset",
            passes: 100,
            game_minutes_per_step: 5,
            wall_ms_per_step: HOUR_MS,
            trade_rate: 6.0,
            trade_curve: None,
            sell_bias: 0.5,
            max_lot: 6,
            hot_share: 0.3,
            paused_curve: None,
            reset_at: Some(50),
            volatility_override: None,
            reputation: &[],
            events: &[],
            criteria: PassCriteria::default(),
        },
        Scenario {
            name: "WILD_VOLATILITY",
            label: "Near-max volatility",
            category: "bounds",
            passes: 200,
            game_minutes_per_step: 5,
            wall_ms_per_step: HOUR_MS,
            trade_rate: 5.0,
            trade_curve: None,
            sell_bias: 0.5,
            max_lot: 10,
            hot_share: 0.0,
            paused_curve: None,
            reset_at: None,
            volatility_override: Some(1.9),
            reputation: &[],
            events: &[],
            criteria: PassCriteria::default(),
        },
        Scenario {
            name: "REPUTATION_SPREAD",
            label: "Town reputation spread",
            category: "bounds",
            passes: 150,
            game_minutes_per_step: 5,
            wall_ms_per_step: HOUR_MS,
            trade_rate: 4.0,
            trade_curve: None,
            sell_bias: 0.5,
            max_lot: 5,
            hot_share: 0.0,
            paused_curve: None,
            reset_at: None,
            volatility_override: None,
            reputation: &[("riverdale", 0.8), ("iron_hold", 1.3), ("saltmarsh", 5.0)],
            events: &[],
            criteria: PassCriteria { min_skipped_unknown: Some(1), ..PassCriteria::default() },
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use market_engine::{ItemCatalog, SaturationKey};

    #[test]
    fn test_world_shape() {
        let (registry, catalog) = world();
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.keys().len(), 10);
        let unknown = SaturationKey::new("saltmarsh", "dragon_scale");
        assert!(registry.entry(&unknown).is_some());
        assert_eq!(catalog.base_price(&unknown.location, &unknown.item), None);
    }

    #[test]
    fn test_scenario_names_unique() {
        let all = scenarios();
        let mut names: Vec<_> = all.iter().map(|s| s.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), all.len());
    }

    #[test]
    fn test_overrides_keep_valid_config() {
        for s in scenarios() {
            let config = s.config(&MarketConfig::default());
            assert!(config.validate().is_ok(), "{} has an invalid config", s.name);
        }
    }
}
