//! Market news: short lines for the town crier panel.
//!
//! Active world events come first, then one line per priced pair whose
//! saturation is far from the threshold. At most [`NEWS_LIMIT`] lines.

use crate::config::{NEWS_LIMIT, PLUMMETING_MULTIPLE, SOARING_MULTIPLE};
use crate::events::EventFeed;
use crate::locations::LocationRegistry;
use crate::saturation::SaturationLedger;
use crate::types::SaturationKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketTrend {
    /// Saturation above 1.5x threshold.
    Shortage,
    /// Saturation below 0.5x threshold.
    Oversupply,
}

impl MarketTrend {
    pub fn classify(saturation: f64, threshold: f64) -> Option<Self> {
        if saturation > threshold * SOARING_MULTIPLE {
            Some(Self::Shortage)
        } else if saturation < threshold * PLUMMETING_MULTIPLE {
            Some(Self::Oversupply)
        } else {
            None
        }
    }

    fn headline(&self) -> &'static str {
        match self {
            Self::Shortage => "prices soaring (shortage)",
            Self::Oversupply => "prices plummeting (oversupply)",
        }
    }
}

pub fn market_news(
    ledger: &SaturationLedger,
    now_ms: u64,
    threshold: f64,
    locations: &LocationRegistry,
    events: &dyn EventFeed,
) -> Vec<String> {
    let event_lines = events.active_events().into_iter().map(|e| {
        let place = locations
            .display_name(&e.location_id)
            .unwrap_or(e.location_id.as_str())
            .to_string();
        format!("{} in {}: {}", e.name, place, e.description)
    });

    let trend_lines = locations.iter().flat_map(|location| {
        location.entries().filter_map(move |(item, _)| {
            let key = SaturationKey { location: location.id.clone(), item: item.clone() };
            let saturation = ledger.saturation(&key, now_ms);
            MarketTrend::classify(saturation, threshold)
                .map(|trend| format!("{}: {} {}", location.name, item, trend.headline()))
        })
    });

    event_lines.chain(trend_lines).take(NEWS_LIMIT).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::MarketEvent;
    use crate::locations::MarketPriceEntry;
    use crate::types::TradeSide;

    fn registry() -> LocationRegistry {
        let mut reg = LocationRegistry::new();
        let town = reg.insert_location("riverdale", "Riverdale");
        town.set_entry("wheat", MarketPriceEntry::new(100, 10));
        town.set_entry("ale", MarketPriceEntry::new(5, 10));
        reg
    }

    #[test]
    fn classify_bands() {
        assert_eq!(MarketTrend::classify(16.0, 10.0), Some(MarketTrend::Shortage));
        assert_eq!(MarketTrend::classify(15.0, 10.0), None);
        assert_eq!(MarketTrend::classify(5.0, 10.0), None);
        assert_eq!(MarketTrend::classify(4.9, 10.0), Some(MarketTrend::Oversupply));
    }

    #[test]
    fn events_lead_then_trends_in_registry_order() {
        let reg = registry();
        let mut ledger = SaturationLedger::new();
        ledger.record(SaturationKey::new("riverdale", "wheat"), TradeSide::Buy, 30, 0);
        ledger.record(SaturationKey::new("riverdale", "ale"), TradeSide::Sell, 8, 0);
        let events = vec![MarketEvent::new("riverdale", "Harvest Fair", "grain carts everywhere")];

        let news = market_news(&ledger, 0, 10.0, &reg, &events);
        assert_eq!(
            news,
            vec![
                "Harvest Fair in Riverdale: grain carts everywhere",
                "Riverdale: wheat prices soaring (shortage)",
            ]
        );
    }

    #[test]
    fn unknown_event_location_uses_id() {
        let events = vec![MarketEvent::new("dragonspire", "Dragon Sighting", "caravans delayed")];
        let news = market_news(&SaturationLedger::new(), 0, 10.0, &LocationRegistry::new(), &events);
        assert_eq!(news, vec!["Dragon Sighting in dragonspire: caravans delayed"]);
    }

    #[test]
    fn untraded_goods_read_as_oversupply() {
        let news = market_news(&SaturationLedger::new(), 0, 10.0, &registry(), &Vec::<MarketEvent>::new());
        assert_eq!(news.len(), 2);
        assert!(news.iter().all(|l| l.ends_with("(oversupply)")));
    }

    #[test]
    fn capped_at_limit() {
        let events: Vec<MarketEvent> = (0..8)
            .map(|i| MarketEvent::new("riverdale", format!("Event {i}"), "busy"))
            .collect();
        let news = market_news(&SaturationLedger::new(), 0, 10.0, &registry(), &events);
        assert_eq!(news.len(), NEWS_LIMIT);
        assert!(news[4].starts_with("Event 4"));
    }
}
