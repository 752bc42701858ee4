//! External world events shown in market news.

use serde::{Deserialize, Serialize};

use crate::types::LocationId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketEvent {
    pub location_id: LocationId,
    pub name: String,
    pub description: String,
}

impl MarketEvent {
    pub fn new(
        location: impl Into<LocationId>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            location_id: location.into(),
            name: name.into(),
            description: description.into(),
        }
    }
}

/// Read-only feed of currently active events, in display order.
pub trait EventFeed {
    fn active_events(&self) -> Vec<MarketEvent>;
}

impl EventFeed for [MarketEvent] {
    fn active_events(&self) -> Vec<MarketEvent> {
        self.to_vec()
    }
}

impl EventFeed for Vec<MarketEvent> {
    fn active_events(&self) -> Vec<MarketEvent> {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_json_uses_camel_case() {
        let e = MarketEvent::new("riverdale", "Harvest Fair", "grain carts everywhere");
        let json = serde_json::to_value(&e).expect("test: serialize event");
        assert_eq!(json["locationId"], "riverdale");
    }
}
