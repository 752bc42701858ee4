//! Player-facing notification sinks.

use std::cell::RefCell;

/// Fire-and-forget text notifications.
pub trait NotificationSink {
    fn post(&self, text: &str);
}

/// Routes notifications to the `tracing` subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn post(&self, text: &str) {
        tracing::info!(target: "market::notify", "{text}");
    }
}

/// Keeps every posted line; used by tests and the drift driver.
#[derive(Debug, Default)]
pub struct CollectingSink {
    lines: RefCell<Vec<String>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }

    pub fn take(&self) -> Vec<String> {
        self.lines.take()
    }
}

impl NotificationSink for CollectingSink {
    fn post(&self, text: &str) {
        self.lines.borrow_mut().push(text.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collecting_sink_keeps_order() {
        let sink = CollectingSink::new();
        sink.post("first");
        sink.post("second");
        assert_eq!(sink.take(), vec!["first", "second"]);
        assert!(sink.lines().is_empty());
    }
}
