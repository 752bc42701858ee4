//! Game-time cadence for recomputation passes.

/// Host game state the engine checks before each pass.
pub trait GameStatus {
    fn is_running(&self) -> bool;
    fn is_paused(&self) -> bool;

    /// Passes only run while the game is running and not paused.
    fn allows_market_updates(&self) -> bool {
        self.is_running() && !self.is_paused()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimulationStatus {
    pub running: bool,
    pub paused: bool,
}

impl SimulationStatus {
    pub fn playing() -> Self {
        Self { running: true, paused: false }
    }
}

impl GameStatus for SimulationStatus {
    fn is_running(&self) -> bool {
        self.running
    }

    fn is_paused(&self) -> bool {
        self.paused
    }
}

/// Converts elapsed game minutes into due passes.
///
/// The remainder carries over, so advancing by 3 then 2 minutes at a
/// 5-minute interval yields one pass. Cancelling is permanent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketTicker {
    interval_minutes: u32,
    carried_minutes: u32,
    cancelled: bool,
}

impl MarketTicker {
    pub fn new(interval_minutes: u32) -> Self {
        Self {
            interval_minutes: interval_minutes.max(1),
            carried_minutes: 0,
            cancelled: false,
        }
    }

    /// Advance game time; returns the number of passes now due.
    pub fn advance(&mut self, game_minutes: u32) -> u32 {
        if self.cancelled {
            return 0;
        }
        let total = self.carried_minutes as u64 + game_minutes as u64;
        let interval = self.interval_minutes as u64;
        self.carried_minutes = (total % interval) as u32;
        (total / interval).min(u32::MAX as u64) as u32
    }

    pub fn cancel(&mut self) {
        self.cancelled = true;
        self.carried_minutes = 0;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn interval_minutes(&self) -> u32 {
        self.interval_minutes
    }
}
