//! Daily "on" time accounting

use chrono::{DateTime, Utc};

/// Seconds the light has been on since the last daily reset.
///
/// Lives in memory only: a restart loses the partial total for the day,
/// while the channel selection is persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DailyAccumulator {
    seconds: u64,
    last_update: Option<DateTime<Utc>>,
}

impl DailyAccumulator {
    /// Largest reported value, one full day
    pub const MAX_MINUTES: u64 = 24 * 60;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn seconds(&self) -> u64 {
        self.seconds
    }

    /// `floor(seconds / 60)`, capped at a day for when a reset was missed
    pub fn minutes(&self) -> u64 {
        (self.seconds / 60).min(Self::MAX_MINUTES)
    }

    /// Account the time since the previous valid tick if the light is on.
    /// Returns whether the minute count moved.
    pub fn tick(&mut self, now: DateTime<Utc>, powered: bool) -> bool {
        let before = self.minutes();

        if powered {
            if let Some(last) = self.last_update {
                let delta = (now - last).num_seconds();
                if delta > 0 {
                    self.seconds += delta.unsigned_abs();
                }
            }
        }
        self.last_update = Some(now);

        self.minutes() != before
    }

    /// Zero the totals; the last-update timestamp is kept so time keeps
    /// being counted from the previous tick
    pub fn reset(&mut self) {
        self.seconds = 0;
    }
}
