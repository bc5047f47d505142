//! Lock-protected device state and its observable snapshot

use serde::{Deserialize, Serialize};

use super::{Channel, DailyAccumulator, TimerState};

/// Everything the state lock protects
#[derive(Debug, Clone, Default)]
pub struct DeviceState {
    /// Power flag; never persisted, the light always starts off
    pub on: bool,
    pub channel: Channel,
    pub timer: TimerState,
    pub accumulator: DailyAccumulator,
}

impl DeviceState {
    pub fn new(channel: Channel) -> Self {
        Self {
            channel,
            ..Self::default()
        }
    }

    pub fn snapshot(&self) -> DeviceSnapshot {
        DeviceSnapshot {
            on: self.on,
            channel: self.channel,
            daily_on: self.accumulator.minutes(),
        }
    }
}

/// Values visible to subscribers, one field per reported property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceSnapshot {
    pub on: bool,
    pub channel: Channel,
    /// Minutes on today
    pub daily_on: u64,
}

/// Observable state before and after one controller operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub before: DeviceSnapshot,
    pub after: DeviceSnapshot,
}

impl Transition {
    pub fn changed(&self) -> bool {
        self.before != self.after
    }

    pub fn power_changed(&self) -> bool {
        self.before.on != self.after.on
    }

    pub fn channel_changed(&self) -> bool {
        self.before.channel != self.after.channel
    }
}
