//! Auto-off timer state and duration validation

use std::time::Duration;
use tokio::time::Instant;

use crate::error::InputError;

/// Validated timer length in minutes, within (0, 600]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerDuration(u32);

impl TimerDuration {
    pub const MIN_MINUTES: u32 = 1;
    pub const MAX_MINUTES: u32 = 600;

    pub fn from_minutes(minutes: i64) -> Result<Self, InputError> {
        match u32::try_from(minutes) {
            Ok(m) if (Self::MIN_MINUTES..=Self::MAX_MINUTES).contains(&m) => Ok(Self(m)),
            _ => Err(InputError::DurationOutOfRange(minutes)),
        }
    }

    pub fn minutes(self) -> u32 {
        self.0
    }

    pub fn as_duration(self) -> Duration {
        Duration::from_secs(u64::from(self.0) * 60)
    }
}

/// Handle for one armed countdown. Expiry must present the same
/// generation, so a late or duplicate delivery is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerTicket {
    pub generation: u64,
    pub duration: TimerDuration,
}

/// The single system-wide countdown
#[derive(Debug, Clone, Default)]
pub struct TimerState {
    generation: u64,
    /// Deadline of the running countdown
    deadline: Option<Instant>,
}

impl TimerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.deadline.is_some()
    }

    /// Arm a new countdown. The caller checks `is_running` first.
    pub fn arm(&mut self, duration: TimerDuration, now: Instant) -> TimerTicket {
        self.generation += 1;
        self.deadline = Some(now + duration.as_duration());
        TimerTicket {
            generation: self.generation,
            duration,
        }
    }

    /// Disarm if `ticket` is the running countdown; returns whether it was
    pub fn expire(&mut self, ticket: TimerTicket) -> bool {
        if self.deadline.is_some() && ticket.generation == self.generation {
            self.deadline = None;
            true
        } else {
            false
        }
    }

    /// Whole seconds left, if running
    pub fn remaining_seconds(&self, now: Instant) -> Option<u64> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(now).as_secs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_bounds() {
        assert_eq!(TimerDuration::from_minutes(1).map(TimerDuration::minutes), Ok(1));
        assert_eq!(TimerDuration::from_minutes(600).map(TimerDuration::minutes), Ok(600));
        assert_eq!(
            TimerDuration::from_minutes(0),
            Err(InputError::DurationOutOfRange(0))
        );
        assert!(TimerDuration::from_minutes(601).is_err());
        assert!(TimerDuration::from_minutes(-5).is_err());
    }

    #[test]
    fn stale_ticket_does_not_expire_newer_timer() {
        let now = Instant::now();
        let mut timer = TimerState::new();
        let first = timer.arm(TimerDuration::from_minutes(1).unwrap(), now);
        assert!(timer.expire(first));
        assert!(!timer.expire(first));

        let second = timer.arm(TimerDuration::from_minutes(2).unwrap(), now);
        assert!(!timer.expire(first));
        assert!(timer.is_running());
        assert_eq!(timer.remaining_seconds(now), Some(120));
        assert!(timer.expire(second));
        assert_eq!(timer.remaining_seconds(now), None);
    }
}
