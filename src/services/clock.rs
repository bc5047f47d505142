//! Wall-clock sources

use std::sync::Mutex;
use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};

/// Clocks before this year are treated as unset (no RTC, no NTP yet)
pub const FIRST_VALID_YEAR: i32 = 2019;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Whether `now` comes from a synchronised clock
    fn is_time_valid(&self, now: DateTime<Utc>) -> bool {
        now.year() >= FIRST_VALID_YEAR
    }
}

/// The host's system clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Hand-driven clock for tests
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// A clock stuck in 1970, as on a board whose RTC was never set
    pub fn unset() -> Self {
        Self::new(DateTime::default())
    }

    /// A synchronised clock at a fixed, arbitrary date
    pub fn synced() -> Self {
        Self::new(Utc.with_ymd_and_hms(2024, 5, 17, 8, 0, 0).single().unwrap_or_default())
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.lock() = now;
    }

    pub fn advance_secs(&self, secs: i64) {
        let mut now = self.lock();
        *now += Duration::seconds(secs);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, DateTime<Utc>> {
        self.now.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validity_starts_in_2019() {
        let clock = SystemClock;
        let late_2018 = Utc.with_ymd_and_hms(2018, 12, 31, 23, 59, 59).unwrap();
        let early_2019 = Utc.with_ymd_and_hms(2019, 1, 1, 0, 0, 0).unwrap();

        assert!(!clock.is_time_valid(late_2018));
        assert!(clock.is_time_valid(early_2019));
        assert!(clock.is_time_valid(clock.now()));
    }

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::unset();
        assert!(!clock.is_time_valid(clock.now()));

        clock.advance_secs(90);
        assert_eq!(clock.now().timestamp(), 90);
    }
}
