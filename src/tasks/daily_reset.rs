//! Midnight reset of the daily on-time

use std::{sync::Arc, time::Duration};
use chrono::{DateTime, Local, NaiveDate, TimeZone};
use tokio::time::sleep;
use tracing::{debug, info};

use crate::state::AppState;

/// Wait between attempts while the clock is unset or the next midnight cannot
/// be computed (e.g. a DST gap)
pub const RETRY_DELAY: Duration = Duration::from_secs(60);

/// Background task that zeroes the daily accumulator at every local midnight
pub async fn daily_reset_task(state: Arc<AppState>) {
    run_daily_reset(state, Local).await
}

/// Reset loop over the device clock, with midnight taken in `zone`.
///
/// Nothing is scheduled while the clock is invalid. The reset happens only
/// once the clock's date has moved past the day the wait was computed on; an
/// early wake-up or a clock that jumped back just leads to a new wait.
pub async fn run_daily_reset<Tz>(state: Arc<AppState>, zone: Tz)
where
    Tz: TimeZone,
{
    info!("Starting daily reset task");
    let mut current: Option<NaiveDate> = None;

    loop {
        let Some(now) = state.controller.valid_now() else {
            debug!("Clock not valid, daily reset not scheduled");
            sleep(RETRY_DELAY).await;
            continue;
        };

        let now = now.with_timezone(&zone);
        let today = now.date_naive();
        match current {
            Some(day) if today > day => state.reset_accumulator(),
            Some(day) => debug!("Day {} not over on the device clock", day),
            None => debug!("Daily reset scheduled from {}", today),
        }
        current = Some(today);

        let wait = until_next_midnight(now).unwrap_or(RETRY_DELAY);
        debug!("Next daily reset in {} s", wait.as_secs());
        sleep(wait).await;
    }
}

/// Time from `now` to the start of the next calendar day in `now`'s zone
pub fn until_next_midnight<Tz: TimeZone>(now: DateTime<Tz>) -> Option<Duration> {
    let tomorrow = now.date_naive().succ_opt()?.and_hms_opt(0, 0, 0)?;
    let next = now.timezone().from_local_datetime(&tomorrow).earliest()?;
    (next - now).to_std().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn waits_until_start_of_next_day() {
        let now = Utc.with_ymd_and_hms(2024, 3, 9, 23, 59, 30).unwrap();
        assert_eq!(until_next_midnight(now), Some(Duration::from_secs(30)));

        let midnight = Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap();
        assert_eq!(until_next_midnight(midnight), Some(Duration::from_secs(86_400)));
    }
}
