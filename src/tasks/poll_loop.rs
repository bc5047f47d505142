//! Fixed-period poll loop

use std::{sync::Arc, time::Duration};
use tokio::time::{interval, MissedTickBehavior};
use tracing::info;

use crate::state::AppState;

/// Default poll period
pub const POLL_PERIOD: Duration = Duration::from_secs(1);

/// Background task that accounts on-time every period and retries the
/// initial property announcement until it has been delivered
pub async fn poll_loop_task(state: Arc<AppState>, period: Duration) {
    info!("Starting poll loop ({} ms period)", period.as_millis());

    let mut interval = interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        interval.tick().await;
        state.poll_tick();
    }
}
