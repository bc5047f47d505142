//! Auto-off timer background task

use std::sync::Arc;
use tokio::time::sleep;
use tracing::debug;

use crate::state::{AppState, TimerTicket};

/// Single-shot countdown armed by the timer action. Expiry is handed back to
/// the controller, which ignores it if the ticket is no longer current.
pub async fn auto_off_timer_task(state: Arc<AppState>, ticket: TimerTicket) {
    debug!(
        "Auto-off countdown {} started for {} min",
        ticket.generation,
        ticket.duration.minutes()
    );

    sleep(ticket.duration.as_duration()).await;
    state.timer_elapsed(ticket).await;
}
