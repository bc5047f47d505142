//! Setter and action entry points with the property framework's return codes
//!
//! Property setters return `1` when the value changed (subscribers are told),
//! `0` when it was accepted but equal to the current one, and a negative code
//! when it was rejected. Actions return `0` when started and `-1` otherwise.

use std::sync::Arc;
use tracing::warn;

use crate::{
    error::{DeviceError, InputError},
    state::{AppState, Channel, TimerTicket},
};
use super::inputs::parse_power;

pub const CHANGED: i8 = 1;
pub const UNCHANGED: i8 = 0;
pub const REJECTED: i8 = -1;

pub const ACTION_STARTED: i8 = 0;
pub const ACTION_FAILED: i8 = -1;

/// Set the `on` property from its raw value. Always accepted.
pub async fn set_on_off(state: &AppState, raw: &str) -> i8 {
    state.set_power(parse_power(raw)).await;
    CHANGED
}

/// Set the `channel` property from its raw, possibly still quoted, value
pub async fn set_channel(state: &AppState, raw: &str) -> i8 {
    match Channel::parse_raw(raw) {
        Ok(channel) => {
            if state.set_channel(channel).await.changed() {
                CHANGED
            } else {
                UNCHANGED
            }
        }
        Err(e) => {
            warn!("Channel value rejected: {}", e);
            REJECTED
        }
    }
}

/// Start the auto-off timer from an already decoded duration
pub async fn run_timer(
    state: &Arc<AppState>,
    minutes: Result<i64, InputError>,
) -> Result<TimerTicket, DeviceError> {
    let result = match minutes {
        Ok(minutes) => state.start_timer(minutes).await,
        // Report a running timer first, as a busy device would
        Err(_) if state.controller.timer_running() => Err(DeviceError::TimerBusy),
        Err(e) => Err(e.into()),
    };

    if let Err(e) = &result {
        warn!("Timer action rejected: {}", e);
    }
    result
}

/// Return code of a timer action outcome
pub fn action_code<T>(result: &Result<T, DeviceError>) -> i8 {
    if result.is_ok() {
        ACTION_STARTED
    } else {
        ACTION_FAILED
    }
}
