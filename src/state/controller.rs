//! Device state controller
//!
//! Owns the power flag, the channel selection, the auto-off timer and the daily
//! accumulator. Two locks are involved:
//!
//! * `state` is a plain mutex held only for short, non-blocking sections. The
//!   poll tick takes nothing else, so it never waits on a relay settle delay.
//! * `sequencer` is held by every mutating operation from start to finish,
//!   including the pin sequence it plays back. Pin sequences therefore reach the
//!   relays in the same order the state changes were committed.
//!
//! Timer expiry goes through the same two locks as explicit requests.
//!
//! Every operation hands its [`Transition`] to an `announce` callback before
//! letting go of the lock that ordered it: the sequencer for power, channel and
//! timer changes, the state mutex for the accumulator. Announcements of a
//! property therefore leave in commit order.

use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};
use chrono::{DateTime, Utc};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::{
    error::DeviceError,
    services::{Clock, KeyValueStore, RelayDriver},
};
use super::{
    transition::{self, PinStep},
    Channel, DeviceSnapshot, DeviceState, TimerDuration, TimerTicket, Transition,
};

/// Pause between two pin writes that must not coincide
pub const DEFAULT_SETTLE: Duration = Duration::from_millis(20);

pub struct DeviceController {
    state: Mutex<DeviceState>,
    sequencer: tokio::sync::Mutex<()>,
    relay: Arc<dyn RelayDriver>,
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    settle: Duration,
}

impl DeviceController {
    /// Create a controller with the light off and the persisted channel selected
    pub fn new(
        relay: Arc<dyn RelayDriver>,
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        settle: Duration,
    ) -> Self {
        let channel = load_channel(store.as_ref());
        info!("Starting with channel {} (light off)", channel);

        Self {
            state: Mutex::new(DeviceState::new(channel)),
            sequencer: tokio::sync::Mutex::new(()),
            relay,
            store,
            clock,
            settle,
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, DeviceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> DeviceSnapshot {
        self.lock_state().snapshot()
    }

    pub fn timer_running(&self) -> bool {
        self.lock_state().timer.is_running()
    }

    pub fn timer_remaining_seconds(&self) -> Option<u64> {
        self.lock_state().timer.remaining_seconds(Instant::now())
    }

    /// Seconds accumulated today, finer than the reported minutes
    pub fn daily_on_seconds(&self) -> u64 {
        self.lock_state().accumulator.seconds()
    }

    /// Wall-clock time, or `None` while the clock is not yet valid
    pub fn valid_now(&self) -> Option<DateTime<Utc>> {
        let now = self.clock.now();
        self.clock.is_time_valid(now).then_some(now)
    }

    /// Turn the light on or off.
    ///
    /// Switching on an already lit light touches no pins. Switching off always
    /// drives both pins low, A first.
    pub async fn set_power(&self, on: bool, announce: impl FnOnce(&Transition)) -> Transition {
        let _sequence = self.sequencer.lock().await;

        let (transition, steps) = {
            let mut state = self.lock_state();
            let before = state.snapshot();
            let steps = if on {
                if state.on {
                    Vec::new()
                } else {
                    state.on = true;
                    transition::power_on(state.channel)
                }
            } else {
                state.on = false;
                transition::power_off()
            };
            (Transition { before, after: state.snapshot() }, steps)
        };

        if transition.power_changed() {
            info!("Light switched {}", if on { "on" } else { "off" });
        }
        self.play(&steps).await;
        announce(&transition);
        transition
    }

    /// Select the relay output(s). While lit, only pins whose level differs
    /// between the old and new channel are written. The selection is persisted
    /// when it changes.
    pub async fn set_channel(
        &self,
        channel: Channel,
        announce: impl FnOnce(&Transition),
    ) -> Transition {
        let _sequence = self.sequencer.lock().await;

        let (transition, steps) = {
            let mut state = self.lock_state();
            let before = state.snapshot();
            let previous = state.channel;
            state.channel = channel;
            let steps = if state.on && previous != channel {
                transition::switch_channel(previous, channel)
            } else {
                Vec::new()
            };
            (Transition { before, after: state.snapshot() }, steps)
        };

        if !transition.channel_changed() {
            debug!("Channel already {}, nothing to do", channel);
            announce(&transition);
            return transition;
        }

        info!("Channel {} -> {}", transition.before.channel, channel);
        self.play(&steps).await;
        announce(&transition);
        self.persist_channel(channel).await;
        transition
    }

    /// Arm the auto-off countdown, switching the light on if it is off.
    /// The caller is responsible for delivering expiry back through
    /// [`DeviceController::timer_elapsed`] with the returned ticket.
    pub async fn start_timer(
        &self,
        duration: TimerDuration,
        announce: impl FnOnce(&Transition),
    ) -> Result<(TimerTicket, Transition), DeviceError> {
        let _sequence = self.sequencer.lock().await;

        let (ticket, transition, steps) = {
            let mut state = self.lock_state();
            if state.timer.is_running() {
                return Err(DeviceError::TimerBusy);
            }

            let before = state.snapshot();
            let steps = if state.on {
                Vec::new()
            } else {
                state.on = true;
                transition::power_on(state.channel)
            };
            let ticket = state.timer.arm(duration, Instant::now());
            (ticket, Transition { before, after: state.snapshot() }, steps)
        };

        info!(
            "Timer armed for {} min{}",
            duration.minutes(),
            if transition.power_changed() { ", light forced on" } else { "" }
        );
        self.play(&steps).await;
        announce(&transition);
        Ok((ticket, transition))
    }

    /// Deliver timer expiry. Returns `None` when `ticket` no longer names the
    /// running countdown, so repeated deliveries are harmless.
    pub async fn timer_elapsed(
        &self,
        ticket: TimerTicket,
        announce: impl FnOnce(&Transition),
    ) -> Option<Transition> {
        let _sequence = self.sequencer.lock().await;

        let (transition, steps) = {
            let mut state = self.lock_state();
            if !state.timer.expire(ticket) {
                debug!("Ignoring stale timer expiry (generation {})", ticket.generation);
                return None;
            }

            let before = state.snapshot();
            let steps = if state.on {
                state.on = false;
                transition::power_off()
            } else {
                Vec::new()
            };
            (Transition { before, after: state.snapshot() }, steps)
        };

        info!(
            "Timer of {} min finished{}",
            ticket.duration.minutes(),
            if transition.power_changed() { ", light switched off" } else { "" }
        );
        self.play(&steps).await;
        announce(&transition);
        Some(transition)
    }

    /// Add the wall-clock time since the previous tick to today's total while
    /// the light is on. Returns `None` when the clock is not yet valid.
    pub fn tick_accumulator(&self, announce: impl FnOnce(&Transition)) -> Option<Transition> {
        let now = self.valid_now()?;

        let mut state = self.lock_state();
        let before = state.snapshot();
        let powered = state.on;
        state.accumulator.tick(now, powered);
        let transition = Transition { before, after: state.snapshot() };
        announce(&transition);
        Some(transition)
    }

    /// Start a new day: account the time up to now, then zero the totals.
    /// Skipped (returns `None`) while the clock is not valid.
    pub fn reset_accumulator(&self, announce: impl FnOnce(&Transition)) -> Option<Transition> {
        let Some(now) = self.valid_now() else {
            warn!("Clock not synchronised, daily reset skipped");
            return None;
        };

        let mut state = self.lock_state();
        let before = state.snapshot();
        let powered = state.on;
        state.accumulator.tick(now, powered);
        state.accumulator.reset();
        info!("Daily on-time reset");
        let transition = Transition { before, after: state.snapshot() };
        announce(&transition);
        Some(transition)
    }

    async fn play(&self, steps: &[PinStep]) {
        for step in steps {
            match *step {
                PinStep::Set(pin, on) => {
                    debug!("Relay {:?} -> {}", pin, if on { "high" } else { "low" });
                    // State stays as committed even if the write failed
                    if let Err(e) = self.relay.set_level(pin, on) {
                        warn!("Failed to drive relay {:?}: {}", pin, e);
                    }
                }
                PinStep::Settle => tokio::time::sleep(self.settle).await,
            }
        }
    }

    /// Write the selection off the async workers; still under the sequencer,
    /// so writes land in commit order
    async fn persist_channel(&self, channel: Channel) {
        let store = Arc::clone(&self.store);
        let write = tokio::task::spawn_blocking(move || {
            store.store_i8(Channel::STORE_KEY, channel.to_stored())
        });

        match write.await {
            Ok(Ok(())) => debug!("Persisted channel {}", channel),
            Ok(Err(e)) => warn!("Failed to persist channel {}: {}", channel, e),
            Err(e) => warn!("Channel write task failed: {}", e),
        }
    }
}

/// Read the persisted channel, falling back to A+B when the store has no
/// usable value
pub fn load_channel(store: &dyn KeyValueStore) -> Channel {
    match store.load_i8(Channel::STORE_KEY) {
        Ok(Some(raw)) => Channel::from_stored(raw).unwrap_or_else(|| {
            warn!("Stored channel value {} is invalid, using {}", raw, Channel::default());
            Channel::default()
        }),
        Ok(None) => {
            info!("No stored channel, using {}", Channel::default());
            Channel::default()
        }
        Err(e) => {
            warn!("Failed to read stored channel: {}", e);
            Channel::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{JsonFileStore, ManualClock, MemoryRelay, MemoryStore, RelayPin};

    struct Rig {
        relay: Arc<MemoryRelay>,
        store: Arc<MemoryStore>,
        clock: Arc<ManualClock>,
        controller: DeviceController,
    }

    fn rig_with(store: MemoryStore, clock: ManualClock) -> Rig {
        let relay = Arc::new(MemoryRelay::new());
        let store = Arc::new(store);
        let clock = Arc::new(clock);
        let controller =
            DeviceController::new(relay.clone(), store.clone(), clock.clone(), DEFAULT_SETTLE);
        Rig { relay, store, clock, controller }
    }

    fn rig() -> Rig {
        rig_with(MemoryStore::new(), ManualClock::synced())
    }

    fn quiet(_: &Transition) {}

    #[tokio::test(start_paused = true)]
    async fn power_round_trip_restores_levels() {
        let rig = rig();
        assert!(rig.controller.set_power(true, quiet).await.changed());
        assert!(rig.relay.level(RelayPin::A) && rig.relay.level(RelayPin::B));

        let off = rig.controller.set_power(false, quiet).await;
        assert!(off.power_changed());
        assert!(!rig.relay.level(RelayPin::A) && !rig.relay.level(RelayPin::B));
        assert!(!rig.controller.snapshot().on);
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_power_on_is_unchanged() {
        let rig = rig();
        rig.controller.set_power(true, quiet).await;
        rig.relay.take_writes();

        assert!(!rig.controller.set_power(true, quiet).await.changed());
        assert!(rig.relay.writes().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn channel_change_while_off_only_persists() {
        let rig = rig();
        let t = rig.controller.set_channel(Channel::B, quiet).await;

        assert!(t.channel_changed());
        assert!(rig.relay.writes().is_empty());
        assert_eq!(rig.store.load_i8(Channel::STORE_KEY).unwrap(), Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn announce_runs_with_the_committed_transition() {
        let rig = rig();
        let mut seen = Vec::new();

        let t = rig.controller.set_channel(Channel::B, |t| seen.push(*t)).await;
        assert_eq!(seen, vec![t]);
        assert_eq!(seen[0].after.channel, Channel::B);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn channel_is_written_to_json_file() {
        let path = std::env::temp_dir()
            .join(format!("dual-light-controller-{}.json", std::process::id()));
        let _ = std::fs::remove_file(&path);

        let controller = DeviceController::new(
            Arc::new(MemoryRelay::new()),
            Arc::new(JsonFileStore::new(&path)),
            Arc::new(ManualClock::synced()),
            DEFAULT_SETTLE,
        );
        controller.set_channel(Channel::B, quiet).await;
        assert_eq!(load_channel(&JsonFileStore::new(&path)), Channel::B);

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test(start_paused = true)]
    async fn same_channel_is_not_persisted() {
        let rig = rig();
        assert!(!rig.controller.set_channel(Channel::AB, quiet).await.changed());
        assert_eq!(rig.store.write_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn relay_failure_keeps_state() {
        let rig = rig();
        rig.relay.set_failing(true);

        assert!(rig.controller.set_power(true, quiet).await.power_changed());
        assert!(rig.controller.snapshot().on);
    }

    #[tokio::test(start_paused = true)]
    async fn store_failure_keeps_channel_in_memory() {
        let rig = rig();
        rig.store.set_unavailable(true);

        rig.controller.set_channel(Channel::A, quiet).await;
        assert_eq!(rig.controller.snapshot().channel, Channel::A);
    }

    #[tokio::test(start_paused = true)]
    async fn timer_forces_light_on_and_rejects_second_start() {
        let rig = rig();
        let duration = TimerDuration::from_minutes(5).unwrap();

        let (ticket, t) = rig.controller.start_timer(duration, quiet).await.unwrap();
        assert!(t.power_changed());
        assert!(rig.controller.timer_running());
        assert_eq!(
            rig.controller.start_timer(duration, quiet).await.unwrap_err(),
            DeviceError::TimerBusy
        );

        let done = rig.controller.timer_elapsed(ticket, quiet).await.unwrap();
        assert!(done.power_changed());
        assert!(!rig.controller.timer_running());
        assert!(rig.controller.timer_elapsed(ticket, quiet).await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn expiry_after_manual_off_reports_no_power_change() {
        let rig = rig();
        let (ticket, _) = rig
            .controller
            .start_timer(TimerDuration::from_minutes(1).unwrap(), quiet)
            .await
            .unwrap();
        rig.controller.set_power(false, quiet).await;
        rig.relay.take_writes();

        let done = rig.controller.timer_elapsed(ticket, quiet).await.unwrap();
        assert!(!done.changed());
        assert!(rig.relay.writes().is_empty());
    }

    #[test]
    fn accumulator_skipped_while_clock_invalid() {
        let rig = rig_with(MemoryStore::new(), ManualClock::unset());
        assert!(rig.controller.tick_accumulator(quiet).is_none());
        assert!(rig.controller.reset_accumulator(quiet).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn accumulator_counts_only_while_on() {
        let rig = rig();
        rig.controller.tick_accumulator(quiet);
        rig.clock.advance_secs(100);
        rig.controller.tick_accumulator(quiet);
        assert_eq!(rig.controller.daily_on_seconds(), 0);

        rig.controller.set_power(true, quiet).await;
        rig.clock.advance_secs(130);
        let t = rig.controller.tick_accumulator(quiet).unwrap();
        assert_eq!(rig.controller.daily_on_seconds(), 130);
        assert_eq!((t.before.daily_on, t.after.daily_on), (0, 2));

        rig.clock.advance_secs(10);
        let reset = rig.controller.reset_accumulator(quiet).unwrap();
        assert_eq!(reset.after.daily_on, 0);
        assert_eq!(rig.controller.daily_on_seconds(), 0);
    }

    #[test]
    fn load_channel_defaults() {
        let store = MemoryStore::new();
        assert_eq!(load_channel(&store), Channel::AB);

        store.store_i8(Channel::STORE_KEY, 7).unwrap();
        assert_eq!(load_channel(&store), Channel::AB);

        store.store_i8(Channel::STORE_KEY, 0).unwrap();
        assert_eq!(load_channel(&store), Channel::A);

        store.set_unavailable(true);
        assert_eq!(load_channel(&store), Channel::AB);
    }
}
