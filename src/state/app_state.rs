//! Main application state management

use std::{
    sync::{Arc, Mutex},
    time::Instant,
};
use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::{
    error::DeviceError,
    notify::{NotificationGateway, Property},
    tasks::auto_off_timer_task,
};
use super::{Channel, DeviceController, DeviceSnapshot, TimerDuration, TimerTicket, Transition};

/// Name of the auto-off action
pub const TIMER_ACTION: &str = "timer";

/// Couples the device controller with the notification gateway: every
/// mutation goes through here so its visible effects get announced
pub struct AppState {
    pub controller: DeviceController,
    pub gateway: NotificationGateway,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    last_action: Mutex<Option<(String, DateTime<Utc>)>>,
}

impl AppState {
    pub fn new(controller: DeviceController, gateway: NotificationGateway, port: u16, host: String) -> Self {
        Self {
            controller,
            gateway,
            start_time: Instant::now(),
            port,
            host,
            last_action: Mutex::new(None),
        }
    }

    fn record_action(&self, action: String) {
        if let Ok(mut last) = self.last_action.lock() {
            *last = Some((action, Utc::now()));
        }
    }

    fn announce(&self, transition: &Transition) {
        self.gateway.publish(transition);
    }

    pub fn snapshot(&self) -> DeviceSnapshot {
        self.controller.snapshot()
    }

    pub async fn set_power(&self, on: bool) -> Transition {
        let transition = self.controller.set_power(on, |t| self.announce(t)).await;
        self.record_action(format!("power {}", if on { "on" } else { "off" }));
        transition
    }

    pub async fn set_channel(&self, channel: Channel) -> Transition {
        let transition = self.controller.set_channel(channel, |t| self.announce(t)).await;
        self.record_action(format!("channel {}", channel));
        transition
    }

    /// Validate and arm the auto-off timer, then schedule its expiry.
    ///
    /// A running timer is reported before the duration is looked at.
    pub async fn start_timer(self: &Arc<Self>, minutes: i64) -> Result<TimerTicket, DeviceError> {
        if self.controller.timer_running() {
            return Err(DeviceError::TimerBusy);
        }
        let duration = TimerDuration::from_minutes(minutes)?;

        let (ticket, _) = self
            .controller
            .start_timer(duration, |t| self.announce(t))
            .await?;
        self.record_action(format!("timer {} min", duration.minutes()));

        tokio::spawn(auto_off_timer_task(Arc::clone(self), ticket));
        Ok(ticket)
    }

    /// Expiry of the countdown identified by `ticket`
    pub async fn timer_elapsed(&self, ticket: TimerTicket) {
        let finished = self
            .controller
            .timer_elapsed(ticket, |t| {
                self.gateway.complete_action(TIMER_ACTION);
                self.announce(t);
            })
            .await;

        match finished {
            Some(_) => self.record_action("timer finished".to_string()),
            None => debug!("Timer expiry for generation {} ignored", ticket.generation),
        }
    }

    /// One poll period: account on-time and, until it succeeds once, push
    /// every property to subscribers
    pub fn poll_tick(&self) {
        self.controller.tick_accumulator(|t| self.announce(t));

        if !self.gateway.initial_announced() {
            self.gateway.announce_initial(&self.controller.snapshot());
        }
    }

    /// Zero today's on-time; subscribers always hear about it
    pub fn reset_accumulator(&self) {
        let reset = self
            .controller
            .reset_accumulator(|t| self.gateway.publish_forced(Property::DailyOn, &t.after));
        if reset.is_some() {
            self.record_action("daily reset".to_string());
        }
    }

    /// Drive the relays off before exit
    pub async fn shutdown(&self) {
        info!("Switching light off for shutdown");
        self.controller.set_power(false, |t| self.announce(t)).await;
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        match self.last_action.lock().ok().and_then(|last| last.clone()) {
            Some((action, at)) => (Some(action), Some(at)),
            None => (None, None),
        }
    }
}
