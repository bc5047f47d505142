//! Notification gateway
//!
//! Announcements after a state change are fire-and-forget: if nobody is
//! listening the event is dropped. Only the initial full announcement is
//! retried, by the poll loop, until every property went out once.

use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::state::{DeviceSnapshot, Transition};
use super::{ActionStatus, Property, ThingEvent};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotifyError {
    #[error("no subscribers connected")]
    NoSubscribers,
}

#[derive(Debug)]
pub struct NotificationGateway {
    tx: broadcast::Sender<ThingEvent>,
    initial_sent: AtomicBool,
}

impl NotificationGateway {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self {
            tx,
            initial_sent: AtomicBool::new(false),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ThingEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Push one property value to every subscriber
    pub fn announce(
        &self,
        property: Property,
        snapshot: &DeviceSnapshot,
    ) -> Result<usize, NotifyError> {
        self.send(ThingEvent::property(property, snapshot))
    }

    /// Announce every property whose value differs across `transition`.
    /// Returns the properties that were announced.
    pub fn publish(&self, transition: &Transition) -> Vec<Property> {
        let changed: Vec<Property> = Property::ALL
            .into_iter()
            .filter(|p| p.value(&transition.before) != p.value(&transition.after))
            .collect();

        for &property in &changed {
            self.announce_lossy(property, &transition.after);
        }
        changed
    }

    /// Announce `property` whether or not its value changed
    pub fn publish_forced(&self, property: Property, snapshot: &DeviceSnapshot) {
        self.announce_lossy(property, snapshot);
    }

    /// Tell subscribers an action ran to completion
    pub fn complete_action(&self, action: &'static str) {
        let event = ThingEvent::ActionStatus {
            action,
            status: ActionStatus::Completed,
        };
        if let Err(e) = self.send(event) {
            debug!("Completion of action {} not delivered: {}", action, e);
        }
    }

    pub fn initial_announced(&self) -> bool {
        self.initial_sent.load(Ordering::Acquire)
    }

    /// Try to announce every property. Once all of them are delivered in the
    /// same attempt the handshake is done and later calls do nothing.
    pub fn announce_initial(&self, snapshot: &DeviceSnapshot) -> bool {
        if self.initial_announced() {
            return true;
        }

        // Attempt all three even if an early one fails
        let delivered = Property::ALL
            .into_iter()
            .map(|p| self.announce(p, snapshot).is_ok())
            .fold(true, |all, ok| all && ok);

        if delivered {
            self.initial_sent.store(true, Ordering::Release);
            info!("Initial property values delivered to subscribers");
        }
        delivered
    }

    fn announce_lossy(&self, property: Property, snapshot: &DeviceSnapshot) {
        match self.announce(property, snapshot) {
            Ok(n) => debug!("Announced {} to {} subscriber(s)", property, n),
            Err(e) => debug!("Announcement of {} dropped: {}", property, e),
        }
    }

    fn send(&self, event: ThingEvent) -> Result<usize, NotifyError> {
        self.tx.send(event).map_err(|_| NotifyError::NoSubscribers)
    }
}

impl Default for NotificationGateway {
    fn default() -> Self {
        Self::new(64)
    }
}
