//! Shared test harness: an `AppState` wired to in-memory adapters

#![allow(dead_code)]

use std::sync::Arc;
use tokio::sync::broadcast;

use dual_light::{
    notify::{NotificationGateway, Property, ThingEvent},
    services::{KeyValueStore, ManualClock, MemoryRelay, MemoryStore},
    state::{AppState, Channel, DeviceController, DEFAULT_SETTLE},
};

pub struct Harness {
    pub relay: Arc<MemoryRelay>,
    pub store: Arc<MemoryStore>,
    pub clock: Arc<ManualClock>,
    pub state: Arc<AppState>,
}

pub fn harness() -> Harness {
    harness_with(MemoryStore::new(), ManualClock::synced())
}

/// Harness whose persisted channel is already `channel`
pub fn harness_on_channel(channel: Channel) -> Harness {
    let store = MemoryStore::new();
    store
        .store_i8(Channel::STORE_KEY, channel.to_stored())
        .expect("memory store write");
    harness_with(store, ManualClock::synced())
}

pub fn harness_with(store: MemoryStore, clock: ManualClock) -> Harness {
    let relay = Arc::new(MemoryRelay::new());
    let store = Arc::new(store);
    let clock = Arc::new(clock);
    let controller =
        DeviceController::new(relay.clone(), store.clone(), clock.clone(), DEFAULT_SETTLE);
    let state = Arc::new(AppState::new(
        controller,
        NotificationGateway::default(),
        8888,
        "127.0.0.1".to_string(),
    ));

    Harness {
        relay,
        store,
        clock,
        state,
    }
}

pub fn drain(rx: &mut broadcast::Receiver<ThingEvent>) -> Vec<ThingEvent> {
    std::iter::from_fn(|| rx.try_recv().ok()).collect()
}

pub fn announced(events: &[ThingEvent], property: Property) -> usize {
    events
        .iter()
        .filter(|e| e.announced_property() == Some(property))
        .count()
}
