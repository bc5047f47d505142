//! Subscriber announcements
//!
//! This module decides which properties must be pushed to subscribers after a
//! state change and delivers them over a broadcast channel.

pub mod events;
pub mod gateway;

// Re-export main types
pub use events::{ActionStatus, Property, PropertyValue, ThingEvent};
pub use gateway::{NotificationGateway, NotifyError};
