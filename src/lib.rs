//! Dual Light - A state-managed HTTP controller for a two-channel relay light
//!
//! This library provides the device state controller for a light wired to two
//! relays (channels A and B): power, channel selection, a bounded auto-off
//! timer and daily on-time accounting, plus the HTTP property/action surface
//! that announces every change to subscribers.

pub mod api;
pub mod config;
pub mod error;
pub mod notify;
pub mod services;
pub mod state;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use api::create_router;
pub use config::Config;
pub use error::{DeviceError, InputError};
pub use notify::NotificationGateway;
pub use state::{AppState, Channel, DeviceController};
pub use utils::signals::shutdown_signal;
