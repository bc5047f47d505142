//! State management module
//!
//! This module contains the device data model, the pin transition planner and
//! the controller that serialises every change to it.

pub mod accumulator;
pub mod app_state;
pub mod channel;
pub mod controller;
pub mod device_state;
pub mod timer_state;
pub mod transition;

// Re-export main types
pub use accumulator::DailyAccumulator;
pub use app_state::{AppState, TIMER_ACTION};
pub use channel::Channel;
pub use controller::{load_channel, DeviceController, DEFAULT_SETTLE};
pub use device_state::{DeviceSnapshot, DeviceState, Transition};
pub use timer_state::{TimerDuration, TimerState, TimerTicket};
pub use transition::PinStep;
