//! Hardware and platform adapters
//!
//! This module contains the relay driver, the durable key-value store and the
//! clock source the device controller talks to.

pub mod clock;
pub mod relay;
pub mod storage;

// Re-export main types
pub use clock::{Clock, ManualClock, SystemClock};
pub use relay::{MemoryRelay, RelayDriver, RelayPin, SysfsRelay};
pub use storage::{JsonFileStore, KeyValueStore, MemoryStore};
