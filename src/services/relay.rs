//! Relay drivers for the two light channels

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Mutex,
    thread,
    time::Duration,
};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::RelayError;

/// One of the two physical relay outputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RelayPin {
    A,
    B,
}

impl RelayPin {
    pub const ALL: [RelayPin; 2] = [RelayPin::A, RelayPin::B];
}

/// Synchronous pin driver used by the device controller
pub trait RelayDriver: Send + Sync {
    /// Drive `pin` high (`true`) or low (`false`)
    fn set_level(&self, pin: RelayPin, on: bool) -> Result<(), RelayError>;
}

/// Relay driver backed by the Linux sysfs GPIO interface
#[derive(Debug)]
pub struct SysfsRelay {
    root: PathBuf,
    gpio_a: u32,
    gpio_b: u32,
}

impl SysfsRelay {
    /// Export both lines as outputs and drive them low
    pub fn open(root: impl Into<PathBuf>, gpio_a: u32, gpio_b: u32) -> Result<Self, RelayError> {
        let relay = Self {
            root: root.into(),
            gpio_a,
            gpio_b,
        };

        for gpio in [gpio_a, gpio_b] {
            relay.export(gpio)?;
        }
        for pin in RelayPin::ALL {
            relay.set_level(pin, false)?;
        }

        info!("Relay GPIOs {} (A) and {} (B) ready under {}", gpio_a, gpio_b, relay.root.display());
        Ok(relay)
    }

    fn gpio(&self, pin: RelayPin) -> u32 {
        match pin {
            RelayPin::A => self.gpio_a,
            RelayPin::B => self.gpio_b,
        }
    }

    fn line_dir(&self, gpio: u32) -> PathBuf {
        self.root.join(format!("gpio{}", gpio))
    }

    fn export(&self, gpio: u32) -> Result<(), RelayError> {
        let io_err = |source| RelayError::Io { gpio, source };
        let line = self.line_dir(gpio);

        if !line.exists() {
            debug!("Exporting gpio{}", gpio);
            fs::write(self.root.join("export"), gpio.to_string()).map_err(io_err)?;
            // udev needs a moment to fix permissions on the new line
            wait_for(&line.join("direction"));
        }

        fs::write(line.join("direction"), "out").map_err(io_err)
    }
}

fn wait_for(path: &Path) {
    for _ in 0..10 {
        if path.exists() {
            return;
        }
        thread::sleep(Duration::from_millis(10));
    }
}

impl RelayDriver for SysfsRelay {
    fn set_level(&self, pin: RelayPin, on: bool) -> Result<(), RelayError> {
        let gpio = self.gpio(pin);
        fs::write(self.line_dir(gpio).join("value"), if on { "1" } else { "0" })
            .map_err(|source| RelayError::Io { gpio, source })
    }
}

/// In-memory relay that records every write, used for simulation and tests
#[derive(Debug, Default)]
pub struct MemoryRelay {
    inner: Mutex<MemoryRelayInner>,
}

#[derive(Debug, Default)]
struct MemoryRelayInner {
    levels: [bool; 2],
    writes: Vec<(RelayPin, bool)>,
    failing: bool,
}

impl MemoryRelay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current level of a pin
    pub fn level(&self, pin: RelayPin) -> bool {
        self.lock().levels[index(pin)]
    }

    /// Every write since creation (or the last `take_writes`), in order
    pub fn writes(&self) -> Vec<(RelayPin, bool)> {
        self.lock().writes.clone()
    }

    /// Drain the recorded writes
    pub fn take_writes(&self) -> Vec<(RelayPin, bool)> {
        std::mem::take(&mut self.lock().writes)
    }

    /// Make every following write fail (levels still update, mimicking a
    /// driver that reports an error after the fact)
    pub fn set_failing(&self, failing: bool) {
        self.lock().failing = failing;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryRelayInner> {
        self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

fn index(pin: RelayPin) -> usize {
    match pin {
        RelayPin::A => 0,
        RelayPin::B => 1,
    }
}

impl RelayDriver for MemoryRelay {
    fn set_level(&self, pin: RelayPin, on: bool) -> Result<(), RelayError> {
        let mut inner = self.lock();
        inner.levels[index(pin)] = on;
        inner.writes.push((pin, on));
        if inner.failing {
            return Err(RelayError::Unavailable(format!("simulated failure on {:?}", pin)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_relay_tracks_levels_and_writes() {
        let relay = MemoryRelay::new();
        relay.set_level(RelayPin::A, true).unwrap();
        relay.set_level(RelayPin::B, false).unwrap();

        assert!(relay.level(RelayPin::A));
        assert!(!relay.level(RelayPin::B));
        assert_eq!(relay.take_writes(), vec![(RelayPin::A, true), (RelayPin::B, false)]);
        assert!(relay.writes().is_empty());
    }

    #[test]
    fn failing_memory_relay_reports_error() {
        let relay = MemoryRelay::new();
        relay.set_failing(true);

        assert!(relay.set_level(RelayPin::B, true).is_err());
        assert!(relay.level(RelayPin::B));
    }
}
