//! Error types shared across the controller and its adapters

use thiserror::Error;

/// Rejected set requests. No state is mutated when one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    /// Channel value does not match any of "A", "B", "A+B"
    #[error("unknown channel value: {0:?}")]
    UnknownChannel(String),

    /// Channel value opened a quote that was never closed
    #[error("unterminated quote in channel value: {0:?}")]
    UnterminatedQuote(String),

    /// Timer payload has no usable `duration` field
    #[error("malformed timer input: {0:?}")]
    MalformedTimerInput(String),

    /// Timer duration outside (0, 600] minutes
    #[error("timer duration {0} is out of range [1, 600] minutes")]
    DurationOutOfRange(i64),

    /// Property cannot be written
    #[error("property {0} is read-only")]
    ReadOnly(&'static str),

    /// No property with this name
    #[error("unknown property: {0}")]
    UnknownProperty(String),
}

/// Errors returned by the device controller operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceError {
    #[error(transparent)]
    Input(#[from] InputError),

    /// A timer is already counting down
    #[error("timer is already running")]
    TimerBusy,
}

/// Relay driver failures. Logged by the controller, never propagated.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("gpio {gpio} I/O failed: {source}")]
    Io {
        gpio: u32,
        #[source]
        source: std::io::Error,
    },

    #[error("relay driver unavailable: {0}")]
    Unavailable(String),
}

/// Key-value store failures. Logged by the controller, never propagated.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("store contents are corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}
