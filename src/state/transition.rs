//! Relay pin sequences for power and channel changes
//!
//! The controller never drives pins directly from its state; it first plans the
//! sequence here and then plays it back against the relay driver. A `Settle`
//! step separates two pin writes that must not happen at the same instant.

use crate::services::RelayPin;

use super::Channel;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinStep {
    Set(RelayPin, bool),
    Settle,
}

/// Energize the pins of `channel`, A before B
pub fn power_on(channel: Channel) -> Vec<PinStep> {
    match channel {
        Channel::A => vec![PinStep::Set(RelayPin::A, true)],
        Channel::B => vec![PinStep::Set(RelayPin::B, true)],
        Channel::AB => vec![
            PinStep::Set(RelayPin::A, true),
            PinStep::Settle,
            PinStep::Set(RelayPin::B, true),
        ],
    }
}

/// De-energize both pins, A before B, whatever the channel.
/// Dropping a pin that is already low is harmless.
pub fn power_off() -> Vec<PinStep> {
    vec![
        PinStep::Set(RelayPin::A, false),
        PinStep::Settle,
        PinStep::Set(RelayPin::B, false),
    ]
}

/// Minimal sequence moving a powered light from `from` to `to`.
/// Pins whose level is the same on both sides are left alone.
pub fn switch_channel(from: Channel, to: Channel) -> Vec<PinStep> {
    use Channel::*;

    match (from, to) {
        (A, B) => vec![
            PinStep::Set(RelayPin::A, false),
            PinStep::Settle,
            PinStep::Set(RelayPin::B, true),
        ],
        (B, A) => vec![
            PinStep::Set(RelayPin::B, false),
            PinStep::Settle,
            PinStep::Set(RelayPin::A, true),
        ],
        (A, AB) => vec![PinStep::Set(RelayPin::B, true)],
        (B, AB) => vec![PinStep::Set(RelayPin::A, true)],
        (AB, A) => vec![PinStep::Set(RelayPin::B, false)],
        (AB, B) => vec![PinStep::Set(RelayPin::A, false)],
        (A, A) | (B, B) | (AB, AB) => Vec::new(),
    }
}
