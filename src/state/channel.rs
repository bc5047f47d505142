//! Channel selection

use std::{fmt, str::FromStr};
use serde::{Deserialize, Serialize};

use crate::{error::InputError, services::RelayPin};

/// Which relay output(s) the light drives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Channel {
    #[serde(rename = "A")]
    A,
    #[serde(rename = "B")]
    B,
    #[default]
    #[serde(rename = "A+B")]
    AB,
}

impl Channel {
    /// Storage key for the persisted channel
    pub const STORE_KEY: &'static str = "curr_channel";

    pub const ALL: [Channel; 3] = [Channel::A, Channel::B, Channel::AB];

    /// Display string, also the enum value announced to subscribers
    pub fn as_str(self) -> &'static str {
        match self {
            Channel::A => "A",
            Channel::B => "B",
            Channel::AB => "A+B",
        }
    }

    /// Value written to the key-value store
    pub fn to_stored(self) -> i8 {
        match self {
            Channel::A => 0,
            Channel::B => 1,
            Channel::AB => 2,
        }
    }

    pub fn from_stored(raw: i8) -> Option<Self> {
        match raw {
            0 => Some(Channel::A),
            1 => Some(Channel::B),
            2 => Some(Channel::AB),
            _ => None,
        }
    }

    /// Whether this channel energizes `pin` while the light is on
    pub fn drives(self, pin: RelayPin) -> bool {
        matches!(
            (self, pin),
            (Channel::AB, _) | (Channel::A, RelayPin::A) | (Channel::B, RelayPin::B)
        )
    }

    /// Decode a channel value as it arrives from the property framework.
    ///
    /// Websocket clients send the JSON string with its quotes still on, so a
    /// leading `"` is stripped up to the next `"`.
    pub fn parse_raw(raw: &str) -> Result<Self, InputError> {
        let value = match raw.strip_prefix('"') {
            Some(rest) => match rest.find('"') {
                Some(end) => &rest[..end],
                None => return Err(InputError::UnterminatedQuote(raw.to_string())),
            },
            None => raw,
        };
        value.parse()
    }
}

impl FromStr for Channel {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Channel::ALL
            .into_iter()
            .find(|channel| channel.as_str() == s)
            .ok_or_else(|| InputError::UnknownChannel(s.to_string()))
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
