//! Property and action events pushed to subscribers

use std::fmt;
use serde::{Serialize, Serializer};

use crate::state::DeviceSnapshot;

/// Reported properties of the light
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Property {
    On,
    Channel,
    DailyOn,
}

impl Property {
    pub const ALL: [Property; 3] = [Property::Channel, Property::On, Property::DailyOn];

    /// Property id as used on the wire
    pub fn id(self) -> &'static str {
        match self {
            Property::On => "on",
            Property::Channel => "channel",
            Property::DailyOn => "daily_on",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Property::ALL.into_iter().find(|p| p.id() == id)
    }

    pub fn read_only(self) -> bool {
        matches!(self, Property::DailyOn)
    }

    /// Current value of this property in `snapshot`
    pub fn value(self, snapshot: &DeviceSnapshot) -> PropertyValue {
        match self {
            Property::On => PropertyValue::Bool(snapshot.on),
            Property::Channel => PropertyValue::Text(snapshot.channel.as_str()),
            Property::DailyOn => PropertyValue::Integer(snapshot.daily_on),
        }
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl Serialize for Property {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.id())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Text(&'static str),
    Integer(u64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionStatus {
    Pending,
    Completed,
}

/// One announcement to subscribers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "messageType", content = "data", rename_all = "camelCase")]
pub enum ThingEvent {
    PropertyStatus {
        property: Property,
        value: PropertyValue,
    },
    ActionStatus {
        action: &'static str,
        status: ActionStatus,
    },
}

impl ThingEvent {
    pub fn property(property: Property, snapshot: &DeviceSnapshot) -> Self {
        ThingEvent::PropertyStatus {
            property,
            value: property.value(snapshot),
        }
    }

    /// Property this event announces, if any
    pub fn announced_property(&self) -> Option<Property> {
        match self {
            ThingEvent::PropertyStatus { property, .. } => Some(*property),
            ThingEvent::ActionStatus { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Channel;

    #[test]
    fn property_events_serialize_with_message_type() {
        let snapshot = DeviceSnapshot {
            on: true,
            channel: Channel::AB,
            daily_on: 12,
        };
        let json = serde_json::to_value(ThingEvent::property(Property::Channel, &snapshot)).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "messageType": "propertyStatus",
                "data": { "property": "channel", "value": "A+B" }
            })
        );
    }

    #[test]
    fn ids_round_trip() {
        for property in Property::ALL {
            assert_eq!(Property::from_id(property.id()), Some(property));
        }
        assert_eq!(Property::from_id("brightness"), None);
        assert!(Property::DailyOn.read_only());
        assert!(!Property::Channel.read_only());
    }
}
