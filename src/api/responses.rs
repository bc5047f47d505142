//! API response structures

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    notify::ActionStatus,
    state::{Channel, DailyAccumulator, DeviceSnapshot, TimerDuration},
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    /// Framework return code of the rejected request
    pub code: i8,
}

pub fn error_response(status: StatusCode, message: &str, code: i8) -> Response {
    (
        status,
        Json(ErrorBody {
            error: message.to_string(),
            code,
        }),
    )
        .into_response()
}

/// Reply to a timer action request
#[derive(Debug, Clone, Serialize)]
pub struct TimerActionResponse {
    pub timer: TimerActionBody,
}

#[derive(Debug, Clone, Serialize)]
pub struct TimerActionBody {
    pub input: TimerInput,
    pub status: ActionStatus,
    #[serde(rename = "timeRequested")]
    pub time_requested: DateTime<Utc>,
    pub code: i8,
}

#[derive(Debug, Clone, Serialize)]
pub struct TimerInput {
    pub duration: u32,
}

impl TimerActionResponse {
    pub fn pending(duration: TimerDuration, code: i8) -> Self {
        Self {
            timer: TimerActionBody {
                input: TimerInput {
                    duration: duration.minutes(),
                },
                status: ActionStatus::Pending,
                time_requested: Utc::now(),
                code,
            },
        }
    }
}

/// Status response with timer information
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub states: DeviceSnapshot,
    pub daily_on_seconds: u64,
    pub timer_active: bool,
    pub timer_remaining_seconds: Option<u64>,
    pub subscribers: usize,
    pub uptime: String,
    pub port: u16,
    pub host: String,
    pub last_action: Option<String>,
    pub last_action_time: Option<DateTime<Utc>>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Web Thing description of the light
pub fn thing_description() -> Value {
    let channels: Vec<&str> = Channel::ALL.iter().map(|c| c.as_str()).collect();

    json!({
        "id": "Dual light",
        "title": "Dual light",
        "@context": "https://webthings.io/schemas",
        "@type": ["Light"],
        "description": "Dual light relays",
        "properties": {
            "on": {
                "@type": "OnOffProperty",
                "title": "ON/OFF",
                "description": "on-off state",
                "type": "boolean",
                "readOnly": false,
                "links": [{ "href": "/properties/on" }]
            },
            "channel": {
                "@type": "ChannelProperty",
                "title": "Channel",
                "description": "Channel",
                "type": "string",
                "enum": channels,
                "readOnly": false,
                "links": [{ "href": "/properties/channel" }]
            },
            "daily_on": {
                "@type": "LevelProperty",
                "title": "ON minutes",
                "description": "amount of time device is ON",
                "type": "integer",
                "unit": "min",
                "minimum": 0,
                "maximum": DailyAccumulator::MAX_MINUTES,
                "readOnly": true,
                "links": [{ "href": "/properties/daily_on" }]
            }
        },
        "actions": {
            "timer": {
                "title": "Timer",
                "description": "Turn ON device for specified period of time",
                "input": {
                    "@type": "ToggleAction",
                    "type": "object",
                    "required": ["duration"],
                    "properties": {
                        "duration": {
                            "type": "integer",
                            "minimum": TimerDuration::MIN_MINUTES,
                            "maximum": TimerDuration::MAX_MINUTES,
                            "unit": "minutes"
                        }
                    }
                },
                "links": [{ "href": "/actions/timer" }]
            }
        },
        "links": [
            { "rel": "properties", "href": "/properties" },
            { "rel": "events", "href": "/events" }
        ]
    })
}
