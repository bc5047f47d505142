//! HTTP endpoint handlers

use std::{convert::Infallible, sync::Arc};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Json, Response,
    },
};
use futures::stream::{self, Stream};
use serde_json::{json, Value};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use crate::{
    error::{DeviceError, InputError},
    notify::Property,
    state::AppState,
};
use super::{
    framework::{self, action_code, REJECTED},
    inputs::{parse_timer_payload, timer_minutes_from_json},
    responses::{error_response, thing_description, HealthResponse, StatusResponse, TimerActionResponse},
};

fn property_body(property: Property, state: &AppState) -> Json<Value> {
    let mut body = serde_json::Map::new();
    body.insert(property.id().to_string(), json!(property.value(&state.snapshot())));
    Json(Value::Object(body))
}

fn lookup(name: &str) -> Result<Property, Response> {
    Property::from_id(name).ok_or_else(|| {
        let e = InputError::UnknownProperty(name.to_string());
        error_response(StatusCode::NOT_FOUND, &e.to_string(), REJECTED)
    })
}

/// Handle GET / - Thing description
pub async fn thing_handler() -> Json<Value> {
    Json(thing_description())
}

/// Handle GET /properties - All property values
pub async fn properties_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    let snapshot = state.snapshot();
    let values: serde_json::Map<String, Value> = Property::ALL
        .into_iter()
        .map(|p| (p.id().to_string(), json!(p.value(&snapshot))))
        .collect();
    Json(Value::Object(values))
}

/// Handle GET /properties/:name - One property value
pub async fn property_get_handler(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Response {
    match lookup(&name) {
        Ok(property) => property_body(property, &state).into_response(),
        Err(response) => response,
    }
}

/// Handle PUT /properties/:name - Write a property.
///
/// The JSON text of the value is handed to the setter unchanged, so string
/// values still carry their quotes.
pub async fn property_put_handler(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    let property = match lookup(&name) {
        Ok(property) => property,
        Err(response) => return response,
    };
    if property.read_only() {
        let e = InputError::ReadOnly(property.id());
        return error_response(StatusCode::BAD_REQUEST, &e.to_string(), REJECTED);
    }

    let Some(value) = body.get(property.id()) else {
        return error_response(
            StatusCode::BAD_REQUEST,
            &format!("body must be {{\"{}\": value}}", property.id()),
            REJECTED,
        );
    };
    let raw = value.to_string();

    let code = match property {
        Property::On => framework::set_on_off(&state, &raw).await,
        Property::Channel => framework::set_channel(&state, &raw).await,
        Property::DailyOn => REJECTED,
    };

    if code < 0 {
        return error_response(
            StatusCode::BAD_REQUEST,
            &format!("invalid value for {}: {}", property.id(), raw),
            code,
        );
    }
    info!("Property {} set to {} (code {})", property.id(), raw, code);
    property_body(property, &state).into_response()
}

/// Handle POST /actions/timer - Start the auto-off timer.
///
/// The body is normally JSON; anything that does not parse as JSON is decoded
/// as the plain `"duration":N` fragment.
pub async fn timer_action_handler(State(state): State<Arc<AppState>>, body: String) -> Response {
    let minutes = match serde_json::from_str::<Value>(&body) {
        Ok(json) => timer_minutes_from_json(&json),
        Err(_) => parse_timer_payload(&body),
    };

    let result = framework::run_timer(&state, minutes).await;
    let code = action_code(&result);

    match result {
        Ok(ticket) => {
            (StatusCode::CREATED, Json(TimerActionResponse::pending(ticket.duration, code))).into_response()
        }
        Err(DeviceError::TimerBusy) => {
            error_response(StatusCode::CONFLICT, &DeviceError::TimerBusy.to_string(), code)
        }
        Err(e) => error_response(StatusCode::BAD_REQUEST, &e.to_string(), code),
    }
}

/// Handle GET /events - Server-sent stream of property and action events.
/// Each open stream is one subscriber.
pub async fn events_handler(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.gateway.subscribe();
    info!("Subscriber connected ({} total)", state.gateway.subscriber_count());

    let events = stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    let sse = Event::default()
                        .json_data(&event)
                        .unwrap_or_else(|e| Event::default().comment(format!("encode failed: {}", e)));
                    return Some((Ok(sse), rx));
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Subscriber lagged, {} event(s) dropped", skipped);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}

/// Handle GET /status - Return current device status
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let (last_action, last_action_time) = state.get_last_action();

    Json(StatusResponse {
        states: state.snapshot(),
        daily_on_seconds: state.controller.daily_on_seconds(),
        timer_active: state.controller.timer_running(),
        timer_remaining_seconds: state.controller.timer_remaining_seconds(),
        subscribers: state.gateway.subscriber_count(),
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    })
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
