//! Decoding of property values and action inputs
//!
//! Everything here turns loosely formatted client input into the typed values
//! the controller accepts. Nothing in this module touches device state.

use serde_json::Value;

use crate::error::InputError;

/// Longest numeric text accepted after `duration:`
const MAX_DURATION_CHARS: usize = 5;

/// Power property value: only the literal `true` switches on
pub fn parse_power(raw: &str) -> bool {
    raw == "true"
}

/// Decode a timer action payload in the text form sent by older clients,
/// e.g. `"duration":10` or `{"duration":10}`.
///
/// The text after the first `:` following `duration` may hold at most five
/// characters and must start with an integer.
pub fn parse_timer_payload(raw: &str) -> Result<i64, InputError> {
    let malformed = || InputError::MalformedTimerInput(raw.to_string());

    let after_key = &raw[raw.find("duration").ok_or_else(malformed)?..];
    let value = &after_key[after_key.find(':').ok_or_else(malformed)? + 1..];
    if value.len() > MAX_DURATION_CHARS {
        return Err(malformed());
    }

    leading_integer(value).ok_or_else(malformed)
}

/// Decode a timer action body sent as JSON. Accepts the full action request
/// `{"timer":{"input":{"duration":N}}}`, just the `{"input":{...}}` part, or
/// the bare input object. `N` may be a number or a numeric string.
pub fn timer_minutes_from_json(body: &Value) -> Result<i64, InputError> {
    let malformed = || InputError::MalformedTimerInput(body.to_string());

    let input = body
        .get("timer")
        .and_then(|timer| timer.get("input"))
        .or_else(|| body.get("input"))
        .unwrap_or(body);

    match input.get("duration").ok_or_else(malformed)? {
        Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(minutes), _) => Ok(minutes),
            // Whole floats such as 10.0 are fine, fractions are not
            (None, Some(f)) if f.fract() == 0.0 && f.abs() <= f64::from(u32::MAX) => Ok(f as i64),
            _ => Err(malformed()),
        },
        Value::String(s) if s.len() <= MAX_DURATION_CHARS => {
            s.trim().parse().map_err(|_| malformed())
        }
        _ => Err(malformed()),
    }
}

/// Integer prefix of `s` after optional whitespace and sign
fn leading_integer(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    let value: i64 = digits[..end].parse().ok()?;
    Some(if negative { -value } else { value })
}
