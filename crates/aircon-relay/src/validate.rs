// Boundary validation of path parameters and request bodies.
//
// Runs before the command relay is touched: anything rejected here is
// answered with 400 and never reaches the vendor.

use aircon_api::{FanSetting, ModeRequest};
use serde_json::Value;

use crate::error::ApiError;

/// Parse a numeric path id. It must be a finite whole number.
#[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
pub fn parse_numeric_param(name: &str, raw: &str) -> Result<i64, ApiError> {
    let invalid = || ApiError::invalid_parameter(format!("{name} must be a valid number."));

    let raw = raw.trim();
    if raw.is_empty() {
        return Err(invalid());
    }
    if let Ok(id) = raw.parse::<i64>() {
        return Ok(id);
    }

    let value: f64 = raw.parse().map_err(|_| invalid())?;
    // Range-checked above the cast, so it never saturates.
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 9.0e15 {
        Ok(value as i64)
    } else {
        Err(invalid())
    }
}

/// Validate a `POST /devices/{id}/mode` body into a vendor command.
pub fn validate_mode_body(body: Option<&Value>) -> Result<ModeRequest, ApiError> {
    let Some(Value::Object(body)) = body else {
        return Err(ApiError::invalid_body("Request body must be a JSON object."));
    };

    let mode = body
        .get("mode")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .ok_or_else(|| ApiError::invalid_body("mode is required."))?;

    let target_temperature = body
        .get("targetTemperature")
        .and_then(numeric)
        .filter(|t| t.is_finite())
        .ok_or_else(|| ApiError::invalid_body("targetTemperature must be a valid number."))?;

    let fan = match body.get("fan") {
        None | Some(Value::Null) => None,
        Some(value) => Some(value.as_str().and_then(FanSetting::parse).ok_or_else(|| {
            ApiError::invalid_body("fan must be one of: auto, low, mid, high.")
        })?),
    };

    let flags = match body.get("flags") {
        None | Some(Value::Null) => None,
        Some(value) => Some(
            value
                .as_i64()
                .ok_or_else(|| ApiError::invalid_body("flags must be an integer."))?,
        ),
    };

    Ok(ModeRequest {
        mode: mode.to_owned(),
        target_temperature,
        fan,
        flags,
    })
}

/// A JSON number, or a string holding one.
fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
