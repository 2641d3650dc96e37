// Wire models for homes, devices, and mode commands.
//
// Field names follow the vendor's JSON exactly; the relay forwards these
// shapes unchanged, so the same structs serve both directions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A home (site) registered in the vendor account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Home {
    #[serde(rename = "HomeID")]
    pub id: i64,

    #[serde(rename = "Name", default)]
    pub name: Option<String>,

    /// Vendor fields we don't model, carried through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Home {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: Some(name.into()),
            extra: Map::new(),
        }
    }

    /// Human-readable label, falling back to `Home <id>` for unnamed homes.
    pub fn display_name(&self) -> String {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_owned(),
            _ => format!("Home {}", self.id),
        }
    }
}

/// Status snapshot of a single air-conditioning unit.
///
/// Codes are vendor-specific; `aircon-core` resolves them into semantic
/// modes and fan speeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub device_id: i64,
    pub device_name: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub serial_number: Option<String>,
    /// Temperature sensed by the unit, in °C.
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub target_temperature: Option<f64>,
    #[serde(default)]
    pub fan_speed: Option<i64>,
    #[serde(default)]
    pub mode_id: Option<i64>,

    /// Vendor fields we don't model, carried through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Devices of one home, keyed by device id.
pub type DeviceMap = BTreeMap<i64, Device>;

/// Fan vocabulary accepted by the vendor's set-mode command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FanSetting {
    Auto,
    Low,
    Mid,
    High,
}

impl FanSetting {
    pub const ALL: [Self; 4] = [Self::Auto, Self::Low, Self::Mid, Self::High];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Low => "low",
            Self::Mid => "mid",
            Self::High => "high",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|fan| fan.as_str() == value)
    }
}

/// Body of `POST /devices/{id}/mode`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModeRequest {
    pub mode: String,
    pub target_temperature: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fan: Option<FanSetting>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flags: Option<i64>,
}

// ── Relay envelopes ─────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HomesResponse {
    #[serde(default)]
    pub homes: Vec<Home>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DevicesResponse {
    #[serde(default)]
    pub devices: DeviceMap,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeviceResponse {
    #[serde(default)]
    pub device: Option<Device>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModeResponse {
    #[serde(default)]
    pub result: Option<Map<String, Value>>,
}

/// Error body returned by the relay for every non-2xx answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn home_keeps_unknown_vendor_fields() {
        let home: Home = serde_json::from_value(json!({
            "HomeID": 12,
            "Name": "Casa",
            "Timezone": "America/Buenos_Aires"
        }))
        .unwrap();

        assert_eq!(home.id, 12);
        assert_eq!(home.display_name(), "Casa");
        assert_eq!(
            serde_json::to_value(&home).unwrap()["Timezone"],
            "America/Buenos_Aires"
        );
    }

    #[test]
    fn device_keeps_unknown_vendor_fields() {
        let device: Device = serde_json::from_value(json!({
            "deviceId": 1,
            "deviceName": "Living",
            "modeId": 1,
            "isOnline": true,
            "swing": { "vertical": 2 }
        }))
        .unwrap();

        assert_eq!(device.mode_id, Some(1));
        assert_eq!(device.extra.len(), 2);
        let back = serde_json::to_value(&device).unwrap();
        assert_eq!(back["isOnline"], true);
        assert_eq!(back["swing"]["vertical"], 2);
        assert_eq!(back["deviceName"], "Living");
    }

    #[test]
    fn unnamed_home_falls_back_to_id() {
        let home: Home = serde_json::from_value(json!({ "HomeID": 7, "Name": null })).unwrap();
        assert_eq!(home.display_name(), "Home 7");
    }

    #[test]
    fn device_map_accepts_string_keys() {
        let devices: DeviceMap = serde_json::from_value(json!({
            "1": { "deviceId": 1, "deviceName": "Living", "modeId": 0, "targetTemperature": 22 }
        }))
        .unwrap();

        let living = &devices[&1];
        assert_eq!(living.device_name, "Living");
        assert_eq!(living.mode_id, Some(0));
        assert_eq!(living.target_temperature, Some(22.0));
        assert_eq!(living.fan_speed, None);
    }

    #[test]
    fn mode_request_omits_absent_optionals() {
        let body = ModeRequest {
            mode: "cool".into(),
            target_temperature: 22.0,
            fan: None,
            flags: None,
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({ "mode": "cool", "targetTemperature": 22.0 })
        );
    }

    #[test]
    fn fan_setting_parses_vendor_vocabulary() {
        assert_eq!(FanSetting::parse("mid"), Some(FanSetting::Mid));
        assert_eq!(FanSetting::parse("medium"), None);
    }
}
