// ── Control values and their derivation from raw devices ──
//
// Vendor devices report numeric mode and fan codes plus loose
// temperatures. Everything here turns those into a `ControlState`
// that is always in range and never fails to resolve.

use std::fmt;

use serde::Serialize;
use serde::ser::SerializeStruct;
use strum::{Display, EnumString, IntoStaticStr};

use aircon_api::{Device, FanSetting, ModeRequest};

pub const TEMPERATURE_MIN: i32 = 16;
pub const TEMPERATURE_MAX: i32 = 30;
pub const TEMPERATURE_STEP: i32 = 1;
/// Setpoint assumed when the vendor doesn't report one.
pub const DEFAULT_TEMPERATURE: i32 = 24;

const DEGREE: char = '\u{b0}';

// ── Mode ────────────────────────────────────────────────────────────

/// Operating mode of a unit.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr, Serialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Off,
    Cool,
    Heat,
    Dry,
    Fan,
    Auto,
}

impl Mode {
    /// Modes a user can pick while the unit is on.
    pub const ACTIVE: [Self; 5] = [Self::Cool, Self::Heat, Self::Dry, Self::Fan, Self::Auto];

    /// Resolve a vendor mode code. Unknown or missing codes are `Auto`.
    pub fn from_code(code: Option<i64>) -> Self {
        match code {
            Some(0) => Self::Off,
            Some(1) => Self::Cool,
            Some(2) => Self::Heat,
            Some(3) => Self::Dry,
            Some(4) => Self::Fan,
            _ => Self::Auto,
        }
    }

    /// Name used in the vendor's set-mode command.
    pub fn vendor_name(self) -> &'static str {
        match self {
            Self::Fan => "fan_only",
            other => other.into(),
        }
    }

    pub fn is_on(self) -> bool {
        self != Self::Off
    }
}

// ── FanSpeed ────────────────────────────────────────────────────────

/// Requested air-flow intensity.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr, Serialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum FanSpeed {
    Auto,
    Low,
    Medium,
    High,
}

impl FanSpeed {
    pub const ALL: [Self; 4] = [Self::Auto, Self::Low, Self::Medium, Self::High];

    /// Resolve a vendor fan code. Unknown or missing codes are `Auto`.
    pub fn from_code(code: Option<i64>) -> Self {
        match code {
            Some(1) => Self::Low,
            Some(2) => Self::Medium,
            Some(3) => Self::High,
            _ => Self::Auto,
        }
    }

    /// Fan vocabulary of the vendor's set-mode command (`medium` is `mid`).
    pub fn to_setting(self) -> FanSetting {
        match self {
            Self::Auto => FanSetting::Auto,
            Self::Low => FanSetting::Low,
            Self::Medium => FanSetting::Mid,
            Self::High => FanSetting::High,
        }
    }
}

pub fn resolve_mode(code: Option<i64>) -> Mode {
    Mode::from_code(code)
}

pub fn resolve_fan_speed(code: Option<i64>) -> FanSpeed {
    FanSpeed::from_code(code)
}

// ── Temperatures ────────────────────────────────────────────────────

pub fn clamp_temperature(value: i32) -> i32 {
    value.clamp(TEMPERATURE_MIN, TEMPERATURE_MAX)
}

/// Round a reported setpoint to a whole degree inside the allowed range.
/// Non-finite input falls back to [`DEFAULT_TEMPERATURE`].
#[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
pub fn round_temperature(value: f64) -> i32 {
    if !value.is_finite() {
        return DEFAULT_TEMPERATURE;
    }
    // Clamped before the cast, so the value always fits.
    let clamped = value
        .round()
        .clamp(f64::from(TEMPERATURE_MIN), f64::from(TEMPERATURE_MAX));
    clamped as i32
}

/// Sensed temperature rounded to one decimal, if the unit reports one.
pub fn live_temperature(device: &Device) -> Option<f64> {
    device
        .temperature
        .filter(|t| t.is_finite())
        .map(|t| (t * 10.0).round() / 10.0)
}

// ── ControlState ────────────────────────────────────────────────────

/// The user-controllable settings of one unit.
///
/// Fields are private so every instance goes through a constructor that
/// clamps the temperature. Power is derived from the mode, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ControlState {
    temperature: i32,
    mode: Mode,
    fan_speed: FanSpeed,
}

impl ControlState {
    pub fn new(temperature: i32, mode: Mode, fan_speed: FanSpeed) -> Self {
        Self {
            temperature: clamp_temperature(temperature),
            mode,
            fan_speed,
        }
    }

    /// Derive the control values a raw vendor device currently reports.
    pub fn from_device(device: &Device) -> Self {
        let temperature = device
            .target_temperature
            .map_or(DEFAULT_TEMPERATURE, round_temperature);
        Self::new(
            temperature,
            resolve_mode(device.mode_id),
            resolve_fan_speed(device.fan_speed),
        )
    }

    pub fn temperature(self) -> i32 {
        self.temperature
    }

    pub fn mode(self) -> Mode {
        self.mode
    }

    pub fn fan_speed(self) -> FanSpeed {
        self.fan_speed
    }

    pub fn power_on(self) -> bool {
        self.mode.is_on()
    }

    pub fn with_temperature(self, temperature: i32) -> Self {
        Self::new(temperature, self.mode, self.fan_speed)
    }

    pub fn with_mode(self, mode: Mode) -> Self {
        Self { mode, ..self }
    }

    pub fn with_fan_speed(self, fan_speed: FanSpeed) -> Self {
        Self { fan_speed, ..self }
    }

    /// The vendor command that applies this state.
    pub fn to_request(self) -> ModeRequest {
        ModeRequest {
            mode: self.mode.vendor_name().to_owned(),
            target_temperature: f64::from(self.temperature),
            fan: Some(self.fan_speed.to_setting()),
            flags: None,
        }
    }
}

impl Serialize for ControlState {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ControlState", 4)?;
        state.serialize_field("temperature", &self.temperature)?;
        state.serialize_field("mode", &self.mode)?;
        state.serialize_field("fanSpeed", &self.fan_speed)?;
        state.serialize_field("powerOn", &self.power_on())?;
        state.end()
    }
}

// ── Display helpers ─────────────────────────────────────────────────

/// Where the room temperature is heading relative to the confirmed setpoint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TemperatureTrend {
    NoDevice,
    Off,
    SensorUnavailable,
    Stable,
    Heating(f64),
    Cooling(f64),
}

impl TemperatureTrend {
    pub fn new(baseline: Option<&ControlState>, live: Option<f64>) -> Self {
        let Some(baseline) = baseline else {
            return Self::NoDevice;
        };
        if !baseline.power_on() {
            return Self::Off;
        }
        let Some(live) = live else {
            return Self::SensorUnavailable;
        };

        let diff = ((f64::from(baseline.temperature()) - live) * 10.0).round() / 10.0;
        if diff.abs() < 0.2 {
            Self::Stable
        } else if diff > 0.0 {
            Self::Heating(diff)
        } else {
            Self::Cooling(diff.abs())
        }
    }
}

impl fmt::Display for TemperatureTrend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoDevice => f.write_str("Select a device"),
            Self::Off => f.write_str("Off"),
            Self::SensorUnavailable => f.write_str("Sensor unavailable"),
            Self::Stable => f.write_str("Temperature stable"),
            Self::Heating(delta) => write!(f, "Heating {delta:.1}{DEGREE}"),
            Self::Cooling(delta) => write!(f, "Cooling {delta:.1}{DEGREE}"),
        }
    }
}

/// Two-digit setpoint label, `--` without a loaded state.
pub fn target_label(state: Option<&ControlState>) -> String {
    state.map_or_else(|| "--".into(), |s| format!("{:02}", s.temperature()))
}

/// Temperature with one decimal and a degree sign, `--` when unknown.
pub fn format_temperature(value: Option<f64>) -> String {
    value.map_or_else(|| format!("--{DEGREE}"), |t| format!("{t:.1}{DEGREE}"))
}
