//! Device listing and status.

use aircon_api::Device;
use aircon_core::control::{format_temperature, live_temperature};
use aircon_core::{
    ControlState, FanSpeed, Mode, SelectionStore, SessionError, SessionSnapshot, TemperatureTrend,
};
use serde::Serialize;
use tabled::Tabled;

use crate::cli::{DevicesArgs, GlobalOpts, StatusArgs};
use crate::error::CliError;
use crate::output;

use super::{Context, Session};

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "")]
    current: &'static str,
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Model")]
    model: String,
    #[tabled(rename = "Mode")]
    mode: String,
    #[tabled(rename = "Target")]
    target: String,
    #[tabled(rename = "Room")]
    room: String,
}

fn device_row(d: &Device, current: Option<i64>) -> DeviceRow {
    let state = ControlState::from_device(d);
    DeviceRow {
        current: if Some(d.device_id) == current { "*" } else { "" },
        id: d.device_id,
        name: d.device_name.clone(),
        model: d.model.clone().unwrap_or_default(),
        mode: state.mode().to_string(),
        target: format!("{}\u{b0}", state.temperature()),
        room: format_temperature(live_temperature(d)),
    }
}

/// Devices of `args.home`, or of the remembered home, sorted by name.
pub async fn list(ctx: &Context, args: &DevicesArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let stored = ctx.store().read().unwrap_or_default();
    let home_id = args
        .home
        .or(stored.home_id)
        .ok_or(SessionError::NoHomeSelected)?;

    let mut devices = ctx
        .client
        .list_devices(home_id)
        .await
        .map_err(|e| CliError::from_relay(e, &ctx.url(), "homes"))?;
    devices.sort_by_key(|d| d.device_name.to_lowercase());
    let current = stored.device_in(home_id);

    let out = output::render_list(
        &global.output,
        &devices,
        |d| device_row(d, current),
        |d| d.device_id.to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

// ── Status view ─────────────────────────────────────────────────────

/// What `status` prints: the confirmed settings of the selected unit.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusView {
    pub home_id: Option<i64>,
    pub home_name: Option<String>,
    pub device_id: Option<i64>,
    pub device_name: Option<String>,
    pub room_temperature: Option<f64>,
    pub target_temperature: Option<i32>,
    pub mode: Option<Mode>,
    pub fan_speed: Option<FanSpeed>,
    pub power_on: bool,
    pub trend: String,
}

impl StatusView {
    pub fn from_snapshot(snap: &SessionSnapshot) -> Self {
        let device = snap.selected_device();
        let baseline = snap.baseline;
        Self {
            home_id: snap.selection.home_id,
            home_name: snap.selected_home().map(aircon_api::Home::display_name),
            device_id: snap.selection.device_id,
            device_name: device.map(|d| d.device_name.clone()),
            room_temperature: snap.live_temperature,
            target_temperature: baseline.map(ControlState::temperature),
            mode: baseline.map(ControlState::mode),
            fan_speed: baseline.map(ControlState::fan_speed),
            power_on: baseline.is_some_and(ControlState::power_on),
            trend: TemperatureTrend::new(baseline.as_ref(), snap.live_temperature).to_string(),
        }
    }

    fn detail(&self) -> String {
        let or_dash = |v: Option<String>| v.unwrap_or_else(|| "-".into());
        [
            format!("Home:    {}", or_dash(self.home_name.clone())),
            format!("Device:  {}", or_dash(self.device_name.clone())),
            format!("Power:   {}", if self.power_on { "on" } else { "off" }),
            format!("Mode:    {}", or_dash(self.mode.as_ref().map(ToString::to_string))),
            format!(
                "Target:  {}",
                self.target_temperature
                    .map_or_else(|| "--".into(), |t| format!("{t:02}\u{b0}"))
            ),
            format!("Fan:     {}", or_dash(self.fan_speed.as_ref().map(ToString::to_string))),
            format!("Room:    {}", format_temperature(self.room_temperature)),
            format!("Trend:   {}", self.trend),
        ]
        .join("\n")
    }
}

/// Print the selected device's confirmed settings.
pub fn print_status(session: &Session, global: &GlobalOpts) -> Result<(), CliError> {
    let view = StatusView::from_snapshot(&session.snapshot());
    let out = output::render_single(&global.output, &view, StatusView::detail, |v| {
        v.target_temperature
            .as_ref()
            .map_or_else(|| "--".into(), ToString::to_string)
    })?;
    output::print_output(&out, global.quiet);
    Ok(())
}

/// Select `device_id` in the session's home, rejecting devices the home
/// doesn't list.
pub async fn ensure_device(session: &Session, device_id: i64) -> Result<(), CliError> {
    let snap = session.snapshot();
    if snap.selection.device_id == Some(device_id) {
        return Ok(());
    }
    if !snap.devices.iter().any(|d| d.device_id == device_id) {
        return Err(CliError::NotFound {
            message: format!("Device {device_id} is not part of the selected home"),
            list_command: "devices".into(),
        });
    }
    session.select_device(device_id).await?;
    Ok(())
}

pub async fn status(ctx: Context, args: &StatusArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let session = ctx.session().await?;
    if let Some(device_id) = args.device {
        ensure_device(&session, device_id).await?;
    }
    if session.baseline().is_none() {
        return Err(SessionError::NoDeviceSelected.into());
    }
    print_status(&session, global)
}
