// ── Control session ──
//
// Client-side state of one control view. Holds the confirmed device
// settings (baseline) next to the user's unsent edits (pending), and
// turns the difference into one outbound command followed by a status
// re-fetch.
//
// State lives behind a std mutex that is only taken between awaits.
// Every fetch records the epoch of the slot it fills; a later selection
// bumps the epoch, and results that come back under an old epoch are
// dropped instead of applied.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use aircon_api::{Device, Home, ModeRequest};
use tracing::{debug, info, warn};

use crate::backend::ControlBackend;
use crate::control::{
    ControlState, FanSpeed, Mode, TEMPERATURE_STEP, TemperatureTrend, live_temperature,
    round_temperature, target_label,
};
use crate::error::SessionError;
use crate::selection::{Selection, SelectionStore};

const SENDING: &str = "Sending\u{2026}";
const TURNING_ON: &str = "Turning on\u{2026}";
const TURNING_OFF: &str = "Turning off\u{2026}";

/// Where a session is in its load/edit/submit cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionPhase {
    /// No device state loaded.
    Idle,
    /// A home, device list or status fetch is in flight.
    Loading,
    /// Baseline and pending are populated.
    Ready,
    /// A command is in flight.
    Submitting,
}

#[derive(Debug)]
struct SessionState {
    homes: Vec<Home>,
    devices: Vec<Device>,
    selection: Selection,
    /// Last selection known to be persisted.
    stored: Option<Selection>,
    baseline: Option<ControlState>,
    pending: Option<ControlState>,
    live_temperature: Option<f64>,
    /// Last non-off mode each device reported, by device id.
    last_active_modes: HashMap<i64, Mode>,
    in_flight: usize,
    submitting: bool,
    error: Option<String>,
    status: Option<String>,
    home_epoch: u64,
    device_epoch: u64,
}

impl SessionState {
    fn new(stored: Option<Selection>) -> Self {
        Self {
            homes: Vec::new(),
            devices: Vec::new(),
            selection: Selection::default(),
            stored,
            baseline: None,
            pending: None,
            live_temperature: None,
            last_active_modes: HashMap::new(),
            in_flight: 0,
            submitting: false,
            error: None,
            status: None,
            home_epoch: 0,
            device_epoch: 0,
        }
    }

    fn phase(&self) -> SessionPhase {
        if self.submitting {
            SessionPhase::Submitting
        } else if self.in_flight > 0 {
            SessionPhase::Loading
        } else if self.baseline.is_some() {
            SessionPhase::Ready
        } else {
            SessionPhase::Idle
        }
    }

    fn ensure_idle(&self) -> Result<(), SessionError> {
        if self.submitting {
            Err(SessionError::Busy)
        } else {
            Ok(())
        }
    }

    fn clear_device_state(&mut self) {
        self.baseline = None;
        self.pending = None;
        self.live_temperature = None;
    }

    /// Replace baseline and pending with what `device` reports.
    fn apply_device(&mut self, device: Device) {
        let state = ControlState::from_device(&device);
        if state.power_on() {
            self.last_active_modes.insert(device.device_id, state.mode());
        }
        self.baseline = Some(state);
        self.pending = Some(state);
        self.live_temperature = live_temperature(&device);

        match self
            .devices
            .iter_mut()
            .find(|d| d.device_id == device.device_id)
        {
            Some(entry) => *entry = device,
            None => self.devices.push(device),
        }
    }

    /// Mode a unit turns back on in; `auto` until it was seen running.
    fn last_active_mode(&self, device_id: i64) -> Mode {
        self.last_active_modes
            .get(&device_id)
            .copied()
            .unwrap_or(Mode::Auto)
    }

    fn fail(&mut self, err: SessionError) -> SessionError {
        warn!(error = %err, "control session operation failed");
        self.error = Some(err.to_string());
        err
    }

    fn finish_load(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
    }
}

/// Point-in-time copy of a session, for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub homes: Vec<Home>,
    pub devices: Vec<Device>,
    pub selection: Selection,
    pub baseline: Option<ControlState>,
    pub pending: Option<ControlState>,
    pub live_temperature: Option<f64>,
    pub phase: SessionPhase,
    pub error: Option<String>,
    pub status: Option<String>,
}

impl SessionSnapshot {
    pub fn has_pending_changes(&self) -> bool {
        pending_differs(self.baseline, self.pending)
    }

    pub fn selected_device(&self) -> Option<&Device> {
        let id = self.selection.device_id?;
        self.devices.iter().find(|d| d.device_id == id)
    }

    pub fn selected_home(&self) -> Option<&Home> {
        let id = self.selection.home_id?;
        self.homes.iter().find(|h| h.id == id)
    }

    pub fn trend(&self) -> TemperatureTrend {
        TemperatureTrend::new(self.baseline.as_ref(), self.live_temperature)
    }

    pub fn target_label(&self) -> String {
        target_label(self.pending.as_ref())
    }
}

fn pending_differs(baseline: Option<ControlState>, pending: Option<ControlState>) -> bool {
    matches!((baseline, pending), (Some(b), Some(p)) if b != p)
}

/// Control surface for the homes and devices of one account.
pub struct ControlSession<B, S> {
    backend: B,
    store: S,
    state: Mutex<SessionState>,
}

impl<B: ControlBackend, S: SelectionStore> ControlSession<B, S> {
    /// Create a session, reading the persisted selection once.
    pub fn new(backend: B, store: S) -> Self {
        let stored = store.read();
        debug!(?stored, "control session created");
        Self {
            backend,
            store,
            state: Mutex::new(SessionState::new(stored)),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn persist(&self, state: &mut SessionState) {
        self.store.write(&state.selection);
        state.stored = Some(state.selection);
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn snapshot(&self) -> SessionSnapshot {
        let s = self.lock();
        SessionSnapshot {
            homes: s.homes.clone(),
            devices: s.devices.clone(),
            selection: s.selection,
            baseline: s.baseline,
            pending: s.pending,
            live_temperature: s.live_temperature,
            phase: s.phase(),
            error: s.error.clone(),
            status: s.status.clone(),
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.lock().phase()
    }

    pub fn selection(&self) -> Selection {
        self.lock().selection
    }

    pub fn baseline(&self) -> Option<ControlState> {
        self.lock().baseline
    }

    pub fn pending(&self) -> Option<ControlState> {
        self.lock().pending
    }

    pub fn error(&self) -> Option<String> {
        self.lock().error.clone()
    }

    pub fn has_pending_changes(&self) -> bool {
        let s = self.lock();
        pending_differs(s.baseline, s.pending)
    }

    /// Edits are accepted when device state is loaded and no command is
    /// in flight.
    pub fn edits_allowed(&self) -> bool {
        let s = self.lock();
        !s.submitting && s.pending.is_some()
    }

    // ── Loading ──────────────────────────────────────────────────────

    /// Fetch the homes and select the stored home, or the first one.
    pub async fn start(&self) -> Result<(), SessionError> {
        let epoch = {
            let mut s = self.lock();
            s.ensure_idle()?;
            s.error = None;
            s.in_flight += 1;
            s.home_epoch
        };

        let result = self.backend.fetch_homes().await;

        let next_home = {
            let mut s = self.lock();
            s.finish_load();
            let homes = result.map_err(|e| s.fail(e.into()))?;
            let stored_home = s
                .stored
                .and_then(|sel| sel.home_id)
                .filter(|id| homes.iter().any(|h| h.id == *id));
            let next = stored_home.or_else(|| homes.first().map(|h| h.id));
            info!(count = homes.len(), "homes loaded");
            s.homes = homes;
            if s.home_epoch != epoch {
                debug!("home chosen while loading homes; keeping it");
                return Ok(());
            }
            next
        };

        self.select_home(next_home).await
    }

    /// Switch to `home_id` (or to no home) and load its devices.
    pub async fn select_home(&self, home_id: Option<i64>) -> Result<(), SessionError> {
        let (home_id, preferred, epoch) = {
            let mut s = self.lock();
            s.ensure_idle()?;
            let preferred = home_id
                .zip(s.stored)
                .and_then(|(home, stored)| stored.device_in(home));

            s.home_epoch += 1;
            s.device_epoch += 1;
            s.selection = Selection::new(home_id, None);
            s.devices.clear();
            s.clear_device_state();
            s.error = None;
            self.persist(&mut s);

            let Some(home_id) = home_id else {
                return Ok(());
            };
            s.in_flight += 1;
            (home_id, preferred, s.home_epoch)
        };

        let result = self.backend.fetch_devices(home_id).await;

        let next_device = {
            let mut s = self.lock();
            s.finish_load();
            if s.home_epoch != epoch {
                debug!(home_id, "discarding stale device list");
                return Ok(());
            }
            let mut devices = result.map_err(|e| s.fail(e.into()))?;
            devices.sort_by_key(|d| d.device_name.to_lowercase());

            let next = preferred
                .filter(|id| devices.iter().any(|d| d.device_id == *id))
                .or_else(|| devices.first().map(|d| d.device_id));
            info!(home_id, count = devices.len(), "devices loaded");
            s.devices = devices;
            next
        };

        match next_device {
            Some(device_id) => self.select_device(device_id).await,
            None => Ok(()),
        }
    }

    /// Switch to `device_id` within the selected home and load its status.
    pub async fn select_device(&self, device_id: i64) -> Result<(), SessionError> {
        let (home_id, epoch) = {
            let mut s = self.lock();
            s.ensure_idle()?;
            let home_id = s.selection.home_id.ok_or(SessionError::NoHomeSelected)?;
            s.device_epoch += 1;
            s.selection.device_id = Some(device_id);
            s.clear_device_state();
            s.error = None;
            self.persist(&mut s);
            s.in_flight += 1;
            (home_id, s.device_epoch)
        };

        self.load_status(home_id, device_id, epoch).await
    }

    /// Re-fetch the selected device's status.
    pub async fn refresh(&self) -> Result<(), SessionError> {
        let (home_id, device_id, epoch) = {
            let mut s = self.lock();
            s.ensure_idle()?;
            let home_id = s.selection.home_id.ok_or(SessionError::NoHomeSelected)?;
            let device_id = s.selection.device_id.ok_or(SessionError::NoDeviceSelected)?;
            s.error = None;
            s.in_flight += 1;
            (home_id, device_id, s.device_epoch)
        };

        self.load_status(home_id, device_id, epoch).await
    }

    async fn load_status(
        &self,
        home_id: i64,
        device_id: i64,
        epoch: u64,
    ) -> Result<(), SessionError> {
        let result = self.backend.fetch_device_status(home_id, device_id).await;

        let mut s = self.lock();
        s.finish_load();
        if s.device_epoch != epoch {
            debug!(home_id, device_id, "discarding stale device status");
            return Ok(());
        }
        match result {
            Ok(Some(device)) => {
                s.apply_device(device);
                Ok(())
            }
            Ok(None) => Err(s.fail(SessionError::DeviceUnavailable { device_id })),
            Err(e) => Err(s.fail(e.into())),
        }
    }

    // ── Local edits ──────────────────────────────────────────────────

    /// Apply `edit` to pending. A no-op without loaded device state.
    fn edit(&self, edit: impl FnOnce(ControlState) -> ControlState) -> Result<(), SessionError> {
        let mut s = self.lock();
        s.ensure_idle()?;
        if let Some(pending) = s.pending {
            s.pending = Some(edit(pending));
        }
        Ok(())
    }

    /// Move the pending setpoint by `steps` increments.
    pub fn adjust_temperature(&self, steps: i32) -> Result<(), SessionError> {
        self.edit(|p| {
            p.with_temperature(
                p.temperature()
                    .saturating_add(steps.saturating_mul(TEMPERATURE_STEP)),
            )
        })
    }

    /// Set the pending setpoint. Non-finite values are ignored.
    pub fn set_temperature(&self, value: f64) -> Result<(), SessionError> {
        if !value.is_finite() {
            return Ok(());
        }
        self.edit(|p| p.with_temperature(round_temperature(value)))
    }

    /// Pick an operating mode. Turning the unit off goes through
    /// [`toggle_power`](Self::toggle_power).
    pub fn select_mode(&self, mode: Mode) -> Result<(), SessionError> {
        if !mode.is_on() {
            return Err(SessionError::ModeOff);
        }
        self.edit(|p| p.with_mode(mode))
    }

    pub fn select_fan_speed(&self, fan_speed: FanSpeed) -> Result<(), SessionError> {
        self.edit(|p| p.with_fan_speed(fan_speed))
    }

    /// Drop pending edits.
    pub fn discard_changes(&self) -> Result<(), SessionError> {
        let mut s = self.lock();
        s.ensure_idle()?;
        s.pending = s.baseline;
        Ok(())
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Send pending edits, then reload the device's confirmed state.
    pub async fn submit(&self) -> Result<(), SessionError> {
        let (home_id, device_id, request) = {
            let mut s = self.lock();
            s.ensure_idle()?;
            let (home_id, device_id) = selected(&s)?;
            let (Some(baseline), Some(pending)) = (s.baseline, s.pending) else {
                return Err(SessionError::NoDeviceSelected);
            };
            if baseline == pending {
                return Err(SessionError::NoPendingChanges);
            }
            s.submitting = true;
            s.status = Some(SENDING.into());
            s.error = None;
            (home_id, device_id, pending.to_request())
        };

        self.dispatch(home_id, device_id, request).await
    }

    /// Turn the selected unit on (in its last active mode) or off, right
    /// away. Setpoint and fan speed come from the baseline.
    pub async fn toggle_power(&self) -> Result<(), SessionError> {
        let (home_id, device_id, request) = {
            let mut s = self.lock();
            s.ensure_idle()?;
            let (home_id, device_id) = selected(&s)?;
            let baseline = s.baseline.ok_or(SessionError::NoDeviceSelected)?;
            let target = power_toggled(baseline, s.last_active_mode(device_id));
            s.submitting = true;
            s.status = Some(power_status(target));
            s.error = None;
            (home_id, device_id, target.to_request())
        };

        self.dispatch(home_id, device_id, request).await
    }

    /// Toggle power of a listed device, selecting it first if needed.
    /// The toggle follows the freshly loaded baseline, or the listed
    /// entry when the device is not the loaded one.
    pub async fn quick_toggle(&self, device: &Device) -> Result<(), SessionError> {
        if self.selection().device_id != Some(device.device_id) {
            self.select_device(device.device_id).await?;
        }

        let (home_id, request) = {
            let mut s = self.lock();
            s.ensure_idle()?;
            let home_id = s.selection.home_id.ok_or(SessionError::NoHomeSelected)?;
            let current = match s.baseline {
                Some(baseline) if s.selection.device_id == Some(device.device_id) => baseline,
                _ => ControlState::from_device(device),
            };
            let target = power_toggled(current, s.last_active_mode(device.device_id));
            s.submitting = true;
            s.status = Some(power_status(target));
            s.error = None;
            (home_id, target.to_request())
        };

        self.dispatch(home_id, device.device_id, request).await
    }

    /// Send `request`, then replace baseline and pending with the
    /// re-fetched status. Failures leave both untouched.
    async fn dispatch(
        &self,
        home_id: i64,
        device_id: i64,
        request: ModeRequest,
    ) -> Result<(), SessionError> {
        debug!(device_id, mode = %request.mode, "sending mode command");
        let sent = self.backend.update_device_mode(device_id, &request).await;
        if let Err(e) = sent {
            let mut s = self.lock();
            s.submitting = false;
            s.status = None;
            return Err(s.fail(e.into()));
        }

        let refreshed = self.backend.fetch_device_status(home_id, device_id).await;

        let mut s = self.lock();
        s.submitting = false;
        s.status = None;
        match refreshed {
            Ok(Some(device)) => {
                info!(device_id, mode = %request.mode, "device updated");
                s.apply_device(device);
                Ok(())
            }
            Ok(None) => Err(s.fail(SessionError::RefreshMissing)),
            Err(e) => Err(s.fail(e.into())),
        }
    }
}

fn selected(state: &SessionState) -> Result<(i64, i64), SessionError> {
    let home_id = state.selection.home_id.ok_or(SessionError::NoHomeSelected)?;
    let device_id = state
        .selection
        .device_id
        .ok_or(SessionError::NoDeviceSelected)?;
    Ok((home_id, device_id))
}

fn power_toggled(current: ControlState, last_active_mode: Mode) -> ControlState {
    if current.power_on() {
        current.with_mode(Mode::Off)
    } else {
        current.with_mode(last_active_mode)
    }
}

fn power_status(target: ControlState) -> String {
    if target.power_on() {
        TURNING_ON.into()
    } else {
        TURNING_OFF.into()
    }
}
