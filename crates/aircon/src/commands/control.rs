//! Setting changes: setpoint/mode/fan, power, selection.

use aircon_core::SessionError;
use tracing::debug;

use crate::cli::{GlobalOpts, PowerAction, PowerArgs, SelectArgs, SetArgs};
use crate::error::CliError;

use super::devices::{ensure_device, print_status};
use super::{Context, Session};

fn loaded(session: &Session) -> Result<(), CliError> {
    if session.baseline().is_none() {
        return Err(SessionError::NoDeviceSelected.into());
    }
    Ok(())
}

/// Apply the requested edits to pending and send them as one command.
pub async fn set(ctx: Context, args: &SetArgs, global: &GlobalOpts) -> Result<(), CliError> {
    if args.temperature.is_none() && args.step.is_none() && args.mode.is_none() && args.fan.is_none()
    {
        return Err(CliError::Validation {
            field: "set".into(),
            reason: "nothing to change; pass --temperature, --step, --mode or --fan".into(),
        });
    }
    if let Some(t) = args.temperature.filter(|t| !t.is_finite()) {
        return Err(CliError::Validation {
            field: "temperature".into(),
            reason: format!("{t} is not a temperature"),
        });
    }

    let session = ctx.session().await?;
    if let Some(device_id) = args.device {
        ensure_device(&session, device_id).await?;
    }
    loaded(&session)?;

    if let Some(t) = args.temperature {
        session.set_temperature(t)?;
    }
    if let Some(steps) = args.step {
        session.adjust_temperature(steps)?;
    }
    if let Some(mode) = args.mode {
        session.select_mode(mode.into())?;
    }
    if let Some(fan) = args.fan {
        session.select_fan_speed(fan.into())?;
    }

    match session.submit().await {
        Ok(()) => {}
        Err(SessionError::NoPendingChanges) => {
            debug!("requested settings already active");
        }
        Err(e) => return Err(e.into()),
    }
    print_status(&session, global)
}

/// Turn the unit on or off. `on`/`off` leave a unit already in that
/// state alone.
pub async fn power(ctx: Context, args: &PowerArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let session = ctx.session().await?;

    if let Some(device_id) = args.device {
        if args.action == PowerAction::Toggle {
            let device = session
                .snapshot()
                .devices
                .into_iter()
                .find(|d| d.device_id == device_id)
                .ok_or_else(|| CliError::NotFound {
                    message: format!("Device {device_id} is not part of the selected home"),
                    list_command: "devices".into(),
                })?;
            session.quick_toggle(&device).await?;
            return print_status(&session, global);
        }
        ensure_device(&session, device_id).await?;
    }
    loaded(&session)?;

    let is_on = session.baseline().is_some_and(|b| b.power_on());
    let wanted = match args.action {
        PowerAction::Toggle => !is_on,
        PowerAction::On => true,
        PowerAction::Off => false,
    };
    if wanted == is_on {
        debug!(is_on, "power already in requested state");
    } else {
        session.toggle_power().await?;
    }
    print_status(&session, global)
}

/// Remember a home (and device), loading it to confirm it exists.
pub async fn select(ctx: Context, args: &SelectArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let session = ctx.open();
    if let Err(e) = session.start().await {
        if session.snapshot().homes.is_empty() {
            return Err(e.into());
        }
        debug!(error = %e, "remembered selection failed to load");
    }

    if !session.snapshot().homes.iter().any(|h| h.id == args.home) {
        return Err(CliError::NotFound {
            message: format!("Home {} not found", args.home),
            list_command: "homes".into(),
        });
    }
    if session.selection().home_id != Some(args.home) || session.baseline().is_none() {
        session.select_home(Some(args.home)).await?;
    }
    if let Some(device_id) = args.device {
        ensure_device(&session, device_id).await?;
    }

    if session.baseline().is_some() {
        print_status(&session, global)
    } else {
        output_selection(&session, global);
        Ok(())
    }
}

fn output_selection(session: &Session, global: &GlobalOpts) {
    let selection = session.selection();
    let line = match selection.home_id {
        Some(home) => format!("Selected home {home} (no devices)"),
        None => "No home selected".into(),
    };
    crate::output::print_output(&line, global.quiet);
}
