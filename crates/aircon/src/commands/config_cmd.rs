//! Config subcommand handlers.

use aircon_config::Config;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

/// Format config for display, masking sensitive fields.
fn format_config_redacted(cfg: &Config) -> String {
    use std::fmt::Write;
    let mut out = String::new();

    let _ = writeln!(out, "[relay]");
    if let Some(ref email) = cfg.relay.email {
        let _ = writeln!(out, "email = \"{}\"", aircon_core::mask_email(email));
    }
    if cfg.relay.password.is_some() {
        let _ = writeln!(out, "password = \"****\"");
    }
    let _ = writeln!(out, "listen = \"{}\"", cfg.relay.listen);
    if let Some(port) = cfg.relay.port {
        let _ = writeln!(out, "port = {port}");
    }
    if let Some(ref timeout) = cfg.relay.timeout_ms {
        let _ = writeln!(out, "timeout_ms = {}", timeout_text(timeout));
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "[client]");
    if let Some(ref url) = cfg.client.relay_url {
        let _ = writeln!(out, "relay_url = \"{url}\"");
    }

    out
}

fn timeout_text(timeout: &aircon_core::TimeoutOverride) -> String {
    match timeout {
        aircon_core::TimeoutOverride::Millis(ms) => ms.to_string(),
        aircon_core::TimeoutOverride::Text(text) => format!("\"{text}\""),
    }
}

pub fn handle(args: &ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match &args.command {
        ConfigCommand::Path => {
            output::print_output(
                &aircon_config::config_path().display().to_string(),
                global.quiet,
            );
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = aircon_config::load_config()?;
            output::print_output(format_config_redacted(&cfg).trim_end(), global.quiet);
            Ok(())
        }

        ConfigCommand::SetRelay { url } => {
            let parsed: url::Url = url.parse().map_err(|_| CliError::Validation {
                field: "url".into(),
                reason: format!("invalid URL: {url}"),
            })?;
            let mut cfg = aircon_config::load_config_or_default();
            cfg.client.relay_url = Some(parsed.to_string());
            aircon_config::save_config(&cfg)?;
            output::print_output(&format!("Relay set to {parsed}"), global.quiet);
            Ok(())
        }

        ConfigCommand::SetPassword { email, password } => {
            if password.is_empty() {
                return Err(CliError::Validation {
                    field: "password".into(),
                    reason: "must not be empty".into(),
                });
            }
            aircon_config::store_password(email, password)?;

            let mut cfg = aircon_config::load_config_or_default();
            if cfg.relay.email.as_deref() != Some(email.as_str()) {
                cfg.relay.email = Some(email.clone());
                aircon_config::save_config(&cfg)?;
            }
            output::print_output(
                &format!(
                    "Password stored in the system keyring for {}",
                    aircon_core::mask_email(email)
                ),
                global.quiet,
            );
            Ok(())
        }
    }
}
