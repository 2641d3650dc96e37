//! Command dispatch: routes parsed CLI commands to their handlers.

pub mod config_cmd;
pub mod control;
pub mod devices;
pub mod homes;

use aircon_api::{RelayClient, TlsMode, TransportConfig};
use aircon_config::Config;
use aircon_core::{ControlSession, FileSelectionStore};
use url::Url;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Session over the relay, remembering its selection on disk.
pub type Session = ControlSession<RelayClient, FileSelectionStore>;

/// Everything a relay-backed command needs.
pub struct Context {
    pub client: RelayClient,
    pub selection_path: std::path::PathBuf,
}

impl Context {
    /// Resolve the relay URL (flag/env first, then config) and build the
    /// HTTP client.
    pub fn new(global: &GlobalOpts, cfg: &Config) -> Result<Self, CliError> {
        let url = relay_url(global, cfg)?;
        let tls = if global.insecure {
            TlsMode::DangerAcceptInvalid
        } else if let Some(ref ca) = global.ca_cert {
            TlsMode::CustomCa(ca.clone())
        } else {
            TlsMode::System
        };
        let transport = TransportConfig { tls, timeout: None };
        let client = RelayClient::new(url, &transport)?;
        Ok(Self {
            client,
            selection_path: aircon_config::selection_path(),
        })
    }

    /// The relay base URL, for messages.
    pub fn url(&self) -> String {
        self.client.base_url().to_string()
    }

    /// Start a control session: load homes, restore the remembered
    /// home/device, fetch the device's status.
    pub async fn session(self) -> Result<Session, CliError> {
        let session = self.open();
        session.start().await?;
        Ok(session)
    }

    /// A session that hasn't loaded anything yet.
    pub fn open(self) -> Session {
        let store = FileSelectionStore::new(self.selection_path);
        ControlSession::new(self.client, store)
    }

    pub fn store(&self) -> FileSelectionStore {
        FileSelectionStore::new(self.selection_path.clone())
    }
}

fn relay_url(global: &GlobalOpts, cfg: &Config) -> Result<Url, CliError> {
    let Some(raw) = global.relay.clone().or_else(|| cfg.client.relay_url.clone()) else {
        return Err(CliError::NoRelay {
            path: aircon_config::config_path().display().to_string(),
        });
    };
    raw.parse().map_err(|_| CliError::Validation {
        field: "relay".into(),
        reason: format!("invalid URL: {raw}"),
    })
}

/// Route a relay-backed command to its handler.
pub async fn dispatch(cmd: Command, ctx: Context, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Homes => homes::handle(&ctx, global).await,
        Command::Devices(args) => devices::list(&ctx, &args, global).await,
        Command::Status(args) => devices::status(ctx, &args, global).await,
        Command::Set(args) => control::set(ctx, &args, global).await,
        Command::Power(args) => control::power(ctx, &args, global).await,
        Command::Select(args) => control::select(ctx, &args, global).await,
        Command::Config(args) => config_cmd::handle(&args, global),
    }
}
