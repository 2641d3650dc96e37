//! Device control reconciliation engine between `aircon-api` and its
//! consumers (relay server, CLI).
//!
//! Relay side:
//!
//! - **[`SessionCache`]** — builds and logs in exactly one vendor gateway
//!   per process; concurrent first callers share the same construction.
//! - **[`CommandRelay`]** — the four device operations (list homes, list
//!   devices, device status, set mode), with every gateway failure reduced
//!   to the closed [`RelayError`] taxonomy and vendor payloads decoded into
//!   typed models.
//!
//! Client side:
//!
//! - **[`ControlSession`]** — keeps the confirmed device settings
//!   (baseline) next to the user's unsent edits (pending), submits the
//!   difference as one command and re-fetches the confirmed state.
//!   Talks to a [`ControlBackend`]: the HTTP `RelayClient` or an
//!   in-process `CommandRelay`.
//! - **[`SelectionStore`]** — remembers the last home/device pair.
//!
//! - **[`control`]** — `Mode`, `FanSpeed`, [`ControlState`] and their
//!   derivation from raw vendor devices.

pub mod backend;
pub mod config;
pub mod control;
pub mod error;
pub mod relay;
pub mod selection;
pub mod session;
pub mod session_cache;

// ── Primary re-exports ──────────────────────────────────────────────
pub use backend::{BackendError, ControlBackend};
pub use config::{RelayConfig, TimeoutOverride};
pub use control::{
    ControlState, DEFAULT_TEMPERATURE, FanSpeed, Mode, TEMPERATURE_MAX, TEMPERATURE_MIN,
    TEMPERATURE_STEP, TemperatureTrend, clamp_temperature, resolve_fan_speed, resolve_mode,
};
pub use error::{RelayError, RelayErrorKind, SessionError};
pub use relay::CommandRelay;
pub use selection::{
    FileSelectionStore, MemorySelectionStore, SELECTION_KEY, Selection, SelectionStore,
};
pub use session::{ControlSession, SessionPhase, SessionSnapshot};
pub use session_cache::{SessionCache, mask_email};
