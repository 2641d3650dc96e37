// ── Selection store ──
//
// Remembers the last home/device pair between sessions. Reads never
// fail (missing or corrupt data is simply no selection) and writes are
// fire-and-forget.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Storage key of the persisted selection.
pub const SELECTION_KEY: &str = "ac-control-selection";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    #[serde(default)]
    pub home_id: Option<i64>,
    #[serde(default)]
    pub device_id: Option<i64>,
}

impl Selection {
    pub fn new(home_id: Option<i64>, device_id: Option<i64>) -> Self {
        Self { home_id, device_id }
    }

    /// The stored device, if it was chosen in `home_id`.
    pub fn device_in(&self, home_id: i64) -> Option<i64> {
        if self.home_id == Some(home_id) {
            self.device_id
        } else {
            None
        }
    }
}

pub trait SelectionStore: Send + Sync {
    fn read(&self) -> Option<Selection>;
    fn write(&self, selection: &Selection);
}

// ── File-backed ─────────────────────────────────────────────────────

/// JSON file store, e.g. `<data dir>/ac-control-selection.json`.
#[derive(Debug, Clone)]
pub struct FileSelectionStore {
    path: PathBuf,
}

impl FileSelectionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// A store named after [`SELECTION_KEY`] inside `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(format!("{SELECTION_KEY}.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn try_write(&self, selection: &Selection) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string(selection).map_err(std::io::Error::other)?;
        std::fs::write(&self.path, json)
    }
}

impl SelectionStore for FileSelectionStore {
    fn read(&self) -> Option<Selection> {
        let raw = std::fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&raw) {
            Ok(selection) => Some(selection),
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "ignoring unreadable selection");
                None
            }
        }
    }

    fn write(&self, selection: &Selection) {
        if let Err(e) = self.try_write(selection) {
            warn!(path = %self.path.display(), error = %e, "failed to persist selection");
        }
    }
}

// ── In-memory ───────────────────────────────────────────────────────

/// Keeps the current selection and every write, in order.
#[derive(Debug, Default)]
pub struct MemorySelectionStore {
    initial: Option<Selection>,
    writes: Mutex<Vec<Selection>>,
}

impl MemorySelectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_selection(selection: Selection) -> Self {
        Self {
            initial: Some(selection),
            writes: Mutex::default(),
        }
    }

    pub fn writes(&self) -> Vec<Selection> {
        self.writes
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

impl SelectionStore for MemorySelectionStore {
    fn read(&self) -> Option<Selection> {
        self.writes
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .last()
            .copied()
            .or(self.initial)
    }

    fn write(&self, selection: &Selection) {
        self.writes
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(*selection);
    }
}
