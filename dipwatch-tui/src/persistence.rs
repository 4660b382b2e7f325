//! Session state persistence: JSON save/load across restarts.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use dipwatch_core::domain::Period;
use dipwatch_core::Selection;

use crate::app::{AppState, Focus};

/// Serializable subset of app state that persists across restarts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedState {
    pub codes: Vec<String>,
    pub period: Period,
    pub benchmarks: Vec<String>,
    pub normalize: bool,
    pub focus: Focus,
}

impl Default for PersistedState {
    fn default() -> Self {
        Self {
            codes: Vec::new(),
            period: Period::default(),
            benchmarks: Vec::new(),
            normalize: true,
            focus: Focus::Instruments,
        }
    }
}

impl PersistedState {
    pub fn selection(&self) -> Selection {
        Selection {
            codes: self.codes.clone(),
            period: self.period,
            benchmarks: self.benchmarks.clone(),
            normalize: self.normalize,
        }
    }
}

pub fn default_path() -> PathBuf {
    dipwatch_core::config::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("state.json")
}

/// Load persisted state from disk. `None` if the file is missing or corrupt.
pub fn load(path: &Path) -> Option<PersistedState> {
    let content = std::fs::read_to_string(path).ok()?;
    match serde_json::from_str(&content) {
        Ok(state) => Some(state),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring corrupt state file");
            None
        }
    }
}

/// Save persisted state to disk. Creates parent directories if needed.
pub fn save(path: &Path, state: &PersistedState) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(state)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Extract persisted state from AppState.
pub fn extract(app: &AppState) -> PersistedState {
    PersistedState {
        codes: app.selection.codes.clone(),
        period: app.selection.period,
        benchmarks: app.selection.benchmarks.clone(),
        normalize: app.selection.normalize,
        focus: app.focus,
    }
}
