use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Default dedup window: a content item counts once per session per hour.
pub const DEFAULT_DEDUP_WINDOW_SECS: u64 = 3600;

/// Global configuration loaded from `~/.config/viewcap/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewcapConfig {
    /// How long a "viewed" marker stays fresh in a session, in seconds.
    /// Applied by the session store when it prunes; the recorder never looks at it.
    pub dedup_window_secs: u64,
    /// User-agent strings longer than this (in bytes) are truncated before insert.
    pub max_user_agent_len: usize,
    /// Optional cap on markers kept per session; the oldest are pruned first.
    #[serde(default)]
    pub max_markers_per_session: Option<usize>,
    /// Optional SQLite path for recorded views (default: XDG state dir).
    #[serde(default)]
    pub db_path: Option<PathBuf>,
    /// Optional JSON path for persisted sessions (default: XDG state dir).
    #[serde(default)]
    pub sessions_path: Option<PathBuf>,
}

impl Default for ViewcapConfig {
    fn default() -> Self {
        Self {
            dedup_window_secs: DEFAULT_DEDUP_WINDOW_SECS,
            max_user_agent_len: 512,
            max_markers_per_session: None,
            db_path: None,
            sessions_path: None,
        }
    }
}

impl ViewcapConfig {
    /// Configured database path, or `~/.local/state/viewcap/views.db`.
    pub fn resolved_db_path(&self) -> Result<PathBuf> {
        match &self.db_path {
            Some(p) => Ok(p.clone()),
            None => Ok(state_dir()?.join("views.db")),
        }
    }

    /// Configured session file path, or `~/.local/state/viewcap/sessions.json`.
    pub fn resolved_sessions_path(&self) -> Result<PathBuf> {
        match &self.sessions_path {
            Some(p) => Ok(p.clone()),
            None => crate::session::SessionRegistry::default_path(),
        }
    }
}

pub(crate) fn state_dir() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("viewcap")?;
    Ok(xdg_dirs.get_state_home().join("viewcap"))
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("viewcap")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<ViewcapConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = ViewcapConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: ViewcapConfig =
        toml::from_str(&data).with_context(|| format!("parse config: {}", path.display()))?;
    Ok(cfg)
}
