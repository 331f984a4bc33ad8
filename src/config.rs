//! Command line, file locations, and logging setup.
//!
//! Every path has a platform default under the user's config/data dirs and can
//! be overridden by a flag (some also by environment variable).
use clap::Parser;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use crate::app::{AppOptions, Keymap, Route, Theme};
use crate::error::{Context, Result, simple_error};

pub const APP_DIR: &str = "user-panel";

#[derive(Parser, Debug, Clone)]
#[command(name = "user-panel", version, about = "Terminal admin panel for a local user table")]
pub struct Cli {
    /// User table file.
    #[arg(long, env = "USER_PANEL_DB")]
    pub db: Option<PathBuf>,

    /// Keep the table in memory only; nothing is written to disk.
    #[arg(long, conflicts_with = "db")]
    pub in_memory: bool,

    /// Screen to open first: `/`, `/user/create` or `/user/edit/{id}`.
    #[arg(long, default_value = "/")]
    pub route: String,

    /// Theme file (key = #RRGGBB lines); created with defaults when missing.
    #[arg(long)]
    pub theme: Option<PathBuf>,

    /// Keybinding file (Action = Key lines); created with defaults when missing.
    #[arg(long)]
    pub keybinds: Option<PathBuf>,

    /// Log file; the terminal itself is taken by the UI.
    #[arg(long, env = "USER_PANEL_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// Log filter such as `info` or `user_panel=debug`. Falls back to RUST_LOG, then `info`.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Minutes a fetched user list is reused before it is queried again.
    #[arg(long, default_value_t = 10)]
    pub stale_minutes: u64,
}

/// Resolved file locations for one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    pub db: PathBuf,
    pub theme: PathBuf,
    pub keybinds: PathBuf,
    pub log: PathBuf,
}

fn config_dir() -> PathBuf {
    dirs::config_dir().unwrap_or_else(|| PathBuf::from(".")).join(APP_DIR)
}

fn data_dir() -> PathBuf {
    dirs::data_dir().unwrap_or_else(|| PathBuf::from(".")).join(APP_DIR)
}

impl Cli {
    pub fn paths(&self) -> Paths {
        Paths {
            db: self.db.clone().unwrap_or_else(|| data_dir().join("users.json")),
            theme: self.theme.clone().unwrap_or_else(|| config_dir().join("theme.conf")),
            keybinds: self
                .keybinds
                .clone()
                .unwrap_or_else(|| config_dir().join("keybinds.conf")),
            log: self
                .log_file
                .clone()
                .unwrap_or_else(|| data_dir().join("user-panel.log")),
        }
    }

    pub fn start_route(&self) -> Result<Route> {
        Route::parse(&self.route).ok_or_else(|| simple_error(format!("unknown route: {}", self.route)))
    }

    pub fn stale_after(&self) -> Duration {
        Duration::from_secs(self.stale_minutes.saturating_mul(60))
    }

    /// Session options with theme and keymap loaded (or initialized) from disk.
    pub fn app_options(&self, paths: &Paths) -> Result<AppOptions> {
        for p in [&paths.theme, &paths.keybinds] {
            ensure_parent(p)?;
        }
        Ok(AppOptions {
            stale_after: self.stale_after(),
            theme: Theme::load_or_init(&paths.theme),
            keymap: Keymap::load_or_init(&paths.keybinds),
            ..AppOptions::default()
        })
    }
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_ctx(|| format!("create directory {}", parent.display()))?;
        }
    }
    Ok(())
}

/// Route `tracing` output to `path` (appending), filtered by `level` or `RUST_LOG`.
pub fn init_logging(path: &Path, level: Option<&str>) -> Result<()> {
    ensure_parent(path)?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_ctx(|| format!("open log file {}", path.display()))?;

    let filter = match level {
        Some(l) => EnvFilter::try_new(l)
            .map_err(|e| simple_error(format!("invalid log filter '{l}': {e}")))?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| simple_error(format!("init logging: {e}")))?;
    Ok(())
}
