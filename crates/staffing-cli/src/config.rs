//! Runtime configuration: an optional TOML file layered with `STAFFING_*`
//! environment variables.
//!
//! ```toml
//! store_path = "~/.local/share/staffing/staffing.db"
//!
//! [engine]
//! late_tolerance_minutes = 5
//! expiry_window_days     = 7
//! max_calendar_days      = 90
//! ```
//!
//! Nested keys use a double underscore in the environment, e.g.
//! `STAFFING_ENGINE__EXPIRY_WINDOW_DAYS=14`.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::Deserialize;
use staffing_core::settings::EngineSettings;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
  #[serde(default = "default_store_path")]
  pub store_path: PathBuf,
  #[serde(default)]
  pub engine:     EngineSettings,
}

fn default_store_path() -> PathBuf { PathBuf::from("staffing.db") }

impl AppConfig {
  /// Read `path` (if it exists) and the environment.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(
        config::Environment::with_prefix("STAFFING")
          .prefix_separator("_")
          .separator("__")
          .try_parsing(true),
      )
      .build()
      .with_context(|| format!("failed to read config file {}", path.display()))?;

    let mut cfg: Self = settings
      .try_deserialize()
      .context("failed to deserialise AppConfig")?;
    cfg.store_path = expand_tilde(&cfg.store_path);
    Ok(cfg)
  }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
