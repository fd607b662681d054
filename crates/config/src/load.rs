//! Layered loading: built-in defaults, then the TOML file, then the
//! environment.

use crate::error::{ErrorKind, Result};
use crate::settings::Settings;
use directories::ProjectDirs;
use exn::{OptionExt, ResultExt};
use figment::Figment;
use figment::providers::{Env, Format, Toml};
use std::path::{Path, PathBuf};

pub const FILE_NAME: &str = "config.toml";
pub const ENV_PREFIX: &str = "SHELFNOTE_";
/// Commented starting point written by `config init`.
pub const DEFAULT_CONFIG: &str = include_str!("default.toml");

/// `config.toml` in the platform's per-user config directory.
///
/// - Linux: `~/.config/shelfnote/config.toml`
/// - macOS: `~/Library/Application Support/shelfnote/config.toml`
/// - Windows: `%APPDATA%\shelfnote\config\config.toml`
pub fn default_path() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("", "", "shelfnote").ok_or_raise(|| ErrorKind::NoConfigDir)?;
    Ok(dirs.config_dir().join(FILE_NAME))
}

impl Settings {
    /// The provider stack behind [`load`](Self::load).
    ///
    /// A missing file contributes nothing. Defaults come from the struct
    /// itself, so absent keys never reach the extractor.
    pub fn figment(path: &Path) -> Figment {
        let mut figment = Figment::new();
        if path.exists() {
            figment = figment.merge(Toml::file_exact(path));
        } else {
            tracing::debug!(path = %path.display(), "No config file, using defaults and environment");
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let settings: Settings = Self::figment(path)
            .extract()
            .or_raise(|| ErrorKind::Load)?;
        tracing::debug!(path = %path.display(), host = %settings.host, "Loaded settings");
        Ok(settings)
    }
}

/// Write [`DEFAULT_CONFIG`] to `path`, creating parent folders.
///
/// Returns `false` without touching anything when the file exists and
/// `force` is not set.
pub fn init(path: &Path, force: bool) -> Result<bool> {
    write(path, DEFAULT_CONFIG, force)
}

/// Write `contents` to a settings file, refusing to overwrite unless `force`.
pub fn write(path: &Path, contents: &str, force: bool) -> Result<bool> {
    if path.exists() && !force {
        tracing::info!(path = %path.display(), "Config file already exists");
        return Ok(false);
    }
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).or_raise(|| ErrorKind::Io(parent.to_path_buf()))?;
    }
    std::fs::write(path, contents).or_raise(|| ErrorKind::Io(path.to_path_buf()))?;
    tracing::info!(path = %path.display(), "Wrote config file");
    Ok(true)
}
