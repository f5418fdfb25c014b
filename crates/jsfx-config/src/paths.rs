//! Platform-specific default locations of effect and data directories.
//!
//! Effects conventionally live in an `Effects` folder next to a `Data`
//! folder holding the files they open at runtime.
//!
//! - Linux: `~/.config/REAPER/Effects/`, `~/.config/REAPER/Data/`
//! - macOS: `~/Library/Application Support/REAPER/Effects/` and `Data/`
//! - Windows: `%APPDATA%\REAPER\Effects\` and `Data\`
//!
//! ```rust,no_run
//! use jsfx_config::paths;
//!
//! println!("effects: {:?}", paths::user_effects_dir());
//! ```

use std::path::PathBuf;

/// Application folder the effect directories live under.
const APP_NAME: &str = "REAPER";

/// Name of the import root folder.
pub const EFFECTS_DIR: &str = "Effects";

/// Name of the data root folder.
pub const DATA_DIR: &str = "Data";

/// Returns the user's effects directory.
///
/// Returns a fallback path if the config directory cannot be determined.
pub fn user_effects_dir() -> PathBuf {
    app_dir().join(EFFECTS_DIR)
}

/// Returns the user's effect data directory.
pub fn user_data_dir() -> PathBuf {
    app_dir().join(DATA_DIR)
}

/// Returns the default settings file path.
pub fn user_settings_file() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("jsfx")
        .join("settings.toml")
}

fn app_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}
