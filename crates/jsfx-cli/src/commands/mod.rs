//! CLI command implementations.

pub mod info;
pub mod settings;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use jsfx_config::{Config, Settings, paths};

use crate::runtime::InspectRuntime;

/// Settings from `path`, else from the user settings file when it exists,
/// else defaults.
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    if let Some(path) = path {
        return Ok(Settings::load(path)?);
    }
    let default = paths::user_settings_file();
    if default.is_file() {
        tracing::debug!("reading settings from {}", default.display());
        return Ok(Settings::load(&default)?);
    }
    Ok(Settings::default())
}

/// Build the configuration used to inspect `source`.
///
/// Explicit roots win over the settings file; roots still unset are
/// guessed from the location of `source`.
pub fn inspect_config(
    settings: &Settings,
    source: &Path,
    import_root: Option<PathBuf>,
    data_root: Option<PathBuf>,
) -> Config {
    let mut config = settings
        .apply(Config::new(Arc::new(InspectRuntime)))
        .with_audio_format(Arc::new(jsfx_io::WavCodec));
    if let Some(root) = import_root {
        config = config.with_import_root(root);
    }
    if let Some(root) = data_root {
        config = config.with_data_root(root);
    }
    config.guess_file_roots(source);
    config
}
