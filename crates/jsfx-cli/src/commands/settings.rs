//! Show or write the host settings file.

use std::path::PathBuf;

use clap::Args;
use jsfx_config::{Settings, paths};

use super::load_settings;

/// Show the settings in effect, or write them out.
#[derive(Args)]
pub struct SettingsArgs {
    /// Settings file to read instead of the user default
    #[arg(long, value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Write the settings in effect to this path
    #[arg(long, value_name = "FILE")]
    pub write: Option<PathBuf>,

    /// Write the settings in effect to the user default path
    #[arg(long, conflicts_with = "write")]
    pub write_default: bool,
}

/// Run the settings command.
pub fn run(args: SettingsArgs) -> anyhow::Result<()> {
    let settings = load_settings(args.file.as_deref())?;
    if let Err(e) = settings.validate() {
        tracing::warn!("{e}");
    }

    let target = match (args.write, args.write_default) {
        (Some(path), _) => Some(path),
        (None, true) => Some(paths::user_settings_file()),
        (None, false) => None,
    };

    match target {
        Some(path) => write(&settings, path),
        None => {
            print!("{}", settings.to_toml()?);
            Ok(())
        }
    }
}

fn write(settings: &Settings, path: PathBuf) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    settings.save(&path)?;
    println!("Wrote {}", path.display());
    Ok(())
}
