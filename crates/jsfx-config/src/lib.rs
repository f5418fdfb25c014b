//! Configuration for hosting JSFX effects.
//!
//! # Features
//!
//! - **Config**: import/data roots, audio codecs, diagnostics reporter and
//!   the expression-engine runtime shared by effect instances
//! - **Root discovery**: [`Config::guess_file_roots`] infers roots from an
//!   `Effects/` folder layout
//! - **Settings**: optional TOML file overriding the defaults
//! - **Paths**: platform default effect and data directories
//!
//! # Example
//!
//! ```rust,ignore
//! use jsfx_config::{Config, Settings};
//!
//! let settings = Settings::load("settings.toml")?;
//! let mut config = settings.apply(Config::new(runtime));
//! config.guess_file_roots(Path::new("Effects/utility/volume.jsfx"));
//! ```

mod config;
pub mod error;
pub mod paths;
mod settings;

pub use config::{
    Config, DEFAULT_BLOCK_SIZE, DEFAULT_MIDI_CAPACITY, DEFAULT_SAMPLE_RATE, Reporter,
};
pub use error::ConfigError;
pub use paths::{user_data_dir, user_effects_dir};
pub use settings::Settings;
