//! Host configuration shared by effect instances.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use jsfx_core::{AudioFormat, EngineRuntime, LogLevel};

use crate::paths::{DATA_DIR, EFFECTS_DIR};

/// Callback receiving every host diagnostic.
pub type Reporter = Arc<dyn Fn(LogLevel, &str) + Send + Sync>;

/// Default MIDI buffer capacity in bytes.
pub const DEFAULT_MIDI_CAPACITY: usize = 1024;

/// Default processing block size in frames.
pub const DEFAULT_BLOCK_SIZE: u32 = 128;

/// Default sample rate in Hz.
pub const DEFAULT_SAMPLE_RATE: f64 = 44100.0;

/// Configuration an effect instance is created with.
///
/// Built once with the `with_*` methods, then shared behind an [`Arc`].
///
/// ```rust,ignore
/// let config = Config::new(runtime)
///     .with_import_root("/home/me/.config/REAPER/Effects")
///     .with_reporter(|level, msg| eprintln!("[{level}] {msg}"));
/// let fx = Effect::new(Arc::new(config));
/// ```
#[derive(Clone)]
pub struct Config {
    import_root: Option<PathBuf>,
    data_root: Option<PathBuf>,
    audio_formats: Vec<Arc<dyn AudioFormat>>,
    reporter: Option<Reporter>,
    runtime: Arc<dyn EngineRuntime>,
    midi_capacity: usize,
    midi_extensible: bool,
    block_size: u32,
    sample_rate: f64,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("import_root", &self.import_root)
            .field("data_root", &self.data_root)
            .field("audio_formats", &self.audio_formats.len())
            .field("reporter", &self.reporter.is_some())
            .field("midi_capacity", &self.midi_capacity)
            .field("midi_extensible", &self.midi_extensible)
            .field("block_size", &self.block_size)
            .field("sample_rate", &self.sample_rate)
            .finish_non_exhaustive()
    }
}

impl Config {
    /// Create a configuration around an engine runtime.
    pub fn new(runtime: Arc<dyn EngineRuntime>) -> Self {
        Self {
            import_root: None,
            data_root: None,
            audio_formats: Vec::new(),
            reporter: None,
            runtime,
            midi_capacity: DEFAULT_MIDI_CAPACITY,
            midi_extensible: true,
            block_size: DEFAULT_BLOCK_SIZE,
            sample_rate: DEFAULT_SAMPLE_RATE,
        }
    }

    /// Set the directory imports are resolved against.
    pub fn with_import_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.import_root = Some(root.into());
        self
    }

    /// Set the directory `file_open` and path sliders are resolved against.
    pub fn with_data_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.data_root = Some(root.into());
        self
    }

    /// Register an audio codec. Codecs are tried in registration order.
    pub fn with_audio_format(mut self, format: Arc<dyn AudioFormat>) -> Self {
        self.audio_formats.push(format);
        self
    }

    /// Install a diagnostic callback.
    pub fn with_reporter(mut self, reporter: impl Fn(LogLevel, &str) + Send + Sync + 'static) -> Self {
        self.reporter = Some(Arc::new(reporter));
        self
    }

    /// Set the MIDI buffer capacity of new instances.
    pub fn with_midi_capacity(mut self, capacity: usize, extensible: bool) -> Self {
        self.midi_capacity = capacity;
        self.midi_extensible = extensible;
        self
    }

    /// Set the initial block size and sample rate of new instances.
    pub fn with_audio_defaults(mut self, block_size: u32, sample_rate: f64) -> Self {
        self.block_size = block_size;
        self.sample_rate = sample_rate;
        self
    }

    /// Directory imports are resolved against.
    pub fn import_root(&self) -> Option<&Path> {
        self.import_root.as_deref()
    }

    /// Directory data files are resolved against.
    pub fn data_root(&self) -> Option<&Path> {
        self.data_root.as_deref()
    }

    /// Registered audio codecs, in priority order.
    pub fn audio_formats(&self) -> &[Arc<dyn AudioFormat>] {
        &self.audio_formats
    }

    /// The engine runtime.
    pub fn runtime(&self) -> &Arc<dyn EngineRuntime> {
        &self.runtime
    }

    /// MIDI buffer capacity and extensibility for new instances.
    pub fn midi_capacity(&self) -> (usize, bool) {
        (self.midi_capacity, self.midi_extensible)
    }

    /// Initial block size of new instances.
    pub fn block_size(&self) -> u32 {
        self.block_size
    }

    /// Initial sample rate of new instances.
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Report a diagnostic.
    ///
    /// Emits a `tracing` event at the matching level, then forwards the
    /// message to the installed reporter, if any.
    pub fn log(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Info => tracing::info!("{message}"),
            LogLevel::Warning => tracing::warn!("{message}"),
            LogLevel::Error => tracing::error!("{message}"),
        }
        if let Some(reporter) = &self.reporter {
            reporter(level, message);
        }
    }

    /// Fill unset roots from the location of an effect source file.
    ///
    /// Walks up from `source_path` to the nearest ancestor directory named
    /// `Effects`. That directory becomes the import root, and its sibling
    /// `Data` becomes the data root when it exists. Roots already set are
    /// left alone.
    pub fn guess_file_roots(&mut self, source_path: &Path) {
        let Some(effects) = find_effects_ancestor(source_path) else {
            return;
        };

        if self.import_root.is_none() {
            tracing::debug!("guessed import root {}", effects.display());
            self.import_root = Some(effects.to_path_buf());
        }

        if self.data_root.is_none()
            && let Some(parent) = effects.parent()
        {
            let data = parent.join(DATA_DIR);
            if data.is_dir() {
                tracing::debug!("guessed data root {}", data.display());
                self.data_root = Some(data);
            }
        }
    }
}

fn find_effects_ancestor(source_path: &Path) -> Option<&Path> {
    source_path
        .ancestors()
        .skip(1)
        .find(|dir| dir.file_name().is_some_and(|name| name == EFFECTS_DIR))
}
