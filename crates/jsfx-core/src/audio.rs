//! Pluggable audio-file codec interface.
//!
//! Effects can open audio files from their data directory with
//! `file_open`. The host tries each registered [`AudioFormat`] in order and
//! uses the first whose [`AudioFormat::can_handle`] accepts the path.

use std::path::Path;

/// Stream parameters of an opened audio file.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AudioFileInfo {
    /// Interleaved channel count.
    pub channels: u32,
    /// Sample rate in Hz.
    pub sample_rate: f64,
}

/// An open, readable audio stream of interleaved samples.
pub trait AudioReader: Send {
    /// Stream parameters.
    fn info(&self) -> AudioFileInfo;

    /// Samples (not frames) left to read.
    fn avail(&self) -> u64;

    /// Seek back to the first sample.
    fn rewind(&mut self);

    /// Read up to `dest.len()` samples, returning how many were read.
    fn read(&mut self, dest: &mut [f64]) -> u64;
}

/// A codec that recognizes and opens one family of audio files.
pub trait AudioFormat: Send + Sync {
    /// Whether `path` looks like a file this codec reads.
    fn can_handle(&self, path: &Path) -> bool;

    /// Open `path` for reading.
    fn open(&self, path: &Path) -> Option<Box<dyn AudioReader>>;
}

/// Case-insensitive extension test shared by codecs and the file detector.
///
/// ```rust
/// use jsfx_core::audio::has_extension;
/// use std::path::Path;
///
/// assert!(has_extension(Path::new("loop.WAV"), "wav"));
/// assert!(!has_extension(Path::new("wav"), "wav"));
/// ```
pub fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}
