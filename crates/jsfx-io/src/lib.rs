//! Audio file codecs for the JSFX host.
//!
//! Effects open audio files from their data directory through the
//! [`jsfx_core::AudioFormat`] interface. This crate provides the built-in
//! WAV codec; register it on the host configuration:
//!
//! ```rust,ignore
//! use jsfx_io::WavCodec;
//!
//! let config = Config::new(runtime).with_audio_format(Arc::new(WavCodec));
//! ```

mod wav;

pub use wav::{WavCodec, WavStream, write_wav};

/// Error types for audio I/O operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// WAV file read/write error.
    #[error("WAV file error: {0}")]
    Wav(#[from] hound::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for audio I/O operations.
pub type Result<T> = std::result::Result<T, Error>;
