//! Transport information pushed by the host.

/// Playback state as scripts see it in `play_state`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u32)]
pub enum PlaybackState {
    /// Transport error.
    Error = 0,
    /// Playing.
    #[default]
    Playing = 1,
    /// Paused or stopped.
    Paused = 2,
    /// Recording.
    Recording = 5,
    /// Recording, paused.
    RecordingPaused = 6,
}

impl PlaybackState {
    /// Value stored in `play_state`.
    pub fn as_f64(self) -> f64 {
        f64::from(self as u32)
    }

    /// Decode a `play_state` value. Unknown values read as [`Error`](Self::Error).
    pub fn from_f64(value: f64) -> Self {
        match value as i64 {
            1 => PlaybackState::Playing,
            2 => PlaybackState::Paused,
            5 => PlaybackState::Recording,
            6 => PlaybackState::RecordingPaused,
            _ => PlaybackState::Error,
        }
    }

    /// Whether the transport is rolling.
    pub fn is_running(self) -> bool {
        matches!(self, PlaybackState::Playing | PlaybackState::Recording)
    }
}

/// Snapshot of the host transport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeInfo {
    /// Tempo in beats per minute.
    pub tempo: f64,
    /// Transport state.
    pub playback_state: PlaybackState,
    /// Position in seconds.
    pub time_position: f64,
    /// Position in beats.
    pub beat_position: f64,
    /// Time signature as numerator and denominator.
    pub time_signature: (u32, u32),
}

impl Default for TimeInfo {
    fn default() -> Self {
        Self {
            tempo: 120.0,
            playback_state: PlaybackState::Playing,
            time_position: 0.0,
            beat_position: 0.0,
            time_signature: (4, 4),
        }
    }
}
