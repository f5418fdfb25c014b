//! WAV codec backed by `hound`.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use hound::{SampleFormat, WavReader, WavWriter};
use jsfx_core::audio::has_extension;
use jsfx_core::{AudioFileInfo, AudioFormat, AudioReader};

use crate::Result;

/// The WAV [`AudioFormat`].
#[derive(Debug, Clone, Copy, Default)]
pub struct WavCodec;

impl AudioFormat for WavCodec {
    fn can_handle(&self, path: &Path) -> bool {
        has_extension(path, "wav")
    }

    fn open(&self, path: &Path) -> Option<Box<dyn AudioReader>> {
        match WavStream::open(path) {
            Ok(stream) => Some(Box::new(stream)),
            Err(e) => {
                tracing::warn!("cannot open {}: {e}", path.display());
                None
            }
        }
    }
}

/// An open WAV file delivering interleaved samples as `f64`.
///
/// Integer PCM is scaled by `1 / 2^(bits-1)`; float data passes through.
pub struct WavStream {
    reader: WavReader<BufReader<File>>,
    info: AudioFileInfo,
    format: SampleFormat,
    scale: f64,
    total: u64,
    position: u64,
}

impl std::fmt::Debug for WavStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WavStream")
            .field("info", &self.info)
            .field("total", &self.total)
            .field("position", &self.position)
            .finish_non_exhaustive()
    }
}

impl WavStream {
    /// Open a WAV file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let reader = WavReader::open(path)?;
        let spec = reader.spec();
        let scale = match spec.sample_format {
            SampleFormat::Float => 1.0,
            SampleFormat::Int => 1.0 / f64::from(1u32 << (spec.bits_per_sample.clamp(1, 32) - 1)),
        };
        Ok(Self {
            total: u64::from(reader.len()),
            info: AudioFileInfo {
                channels: u32::from(spec.channels),
                sample_rate: f64::from(spec.sample_rate),
            },
            format: spec.sample_format,
            scale,
            position: 0,
            reader,
        })
    }
}

impl AudioReader for WavStream {
    fn info(&self) -> AudioFileInfo {
        self.info
    }

    fn avail(&self) -> u64 {
        self.total - self.position
    }

    fn rewind(&mut self) {
        match self.reader.seek(0) {
            Ok(()) => self.position = 0,
            Err(e) => tracing::warn!("WAV rewind failed: {e}"),
        }
    }

    fn read(&mut self, dest: &mut [f64]) -> u64 {
        let mut count = 0;
        match self.format {
            SampleFormat::Float => {
                for (slot, sample) in dest.iter_mut().zip(self.reader.samples::<f32>()) {
                    let Ok(value) = sample else { break };
                    *slot = f64::from(value);
                    count += 1;
                }
            }
            SampleFormat::Int => {
                for (slot, sample) in dest.iter_mut().zip(self.reader.samples::<i32>()) {
                    let Ok(value) = sample else { break };
                    *slot = f64::from(value) * self.scale;
                    count += 1;
                }
            }
        }
        self.position += count;
        count
    }
}

/// Write interleaved samples as a 32-bit float WAV file.
pub fn write_wav(path: impl AsRef<Path>, samples: &[f32], channels: u16, sample_rate: u32) -> Result<()> {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    let mut writer = WavWriter::create(path, spec)?;
    for &sample in samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;
    Ok(())
}
