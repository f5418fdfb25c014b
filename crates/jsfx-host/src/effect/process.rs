//! The real-time cycle and everything the audio thread calls between
//! cycles: MIDI, triggers, transport and audio settings.
//!
//! Nothing here allocates or locks, apart from MIDI buffers growing when
//! they were configured as extensible.

use jsfx_core::{MAX_TRIGGERS, MidiEventRef};

use super::Effect;
use crate::transport::{PlaybackState, TimeInfo};

/// Host sample type accepted by the processing cycle.
pub trait Sample: Copy {
    /// Silence.
    const ZERO: Self;

    /// Widen to the internal precision.
    fn to_f64(self) -> f64;

    /// Narrow from the internal precision.
    fn from_f64(value: f64) -> Self;
}

impl Sample for f32 {
    const ZERO: Self = 0.0;

    fn to_f64(self) -> f64 {
        f64::from(self)
    }

    fn from_f64(value: f64) -> Self {
        value as f32
    }
}

impl Sample for f64 {
    const ZERO: Self = 0.0;

    fn to_f64(self) -> f64 {
        self
    }

    fn from_f64(value: f64) -> Self {
        value
    }
}

impl Effect {
    /// Process one block of single-precision audio.
    ///
    /// `ins` and `outs` hold one buffer per channel. The frame count is
    /// clamped to the shortest buffer.
    pub fn process_f32(&mut self, ins: &[&[f32]], outs: &mut [&mut [f32]], frames: usize) {
        self.process(ins, outs, frames);
    }

    /// Process one block of double-precision audio.
    pub fn process_f64(&mut self, ins: &[&[f64]], outs: &mut [&mut [f64]], frames: usize) {
        self.process(ins, outs, frames);
    }

    /// Process one block of audio in any [`Sample`] type.
    pub fn process<S: Sample>(&mut self, ins: &[&[S]], outs: &mut [&mut [S]], frames: usize) {
        let frames = ins
            .iter()
            .map(|b| b.len())
            .chain(outs.iter().map(|b| b.len()))
            .fold(frames, usize::min);

        debug_assert_eq!(self.midi_in.read_pos(), 0, "MIDI input was read before the cycle");
        self.midi_out.clear();
        self.masks.clear();
        self.engine.set(self.vars.trigger, f64::from(self.triggers));
        self.triggers = 0;

        if self.code.compiled {
            self.run_cycle(ins, outs, frames);
        } else {
            for out in outs.iter_mut() {
                out[..frames].fill(S::ZERO);
            }
        }

        debug_assert_eq!(self.midi_out.read_pos(), 0, "MIDI output was read during the cycle");
        self.midi_in.clear();
    }

    fn run_cycle<S: Sample>(&mut self, ins: &[&[S]], outs: &mut [&mut [S]], frames: usize) {
        if self.pending.init {
            self.init();
        }

        let (code_ins, code_outs) = match &self.source {
            Some(source) => (source.main.header.in_pins.len(), source.main.header.out_pins.len()),
            None => (0, 0),
        };
        let num_ins = ins.len().min(code_ins);
        let num_outs = outs.len().min(code_outs);

        self.valid_input_channels = num_ins as u32;
        self.engine.set(self.vars.samplesblock, frames as f64);
        self.engine.set(self.vars.num_ch, num_ins as f64);

        if self.pending.slider {
            self.execute(self.code.slider);
            self.pending.slider = false;
        }

        self.execute(self.code.block);

        if let Some(sample) = self.code.sample {
            for frame in 0..frames {
                for (ch, &slot) in self.vars.spl.iter().enumerate().take(code_ins) {
                    let value = if ch < num_ins { ins[ch][frame].to_f64() } else { 0.0 };
                    self.engine.set(slot, value);
                }
                self.execute(Some(sample));
                for (out, &slot) in outs.iter_mut().zip(&self.vars.spl).take(num_outs) {
                    out[frame] = S::from_f64(self.engine.get(slot));
                }
            }
        }

        for out in outs.iter_mut().skip(num_outs) {
            out[..frames].fill(S::ZERO);
        }
    }

    // -- audio settings ------------------------------------------------------

    /// Frames per block the script is told about.
    pub fn block_size(&self) -> u32 {
        self.block_size
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Change the block size. A different value schedules a reinit.
    pub fn set_block_size(&mut self, block_size: u32) {
        if self.block_size != block_size {
            self.block_size = block_size;
            self.pending.init = true;
        }
    }

    /// Change the sample rate. A different value schedules a reinit.
    pub fn set_sample_rate(&mut self, sample_rate: f64) {
        if self.sample_rate != sample_rate {
            self.sample_rate = sample_rate;
            self.pending.init = true;
        }
    }

    /// Resize both MIDI buffers.
    pub fn set_midi_capacity(&mut self, capacity: usize, extensible: bool) {
        self.midi_in.reserve(capacity, extensible);
        self.midi_out.reserve(capacity, extensible);
    }

    /// Publish the host transport to the script.
    ///
    /// Unless the script set `ext_noinit`, moving from a stopped state into
    /// playing or recording schedules a reinit.
    pub fn set_time_info(&mut self, info: &TimeInfo) {
        let previous = PlaybackState::from_f64(self.engine.get(self.vars.play_state));
        let next = info.playback_state;
        if self.engine.get(self.vars.ext_noinit) == 0.0 && !previous.is_running() && next.is_running() {
            self.pending.init = true;
        }

        let (num, denom) = info.time_signature;
        self.engine.set(self.vars.tempo, info.tempo);
        self.engine.set(self.vars.play_state, next.as_f64());
        self.engine.set(self.vars.play_position, info.time_position);
        self.engine.set(self.vars.beat_position, info.beat_position);
        self.engine.set(self.vars.ts_num, f64::from(num));
        self.engine.set(self.vars.ts_denom, f64::from(denom));
    }

    // -- MIDI and triggers ---------------------------------------------------

    /// Queue a MIDI event for the next cycle. Fails when the input buffer
    /// is full and not extensible.
    pub fn send_midi(&mut self, event: &MidiEventRef<'_>) -> bool {
        self.midi_in.push(event)
    }

    /// Take the next event the last cycle produced, on any bus.
    pub fn receive_midi(&mut self) -> Option<MidiEventRef<'_>> {
        self.midi_out.get_next()
    }

    /// Take the next event the last cycle produced on `bus`.
    ///
    /// Do not mix with [`receive_midi`](Self::receive_midi) between cycles.
    pub fn receive_midi_from_bus(&mut self, bus: u32) -> Option<MidiEventRef<'_>> {
        self.midi_out.get_next_from_bus(bus)
    }

    /// Bus the script currently addresses, 0 unless `ext_midi_bus` is set.
    pub fn current_midi_bus(&self) -> u32 {
        if self.engine.get(self.vars.ext_midi_bus) != 0.0 {
            self.engine.get(self.vars.midi_bus).max(0.0) as u32
        } else {
            0
        }
    }

    /// Raise trigger `index` for the next cycle.
    pub fn send_trigger(&mut self, index: u32) -> bool {
        if index >= MAX_TRIGGERS {
            return false;
        }
        self.triggers |= 1 << index;
        true
    }
}
