//! Host variables registered with the engine.

use std::collections::HashMap;

use jsfx_core::{ExprEngine, GFX_REGISTERS, MAX_CHANNELS, MAX_SLIDERS, VarSlot};

/// Slots of every variable the host reads or writes.
///
/// Registered once per instance and never relocated; reloading only
/// resets values.
#[derive(Debug, Clone)]
pub(crate) struct VarTable {
    /// `spl0..spl63`.
    pub(crate) spl: Vec<VarSlot>,
    /// `slider1..slider64`.
    pub(crate) slider: Vec<VarSlot>,
    pub(crate) srate: VarSlot,
    pub(crate) num_ch: VarSlot,
    pub(crate) samplesblock: VarSlot,
    pub(crate) trigger: VarSlot,
    pub(crate) tempo: VarSlot,
    pub(crate) play_state: VarSlot,
    pub(crate) play_position: VarSlot,
    pub(crate) beat_position: VarSlot,
    pub(crate) ts_num: VarSlot,
    pub(crate) ts_denom: VarSlot,
    pub(crate) ext_noinit: VarSlot,
    pub(crate) ext_midi_bus: VarSlot,
    pub(crate) midi_bus: VarSlot,
    /// Graphics registers, in [`GFX_REGISTERS`] order.
    pub(crate) gfx: Vec<VarSlot>,
    slider_index: HashMap<VarSlot, u32>,
}

impl VarTable {
    /// Register all host variables and write their initial values.
    pub(crate) fn register(engine: &mut dyn ExprEngine, block_size: u32, sample_rate: f64) -> Self {
        let spl = (0..MAX_CHANNELS).map(|i| engine.register_var(&format!("spl{i}"))).collect();
        let slider: Vec<VarSlot> = (0..MAX_SLIDERS)
            .map(|i| engine.register_var(&format!("slider{}", i + 1)))
            .collect();
        let slider_index = slider.iter().enumerate().map(|(i, &slot)| (slot, i as u32)).collect();

        let mut reg = |name: &str, value: f64| {
            let slot = engine.register_var(name);
            engine.set(slot, value);
            slot
        };

        let srate = reg("srate", sample_rate);
        let num_ch = reg("num_ch", 0.0);
        let samplesblock = reg("samplesblock", f64::from(block_size));
        let trigger = reg("trigger", 0.0);
        let tempo = reg("tempo", 120.0);
        let play_state = reg("play_state", 1.0);
        let play_position = reg("play_position", 0.0);
        let beat_position = reg("beat_position", 0.0);
        let ts_num = reg("ts_num", 0.0);
        let ts_denom = reg("ts_denom", 4.0);
        let ext_noinit = reg("ext_noinit", 0.0);
        reg("ext_nodenorm", 0.0);
        let ext_midi_bus = reg("ext_midi_bus", 0.0);
        let midi_bus = reg("midi_bus", 0.0);
        let gfx = GFX_REGISTERS
            .iter()
            .map(|&name| reg(name, if name == "gfx_a" { 1.0 } else { 0.0 }))
            .collect();

        Self {
            spl,
            slider,
            srate,
            num_ch,
            samplesblock,
            trigger,
            tempo,
            play_state,
            play_position,
            beat_position,
            ts_num,
            ts_denom,
            ext_noinit,
            ext_midi_bus,
            midi_bus,
            gfx,
            slider_index,
        }
    }

    /// Slider index whose value lives in `slot`.
    pub(crate) fn slider_of_var(&self, slot: VarSlot) -> Option<u32> {
        self.slider_index.get(&slot).copied()
    }

    /// Slot of a graphics register by name.
    pub(crate) fn gfx_register(&self, name: &str) -> Option<VarSlot> {
        GFX_REGISTERS.iter().position(|&r| r == name).map(|i| self.gfx[i])
    }
}
