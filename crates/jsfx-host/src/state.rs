//! Saved effect state.

use jsfx_core::MAX_SLIDERS;
use serde::{Deserialize, Serialize};

/// Slider values plus the bytes written by `@serialize`.
///
/// Independent of the effect that produced it. Cloning duplicates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct State {
    /// One value per slider slot; undeclared sliders hold 0.
    pub sliders: Vec<f64>,
    /// Opaque serializer output.
    #[serde(default)]
    pub data: Vec<u8>,
}

impl Default for State {
    fn default() -> Self {
        Self {
            sliders: vec![0.0; MAX_SLIDERS],
            data: Vec::new(),
        }
    }
}

impl State {
    /// Encode as JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Decode from JSON. The slider list is padded or cut to the slot count.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let mut state: State = serde_json::from_str(json)?;
        state.sliders.resize(MAX_SLIDERS, 0.0);
        Ok(state)
    }

    /// Value of slider `index`, 0 when out of range.
    pub fn slider(&self, index: u32) -> f64 {
        self.sliders.get(index as usize).copied().unwrap_or(0.0)
    }
}
