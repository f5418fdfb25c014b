//! The effect instance: load, compile, sliders, state and introspection.
//!
//! The processing cycle lives in [`process`](self::process); it shares the
//! private state defined here.

mod process;

use std::collections::HashMap;
use std::ops::BitOr;
use std::path::Path;
use std::sync::Arc;

use jsfx_config::Config;
use jsfx_core::{
    CodeHandle, ExprEngine, GfxTarget, HeaderOptions, LogLevel, MAX_SLIDERS, MidiBuffer, Section, SectionKind,
    Slider, SliderRange, VarResolver, VarSlot,
};

use crate::error::{CompileError, LoadError};
use crate::files::{FileTable, SerialMode, Serializer};
use crate::graph::{LoadOptions, SourceGraph};
use crate::script::{ScriptContext, SliderMasks};
use crate::state::State;
use crate::vars::VarTable;

pub use process::Sample;

/// Options for [`Effect::compile`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompileOptions {
    /// Leave `@serialize` uncompiled.
    pub no_serialize: bool,
    /// Leave `@gfx` uncompiled.
    pub no_gfx: bool,
}

/// How a slider was changed by script code during the last cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SliderChange(u32);

impl SliderChange {
    /// No change.
    pub const NONE: Self = Self(0);
    /// The displayed value must be refreshed.
    pub const DISPLAY: Self = Self(1);
    /// The host parameter must follow.
    pub const AUTOMATION: Self = Self(2);

    /// Raw bits.
    pub fn bits(self) -> u32 {
        self.0
    }

    /// Whether every bit of `other` is set.
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether no bit is set.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for SliderChange {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

#[derive(Debug, Default)]
struct CompiledCode {
    compiled: bool,
    init: Vec<Option<CodeHandle>>,
    slider: Option<CodeHandle>,
    block: Option<CodeHandle>,
    sample: Option<CodeHandle>,
    gfx: Option<CodeHandle>,
    serialize: Option<CodeHandle>,
}

/// Dirty flags driving recomputation.
#[derive(Debug, Clone, Copy, Default)]
struct Pending {
    fresh: bool,
    init: bool,
    slider: bool,
}

struct SliderAliases<'a> {
    alias: &'a HashMap<String, u32>,
    vars: &'a VarTable,
}

impl VarResolver for SliderAliases<'_> {
    fn resolve(&self, name: &str) -> Option<VarSlot> {
        let index = *self.alias.get(name)?;
        self.vars.slider.get(index as usize).copied()
    }
}

fn compile_section(
    engine: &mut dyn ExprEngine,
    kind: SectionKind,
    section: Option<&Section>,
    resolver: &dyn VarResolver,
) -> Result<Option<CodeHandle>, CompileError> {
    let Some(section) = section.filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    tracing::debug!("compiling {kind} at line {}", section.line_offset);
    engine
        .compile(&section.text, section.line_offset, resolver)
        .map(Some)
        .map_err(|message| CompileError::Section { section: kind, message })
}

/// One hosted effect.
///
/// An instance owns one engine context whose host variables are registered
/// at construction and survive every reload. The lifecycle is
/// [`load`](Self::load), [`compile`](Self::compile), then repeated
/// [`process_f32`](Self::process_f32) / [`process_f64`](Self::process_f64)
/// calls. Loading and compiling must not overlap a processing cycle.
///
/// # Example
///
/// ```rust,ignore
/// let mut fx = Effect::new(Arc::new(config));
/// fx.load("Effects/gain.jsfx", LoadOptions::default())?;
/// fx.compile(CompileOptions::default())?;
/// fx.process_f32(&[&input], &mut [&mut output], input.len());
/// ```
pub struct Effect {
    config: Arc<Config>,
    engine: Box<dyn ExprEngine>,
    vars: VarTable,
    source: Option<SourceGraph>,
    code: CompiledCode,
    pending: Pending,
    block_size: u32,
    sample_rate: f64,
    valid_input_channels: u32,
    masks: SliderMasks,
    triggers: u32,
    midi_in: MidiBuffer,
    midi_out: MidiBuffer,
    files: FileTable,
}

impl std::fmt::Debug for Effect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Effect")
            .field("name", &self.name())
            .field("compiled", &self.code.compiled)
            .field("block_size", &self.block_size)
            .field("sample_rate", &self.sample_rate)
            .finish_non_exhaustive()
    }
}

impl Effect {
    /// Create an instance with a fresh engine context.
    pub fn new(config: Arc<Config>) -> Self {
        let mut engine = config.runtime().new_engine();
        let block_size = config.block_size();
        let sample_rate = config.sample_rate();
        let vars = VarTable::register(engine.as_mut(), block_size, sample_rate);
        let (capacity, extensible) = config.midi_capacity();

        Self {
            engine,
            vars,
            source: None,
            code: CompiledCode::default(),
            pending: Pending::default(),
            block_size,
            sample_rate,
            valid_input_channels: 0,
            masks: SliderMasks::default(),
            triggers: 0,
            midi_in: MidiBuffer::new(capacity, extensible),
            midi_out: MidiBuffer::new(capacity, extensible),
            files: FileTable::new(),
            config,
        }
    }

    /// The configuration this instance was created with.
    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    // -- lifecycle -----------------------------------------------------------

    /// Load a main file and its imports, replacing whatever was loaded.
    ///
    /// On success every slider holds its declared default. On failure the
    /// instance is left unloaded and the error is also reported through the
    /// configured reporter.
    pub fn load(&mut self, path: impl AsRef<Path>, options: LoadOptions) -> Result<(), LoadError> {
        self.unload();

        let graph = match SourceGraph::load(path.as_ref(), &self.config, options) {
            Ok(graph) => graph,
            Err(err) => {
                self.config.log(LogLevel::Error, &err.to_string());
                return Err(err);
            }
        };

        for (slot, slider) in self.vars.slider.iter().zip(&graph.main.header.sliders) {
            self.engine.set(*slot, slider.def);
        }
        tracing::info!(
            "loaded {} with {} import(s)",
            graph.main.path.display(),
            graph.imports.len()
        );
        self.source = Some(graph);
        Ok(())
    }

    /// Drop the compiled code and the loaded source.
    pub fn unload(&mut self) {
        self.unload_code();
        self.source = None;
    }

    /// Drop the compiled code only.
    pub fn unload_code(&mut self) {
        self.code = CompiledCode::default();
        self.pending = Pending::default();
        self.engine.release_code();
    }

    /// Whether a source is loaded.
    pub fn is_loaded(&self) -> bool {
        self.source.is_some()
    }

    /// Whether code is compiled.
    pub fn is_compiled(&self) -> bool {
        self.code.compiled
    }

    /// Compile the loaded source.
    ///
    /// Init sections compile in import order followed by the main file;
    /// every other section is taken from the first unit defining it, main
    /// file first. Any failure discards every unit compiled so far.
    pub fn compile(&mut self, options: CompileOptions) -> Result<(), CompileError> {
        self.unload_code();

        let code = match self.compile_sections(options) {
            Ok(code) => code,
            Err(err) => {
                self.unload_code();
                self.config.log(LogLevel::Error, &err.to_string());
                return Err(err);
            }
        };

        self.code = code;
        self.files.clear();
        self.pending = Pending {
            fresh: true,
            init: true,
            slider: false,
        };
        Ok(())
    }

    fn compile_sections(&mut self, options: CompileOptions) -> Result<CompiledCode, CompileError> {
        let Some(source) = &self.source else {
            return Err(CompileError::NotLoaded);
        };
        let resolver = SliderAliases {
            alias: &source.slider_alias,
            vars: &self.vars,
        };
        let engine = self.engine.as_mut();

        let mut code = CompiledCode::default();
        for unit in source.units() {
            let section = unit.toplevel.section(SectionKind::Init);
            code.init.push(compile_section(engine, SectionKind::Init, section, &resolver)?);
        }

        let mut first_found = |kind: SectionKind| {
            let section = source.find_section(kind).and_then(|unit| unit.toplevel.section(kind));
            compile_section(&mut *engine, kind, section, &resolver)
        };
        code.slider = first_found(SectionKind::Slider)?;
        code.block = first_found(SectionKind::Block)?;
        code.sample = first_found(SectionKind::Sample)?;
        if !options.no_gfx {
            code.gfx = first_found(SectionKind::Gfx)?;
        }
        if !options.no_serialize {
            code.serialize = first_found(SectionKind::Serialize)?;
        }
        code.compiled = true;
        Ok(code)
    }

    /// Run every init unit now.
    ///
    /// Also drops every open file except the serializer. [`process_f32`]
    /// calls this on its own whenever a reinit is pending.
    ///
    /// [`process_f32`]: Self::process_f32
    pub fn init(&mut self) {
        if !self.code.compiled {
            return;
        }
        if self.pending.fresh {
            self.engine.set(self.vars.samplesblock, f64::from(self.block_size));
            self.engine.set(self.vars.srate, self.sample_rate);
            self.pending.fresh = false;
        }

        self.files.clear();
        for i in 0..self.code.init.len() {
            self.execute(self.code.init[i]);
        }
        self.pending.init = false;
        self.pending.slider = true;
    }

    /// Whether the next cycle will run the init units.
    pub fn must_compute_init(&self) -> bool {
        self.pending.init
    }

    /// Whether the next cycle will run `@slider`.
    pub fn must_compute_slider(&self) -> bool {
        self.pending.slider
    }

    fn execute(&mut self, code: Option<CodeHandle>) {
        self.execute_with(code, None);
    }

    fn execute_with(&mut self, code: Option<CodeHandle>, gfx: Option<&mut dyn GfxTarget>) {
        let Some(code) = code else {
            return;
        };
        let mut context = ScriptContext {
            vars: &self.vars,
            midi_in: &mut self.midi_in,
            midi_out: &mut self.midi_out,
            sliders: &mut self.masks,
            files: &self.files,
            config: &self.config,
            source: self.source.as_ref(),
            gfx,
        };
        self.engine.execute(code, &mut context);
    }

    /// Run `@gfx` against `target`.
    ///
    /// `gfx_w` and `gfx_h` are set from the target size first.
    pub fn draw(&mut self, target: Option<&mut dyn GfxTarget>) {
        let Some(code) = self.code.gfx else {
            return;
        };
        if let Some(target) = &target {
            let (w, h) = target.size();
            for (name, value) in [("gfx_w", w), ("gfx_h", h)] {
                if let Some(slot) = self.vars.gfx_register(name) {
                    self.engine.set(slot, f64::from(value));
                }
            }
        }
        self.execute_with(Some(code), target);
    }

    // -- header queries ------------------------------------------------------

    /// The loaded source graph.
    pub fn source(&self) -> Option<&SourceGraph> {
        self.source.as_ref()
    }

    /// The main file's `desc`, empty when nothing is loaded.
    pub fn name(&self) -> &str {
        self.source.as_ref().map_or("", |s| s.main.header.desc.as_str())
    }

    /// Path of the main file.
    pub fn file_path(&self) -> Option<&Path> {
        self.source.as_ref().map(|s| s.main.path.as_path())
    }

    /// The main file's author.
    pub fn author(&self) -> &str {
        self.source.as_ref().map_or("", |s| s.main.header.author.as_str())
    }

    /// The main file's tags.
    pub fn tags(&self) -> &[String] {
        self.source.as_ref().map_or(&[], |s| s.main.header.tags.as_slice())
    }

    /// The main file's `options:` values.
    pub fn options(&self) -> Option<&HeaderOptions> {
        self.source.as_ref().map(|s| &s.main.header.options)
    }

    /// The main file's declared filenames.
    pub fn filenames(&self) -> &[String] {
        self.source.as_ref().map_or(&[], |s| s.main.header.filenames.as_slice())
    }

    /// Declared input channels.
    pub fn num_inputs(&self) -> u32 {
        self.source.as_ref().map_or(0, |s| s.main.header.in_pins.len() as u32)
    }

    /// Declared output channels.
    pub fn num_outputs(&self) -> u32 {
        self.source.as_ref().map_or(0, |s| s.main.header.out_pins.len() as u32)
    }

    /// Name of input pin `index`.
    pub fn input_name(&self, index: u32) -> &str {
        self.source
            .as_ref()
            .and_then(|s| s.main.header.in_pins.get(index as usize))
            .map_or("", String::as_str)
    }

    /// Name of output pin `index`.
    pub fn output_name(&self, index: u32) -> &str {
        self.source
            .as_ref()
            .and_then(|s| s.main.header.out_pins.get(index as usize))
            .map_or("", String::as_str)
    }

    /// Whether the main file or any import defines `kind`.
    pub fn has_section(&self, kind: SectionKind) -> bool {
        self.source.as_ref().is_some_and(|s| s.find_section(kind).is_some())
    }

    /// Declared `@gfx` width and height, 0 meaning unspecified.
    pub fn gfx_dimensions(&self) -> (u32, u32) {
        self.source
            .as_ref()
            .and_then(|s| s.find_section(SectionKind::Gfx))
            .map_or((0, 0), |unit| (unit.toplevel.gfx_w, unit.toplevel.gfx_h))
    }

    /// Number of input channels the last cycle actually read.
    pub fn valid_input_channels(&self) -> u32 {
        self.valid_input_channels
    }

    // -- sliders -------------------------------------------------------------

    /// The slider in slot `index`.
    pub fn slider(&self, index: u32) -> Option<&Slider> {
        self.source.as_ref()?.main.header.slider(index)
    }

    /// Whether slider `index` is declared.
    pub fn slider_exists(&self, index: u32) -> bool {
        self.slider(index).is_some_and(|s| s.exists)
    }

    /// Label of slider `index`.
    pub fn slider_name(&self, index: u32) -> &str {
        self.slider(index).map_or("", |s| s.desc.as_str())
    }

    /// Range of slider `index`.
    pub fn slider_range(&self, index: u32) -> Option<SliderRange> {
        self.slider(index).map(Slider::range)
    }

    /// Whether slider `index` is an enumeration.
    pub fn slider_is_enum(&self, index: u32) -> bool {
        self.slider(index).is_some_and(|s| s.is_enum)
    }

    /// Enumeration labels of slider `index`.
    pub fn slider_enum_names(&self, index: u32) -> &[String] {
        self.slider(index).map_or(&[], |s| s.enum_names.as_slice())
    }

    /// One enumeration label, empty when out of range.
    pub fn slider_enum_name(&self, index: u32, item: u32) -> &str {
        self.slider_enum_names(index)
            .get(item as usize)
            .map_or("", String::as_str)
    }

    /// Whether slider `index` lists the files of a directory.
    pub fn slider_is_path(&self, index: u32) -> bool {
        self.slider(index).is_some_and(Slider::is_path)
    }

    /// Current value of slider `index`, 0 when out of range.
    pub fn slider_value(&self, index: u32) -> f64 {
        self.vars
            .slider
            .get(index as usize)
            .map_or(0.0, |&slot| self.engine.get(slot))
    }

    /// Set slider `index`. A value equal to the current one changes nothing;
    /// any other schedules `@slider` for the next cycle.
    pub fn set_slider_value(&mut self, index: u32, value: f64) {
        let Some(&slot) = self.vars.slider.get(index as usize) else {
            return;
        };
        if self.engine.get(slot) != value {
            self.engine.set(slot, value);
            self.pending.slider = true;
        }
    }

    /// Whether any slider changed during the last cycle.
    pub fn have_slider_changes(&self) -> bool {
        self.masks.changed | self.masks.automate != 0
    }

    /// How slider `index` changed during the last cycle.
    pub fn slider_change_type(&self, index: u32) -> SliderChange {
        if index as usize >= MAX_SLIDERS {
            return SliderChange::NONE;
        }
        let bit = 1u64 << index;
        let mut change = SliderChange::NONE;
        if self.masks.automate & bit != 0 {
            change = change | SliderChange::DISPLAY | SliderChange::AUTOMATION;
        }
        if self.masks.changed & bit != 0 {
            change = change | SliderChange::DISPLAY;
        }
        change
    }

    /// Slider index whose value lives in `slot`.
    pub fn slider_of_var(&self, slot: VarSlot) -> Option<u32> {
        self.vars.slider_of_var(slot)
    }

    // -- state ---------------------------------------------------------------

    /// Capture slider values and the `@serialize` output.
    ///
    /// Returns `None` when nothing is compiled.
    pub fn save_state(&mut self) -> Option<State> {
        if !self.code.compiled {
            return None;
        }

        self.files.with_serializer(|s| s.begin(SerialMode::Write, Vec::new()));
        self.serialize();
        let data = self.files.with_serializer(Serializer::end).unwrap_or_default();

        let mut sliders = vec![0.0; MAX_SLIDERS];
        if let Some(source) = &self.source {
            for slider in source.main.header.declared_sliders() {
                sliders[slider.id as usize] = self.engine.get(self.vars.slider[slider.id as usize]);
            }
        }
        Some(State { sliders, data })
    }

    /// Restore declared sliders from `state` and replay its data through
    /// `@serialize`. Returns `false` when nothing is compiled.
    pub fn load_state(&mut self, state: &State) -> bool {
        if !self.code.compiled {
            return false;
        }

        if let Some(source) = &self.source {
            for slider in source.main.header.declared_sliders() {
                self.engine
                    .set(self.vars.slider[slider.id as usize], state.slider(slider.id));
            }
        }
        self.pending.slider = true;

        self.files
            .with_serializer(|s| s.begin(SerialMode::Read, state.data.clone()));
        self.serialize();
        self.files.with_serializer(Serializer::end);
        true
    }

    fn serialize(&mut self) {
        if self.code.serialize.is_some() {
            if self.pending.init {
                self.init();
            }
            self.execute(self.code.serialize);
        }
    }

    // -- variables -----------------------------------------------------------

    /// Visit every engine variable. Stops when `visit` returns `false`.
    pub fn for_each_var(&self, mut visit: impl FnMut(&str, VarSlot) -> bool) {
        self.engine.for_each_var(&mut visit);
    }

    /// Slot of the variable called `name`.
    pub fn find_var(&self, name: &str) -> Option<VarSlot> {
        let mut found = None;
        self.engine.for_each_var(&mut |var, slot| {
            if var == name {
                found = Some(slot);
                false
            } else {
                true
            }
        });
        found
    }

    /// Value of a variable slot.
    pub fn var_value(&self, slot: VarSlot) -> f64 {
        self.engine.get(slot)
    }

    /// Copy engine memory from `addr` into `dest`.
    pub fn read_vmem(&self, addr: u32, dest: &mut [f64]) {
        self.engine.read_memory(addr, dest);
    }

    /// Number of open file handles, the serializer included.
    pub fn open_files(&self) -> usize {
        self.files.open_count()
    }
}

impl Drop for Effect {
    fn drop(&mut self) {
        self.unload();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slider_change_bits() {
        let both = SliderChange::DISPLAY | SliderChange::AUTOMATION;
        assert_eq!(both.bits(), 3);
        assert!(both.contains(SliderChange::DISPLAY));
        assert!(!SliderChange::DISPLAY.contains(SliderChange::AUTOMATION));
        assert!(SliderChange::NONE.is_empty());
    }
}
