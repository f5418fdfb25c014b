//! Interfaces to the expression engine that compiles and runs section code.
//!
//! The host never evaluates expressions itself. It owns an [`ExprEngine`]
//! created by an [`EngineRuntime`], registers its fixed variables with it,
//! hands it section text to compile and asks it to execute compiled units.
//! While a unit runs, the engine calls back into the host through
//! [`ScriptHost`] for everything that touches host state: MIDI, slider
//! notifications, file handles and graphics.
//!
//! ```text
//!  Effect ──compile(text)──▶ ExprEngine ──execute(code)──┐
//!    ▲                                                   │
//!    └──────────── ScriptHost callbacks ◀────────────────┘
//! ```

use crate::gfx::GfxTarget;
use crate::midi::MidiEventRef;

/// Stable reference to one engine variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarSlot(pub u32);

/// Reference to one compiled unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CodeHandle(pub u32);

/// Name lookup consulted by the compiler before its own variable table.
///
/// Slider aliases go through this: a script naming `gain` resolves to the
/// same slot as `slider1` when `slider1:gain=...` was declared.
pub trait VarResolver {
    /// Slot bound to `name`, if the host claims it.
    fn resolve(&self, name: &str) -> Option<VarSlot>;
}

/// Resolver that claims nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAliases;

impl VarResolver for NoAliases {
    fn resolve(&self, _name: &str) -> Option<VarSlot> {
        None
    }
}

/// Read/write access to variable values.
pub trait VarAccess {
    /// Current value of `slot`.
    fn get(&self, slot: VarSlot) -> f64;
    /// Overwrite the value of `slot`.
    fn set(&mut self, slot: VarSlot, value: f64);
}

/// One expression-engine context.
pub trait ExprEngine: VarAccess + Send {
    /// Register a host variable, returning its slot. Registering a name
    /// twice returns the same slot.
    fn register_var(&mut self, name: &str) -> VarSlot;

    /// Compile `text`, whose first line is `line_offset` in the source file.
    ///
    /// # Errors
    ///
    /// Returns the engine's diagnostic text.
    fn compile(&mut self, text: &str, line_offset: u32, resolver: &dyn VarResolver) -> Result<CodeHandle, String>;

    /// Run a compiled unit to completion.
    fn execute(&mut self, code: CodeHandle, host: &mut dyn ScriptHost);

    /// Drop every compiled unit and every variable the scripts created.
    /// Registered host variables keep their slots.
    fn release_code(&mut self);

    /// Visit every variable by name. Stops when `visit` returns `false`.
    fn for_each_var(&self, visit: &mut dyn FnMut(&str, VarSlot) -> bool);

    /// Copy `dest.len()` values of engine memory starting at `addr`.
    fn read_memory(&self, addr: u32, dest: &mut [f64]);
}

/// Factory for engine contexts. Shared across effect instances.
pub trait EngineRuntime: Send + Sync {
    /// Create a fresh engine context.
    fn new_engine(&self) -> Box<dyn ExprEngine>;
}

/// Argument of `file_open`: a declared filename slot or a literal path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileSpec<'a> {
    /// Index into the header's `filename:` table.
    Index(u32),
    /// Path relative to the data root, or absolute.
    Path(&'a str),
}

/// Format of an opened audio file.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RiffInfo {
    /// Channel count.
    pub channels: u32,
    /// Sample rate in Hz.
    pub sample_rate: f64,
}

/// Host services available to running script code.
///
/// Methods that depend on script variables receive the engine's
/// [`VarAccess`] so the host can read selectors such as `ext_midi_bus`.
pub trait ScriptHost {
    /// Queue an outgoing MIDI message at frame `offset`.
    fn midi_send(&mut self, vars: &mut dyn VarAccess, offset: u32, data: &[u8]) -> bool;

    /// Take the next incoming MIDI message.
    fn midi_recv(&mut self, vars: &mut dyn VarAccess) -> Option<MidiEventRef<'_>>;

    /// Mark sliders in `mask` as changed for display.
    fn slider_change(&mut self, mask: u64);

    /// Mark sliders in `mask` as changed and needing host automation.
    fn slider_automate(&mut self, mask: u64);

    /// Slider index backed by `slot`, if any.
    fn slider_of_var(&self, slot: VarSlot) -> Option<u32>;

    /// Open a file, returning its handle.
    fn file_open(&mut self, spec: FileSpec<'_>) -> Option<u32>;

    /// Close a handle. The serializer handle cannot be closed.
    fn file_close(&mut self, handle: u32) -> bool;

    /// Seek back to the start.
    fn file_rewind(&mut self, handle: u32) -> bool;

    /// Remaining values to read, `-1` for a handle in write mode, `0` when
    /// the handle is invalid.
    fn file_avail(&mut self, handle: u32) -> i64;

    /// Read into or write from `value`, depending on the handle's mode.
    fn file_var(&mut self, handle: u32, value: &mut f64) -> bool;

    /// Read into or write from `buf`. Returns the number of values moved.
    fn file_mem(&mut self, handle: u32, buf: &mut [f64]) -> u32;

    /// Read into or write from `text`.
    fn file_string(&mut self, handle: u32, text: &mut String) -> bool;

    /// Channel count and rate of an audio handle.
    fn file_riff(&mut self, handle: u32) -> Option<RiffInfo>;

    /// Whether `handle` is a text file.
    fn file_text(&mut self, handle: u32) -> bool;

    /// Raster target, present only while drawing.
    fn gfx(&mut self) -> Option<&mut dyn GfxTarget>;
}
