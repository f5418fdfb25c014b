//! JSFX Core - source model and engine interfaces for hosting JSFX effects
//!
//! This crate holds everything about an effect that does not depend on a
//! running instance: how a source file splits into sections, what its
//! header declares, how MIDI events are stored, and the traits a host uses
//! to talk to the expression engine, audio codecs and a raster target.
//!
//! # Source Model
//!
//! - [`parse_toplevel`] - split a file into header and `@` sections
//! - [`parse_header`] - two-pass header extraction into a [`Header`]
//! - [`parse_slider`] / [`parse_filename`] - per-line sub-grammars
//!
//! # Runtime Interfaces
//!
//! - [`ExprEngine`] / [`EngineRuntime`] - compile and execute section code
//! - [`ScriptHost`] - host services callable from running code
//! - [`AudioFormat`] / [`AudioReader`] - pluggable audio-file codecs
//! - [`GfxTarget`] - framebuffer primitives for `@gfx`
//!
//! # MIDI
//!
//! - [`MidiBuffer`] - packed, capacity-bounded event store with per-bus reads
//!
//! # Example
//!
//! ```rust
//! use jsfx_core::{parse_header, parse_toplevel};
//!
//! let source = "desc:Tremolo\nslider1:4<0.1,20,0.1>Rate (Hz)\n@sample\nspl0 *= 1;\n";
//! let toplevel = parse_toplevel(source).unwrap();
//! let header = parse_header(&toplevel.header);
//!
//! assert_eq!(header.desc, "Tremolo");
//! assert_eq!(header.sliders[0].max, 20.0);
//! assert!(toplevel.sample.is_some());
//! ```

pub mod audio;
pub mod engine;
pub mod filename;
pub mod gfx;
pub mod header;
pub mod log;
pub mod midi;
pub mod slider;
pub mod source;
pub mod text;

pub use audio::{AudioFileInfo, AudioFormat, AudioReader};
pub use engine::{
    CodeHandle, EngineRuntime, ExprEngine, FileSpec, NoAliases, RiffInfo, ScriptHost, VarAccess,
    VarResolver, VarSlot,
};
pub use filename::{ParsedFilename, parse_filename};
pub use gfx::{Color, GFX_REGISTERS, GfxTarget};
pub use header::{Header, HeaderOptions, parse_header};
pub use log::LogLevel;
pub use midi::{MidiBuffer, MidiEvent, MidiEventRef};
pub use slider::{Slider, SliderRange, parse_slider};
pub use source::{ParseError, Section, SectionKind, Toplevel, parse_toplevel};

/// Number of slider slots.
pub const MAX_SLIDERS: usize = 64;

/// Number of audio channels a script can address.
pub const MAX_CHANNELS: usize = 64;

/// Number of MIDI buses.
pub const MAX_MIDI_BUSES: usize = 16;

/// Number of trigger bits.
pub const MAX_TRIGGERS: u32 = 10;

/// Deepest allowed import nesting.
pub const MAX_IMPORT_DEPTH: u32 = 32;
