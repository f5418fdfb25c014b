//! JSFX Host - run JSFX effects against a pluggable expression engine
//!
//! The host turns effect source files into a running instance: it resolves
//! imports, binds slider and channel variables to engine slots, compiles
//! each section, drives the block and sample cycle, moves MIDI in and out
//! and persists state through `@serialize`.
//!
//! # Lifecycle
//!
//! ```text
//!  Effect::new ─▶ load ─▶ compile ─▶ process_f32 / process_f64 ...
//!                  ▲          │
//!                  └─ unload ◀┘       save_state / load_state
//! ```
//!
//! - [`Effect`] - the instance and its public surface
//! - [`SourceGraph`] - a main file with its imports in dependency order
//! - [`State`] - slider values plus serialized bytes
//! - [`TimeInfo`] - transport pushed by the host
//!
//! # Files
//!
//! Scripts open files through handles kept in a [`FileTable`]. Handle 0 is
//! the serializer; text, raw and audio files take the following slots.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use jsfx_config::Config;
//! use jsfx_host::{CompileOptions, Effect, LoadOptions};
//!
//! let config = Arc::new(Config::new(runtime).with_import_root("Effects"));
//! let mut fx = Effect::new(config);
//! fx.load("Effects/utility/volume.jsfx", LoadOptions::default())?;
//! fx.compile(CompileOptions::default())?;
//!
//! let input = vec![0.5f32; 128];
//! let mut output = vec![0.0f32; 128];
//! fx.process_f32(&[&input], &mut [&mut output], 128);
//! ```

pub mod effect;
pub mod error;
pub mod files;
pub mod graph;
mod script;
pub mod state;
pub mod transport;
mod vars;

pub use effect::{CompileOptions, Effect, Sample, SliderChange};
pub use error::{CompileError, LoadError};
pub use files::{FileTable, FileType, OpenFile, SerialMode, Serializer, detect_file_type};
pub use graph::{FileUid, LoadOptions, SourceGraph, SourceUnit, resolve_import};
pub use state::State;
pub use transport::{PlaybackState, TimeInfo};
