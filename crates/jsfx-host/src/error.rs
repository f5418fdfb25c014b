//! Error types for loading and compiling effects.

use std::path::{Path, PathBuf};

use jsfx_core::{ParseError, SectionKind};
use thiserror::Error;

/// Errors that abort [`Effect::load`](crate::Effect::load).
#[derive(Debug, Error)]
pub enum LoadError {
    /// A source file could not be opened or read
    #[error("{}: cannot open file for reading", display_name(.path))]
    Open {
        /// The file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A source file has an invalid section tag
    #[error("{}:{}: {}", display_name(.file), .source.line + 1, .source.message)]
    Parse {
        /// The file.
        file: PathBuf,
        /// Parser diagnostic.
        #[source]
        source: ParseError,
    },

    /// The main file has no `desc:` line
    #[error("{}: the required `desc` field is missing", display_name(.file))]
    MissingDescription {
        /// The main file.
        file: PathBuf,
    },

    /// An import name resolved to no file
    #[error("{}: cannot find import: {name}", display_name(.origin))]
    ImportNotFound {
        /// File containing the `import` line.
        origin: PathBuf,
        /// The import name as written.
        name: String,
    },

    /// Imports nest deeper than the limit
    #[error("{}: too many import levels", display_name(.origin))]
    TooManyImportLevels {
        /// File whose import exceeded the limit.
        origin: PathBuf,
    },
}

impl LoadError {
    /// Create an open error.
    pub fn open(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LoadError::Open {
            path: path.into(),
            source,
        }
    }
}

/// Errors that abort [`Effect::compile`](crate::Effect::compile).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// Nothing is loaded
    #[error("no source is loaded, cannot compile")]
    NotLoaded,

    /// The engine rejected a section
    #[error("{section}: {message}")]
    Section {
        /// The failing section.
        section: SectionKind,
        /// Engine diagnostic.
        message: String,
    },
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |name| name.to_string_lossy().into_owned())
}
