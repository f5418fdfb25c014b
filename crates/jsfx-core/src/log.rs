//! Diagnostic severity levels.

/// Severity of a host diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    /// Informational.
    Info,
    /// Recoverable problem, such as a corrected slider range.
    Warning,
    /// A failed load or compile.
    Error,
}

impl LogLevel {
    /// Stable lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Info => "info",
            LogLevel::Warning => "warning",
            LogLevel::Error => "error",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
