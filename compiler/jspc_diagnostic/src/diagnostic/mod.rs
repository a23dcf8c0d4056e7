//! The [`Diagnostic`] record and its [`Severity`].

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Severity level for diagnostics.
///
/// Only [`Severity::Error`] fails a build; warnings are surfaced in logs.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// One compilation problem located in a source file.
///
/// `line` is 1-based. A line of `0` means the problem is not attached to a
/// particular line (for example an unreadable file).
#[derive(Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
pub struct Diagnostic {
    /// File the problem originates from.
    pub file: PathBuf,
    /// 1-based line number, or 0 when unknown.
    pub line: u32,
    /// Human-readable message.
    pub message: String,
    /// Error or warning.
    #[serde(default)]
    pub severity: Severity,
}

impl Diagnostic {
    /// Create an error diagnostic.
    #[cold]
    pub fn error(file: impl Into<PathBuf>, line: u32, message: impl Into<String>) -> Self {
        Diagnostic {
            file: file.into(),
            line,
            message: message.into(),
            severity: Severity::Error,
        }
    }

    /// Create a warning diagnostic.
    #[cold]
    pub fn warning(file: impl Into<PathBuf>, line: u32, message: impl Into<String>) -> Self {
        Diagnostic {
            file: file.into(),
            line,
            message: message.into(),
            severity: Severity::Warning,
        }
    }

    /// Create an error that is not tied to a line.
    #[cold]
    pub fn file_error(file: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::error(file, 0, message)
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    pub fn file(&self) -> &Path {
        &self.file
    }
}

impl fmt::Display for Diagnostic {
    /// Renders as `file:line: severity: message`, omitting the line when unknown.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.line == 0 {
            write!(
                f,
                "{}: {}: {}",
                self.file.display(),
                self.severity,
                self.message
            )
        } else {
            write!(
                f,
                "{}:{}: {}: {}",
                self.file.display(),
                self.line,
                self.severity,
                self.message
            )
        }
    }
}
