//! Fatal orchestration errors.
//!
//! Anything here aborts the run. Per-file compilation problems are never
//! errors: they travel as [`jspc_diagnostic::Diagnostic`] values inside
//! worker reports.

use std::io;
use std::path::{Path, PathBuf};

use crate::compile::CompileFault;
use crate::config::ConfigError;

/// A failure that stops the whole run.
#[derive(Debug, thiserror::Error)]
pub enum JspcError {
    /// A required file could not be read or written.
    #[error("cannot {action} {}: {source}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// An include or exclude pattern is not a valid glob.
    #[error("invalid file pattern `{pattern}`: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    /// The persisted build state could not be written.
    #[error("cannot store build state in {}: {source}", path.display())]
    State {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Compile(#[from] CompileFault),

    /// A worker thread panicked instead of producing a report.
    #[error("worker {worker} panicked: {message}")]
    WorkerPanicked { worker: usize, message: String },
}

impl JspcError {
    /// Wrap an I/O error with the operation and path it concerns.
    #[cold]
    pub fn io(action: &'static str, path: &Path, source: io::Error) -> Self {
        JspcError::Io {
            action,
            path: path.to_path_buf(),
            source,
        }
    }
}
