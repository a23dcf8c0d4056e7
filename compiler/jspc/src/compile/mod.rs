//! Boundary to the per-file page compiler.
//!
//! The orchestrator treats translation and compilation of a single page as
//! an opaque step behind [`UnitCompiler`]. Implementations resolve every
//! external type through the [`CompilationContext`] they are handed and
//! report problems as diagnostics; only an I/O failure they cannot recover
//! from is returned as a [`CompileFault`].

mod directive;

use std::io;
use std::path::PathBuf;
use std::time::Instant;

use jspc_diagnostic::DiagnosticList;
use jspc_resolve::CompilationContext;

use crate::fragment::ServletMapping;
use crate::SourceFile;

pub use directive::{class_name_for, mangle_identifier, DirectiveCompiler};

/// Result of compiling one page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CompilationOutcome {
    Success {
        /// Files written for the page.
        artifacts: Vec<PathBuf>,
        /// Descriptor entry for the page, if it is servlet-addressable.
        mapping: Option<ServletMapping>,
    },
    Failure {
        /// Problems in reporting order. Never empty.
        diagnostics: DiagnosticList,
    },
}

impl CompilationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, CompilationOutcome::Success { .. })
    }

    /// Failure carrying `diagnostics`.
    pub fn failure(diagnostics: impl IntoIterator<Item = jspc_diagnostic::Diagnostic>) -> Self {
        CompilationOutcome::Failure {
            diagnostics: diagnostics.into_iter().collect(),
        }
    }
}

/// An unrecoverable I/O failure inside the page compiler.
#[derive(Debug, thiserror::Error)]
#[error("cannot {action} {}: {source}", path.display())]
pub struct CompileFault {
    pub action: &'static str,
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

impl CompileFault {
    #[cold]
    pub fn new(action: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        CompileFault {
            action,
            path: path.into(),
            source,
        }
    }
}

/// Translates and compiles one page inside a worker's context.
///
/// Called concurrently from several workers, each with its own context.
pub trait UnitCompiler: Send + Sync {
    fn compile(
        &self,
        file: &SourceFile,
        ctx: &mut CompilationContext,
    ) -> Result<CompilationOutcome, CompileFault>;
}

/// Compile one page, logging how long it took.
pub fn compile_unit(
    compiler: &dyn UnitCompiler,
    file: &SourceFile,
    ctx: &mut CompilationContext,
) -> Result<CompilationOutcome, CompileFault> {
    let start = Instant::now();
    let outcome = compiler.compile(file, ctx);
    // a compiler that bails out mid-unit must not leave its target behind
    ctx.end_unit();
    tracing::debug!(
        worker = ctx.worker(),
        file = %file.relative,
        elapsed = ?start.elapsed(),
        ok = outcome.as_ref().is_ok_and(CompilationOutcome::is_success),
        "compiled"
    );
    outcome
}
