//! Diagnostics for page precompilation.
//!
//! Every problem the per-file compiler finds is reported as a structured
//! [`Diagnostic`] record `(file, line, message)` instead of being raised.
//! Diagnostics flow upward unchanged:
//!
//! ```text
//! compile unit ──► DiagnosticList (per file)
//!                      │
//!                      ▼
//!                 worker report (per shard)
//!                      │
//!                      ▼
//!                 build summary (per run)
//! ```

mod diagnostic;
mod list;

pub use diagnostic::{Diagnostic, Severity};
pub use list::DiagnosticList;
