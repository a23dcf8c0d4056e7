//! Per-worker descriptor fragments and their merge into the application
//! descriptor.
//!
//! Each worker writes the servlet declarations of the pages it compiled to
//! its own fragment file. After all workers finish, [`FragmentMerger`]
//! splices the fragments into the base descriptor in ascending worker index
//! order, independent of the order the workers completed in.

use std::fmt::Write as _;
use std::fs;
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::JspcError;

/// Closing root tag of the descriptor, used when no marker is configured.
pub const DEFAULT_MARKER: &str = "</web-app>";

/// Fragment file written by worker `index`.
///
/// A single configured worker writes to `base` itself; otherwise the worker
/// index is appended as `base.{index}`.
pub fn fragment_path(base: &Path, threads: usize, index: usize) -> PathBuf {
    if threads == 1 {
        base.to_path_buf()
    } else {
        let mut name = base.as_os_str().to_os_string();
        name.push(format!(".{index}"));
        PathBuf::from(name)
    }
}

/// Remove fragments left behind by an earlier run.
pub fn remove_stale_fragments(base: &Path, threads: usize) -> Result<(), JspcError> {
    for index in 0..threads {
        let path = fragment_path(base, threads, index);
        match fs::remove_file(&path) {
            Ok(()) => tracing::debug!(path = %path.display(), "removed stale fragment"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(JspcError::io("remove", &path, e)),
        }
    }
    Ok(())
}

/// Servlet declaration and URL mapping for one compiled page.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServletMapping {
    pub servlet_name: String,
    pub servlet_class: String,
    pub url_pattern: String,
}

impl ServletMapping {
    /// Mapping whose servlet name is the fully-qualified class name.
    pub fn new(servlet_class: impl Into<String>, url_pattern: impl Into<String>) -> Self {
        let servlet_class = servlet_class.into();
        ServletMapping {
            servlet_name: servlet_class.clone(),
            servlet_class,
            url_pattern: url_pattern.into(),
        }
    }
}

/// Render a fragment: all servlet declarations, then all mappings.
pub fn render_fragment(mappings: &[ServletMapping]) -> String {
    let mut out = String::new();
    out.push_str("\n<!--\nAutomatically created by jspc.\nPlace this fragment in the web.xml before all icon, display-name,\ndescription, distributable, and context-param elements.\n-->\n\n");
    for mapping in mappings {
        let _ = write!(
            out,
            "    <servlet>\n        <servlet-name>{}</servlet-name>\n        <servlet-class>{}</servlet-class>\n    </servlet>\n\n",
            escape_xml(&mapping.servlet_name),
            escape_xml(&mapping.servlet_class),
        );
    }
    for mapping in mappings {
        let _ = write!(
            out,
            "    <servlet-mapping>\n        <servlet-name>{}</servlet-name>\n        <url-pattern>{}</url-pattern>\n    </servlet-mapping>\n\n",
            escape_xml(&mapping.servlet_name),
            escape_xml(&mapping.url_pattern),
        );
    }
    out.push_str("<!--\nAll session-config, mime-mapping, welcome-file-list, error-page, taglib,\nresource-ref, security-constraint, login-config, security-role,\nenv-entry, and ejb-ref elements should follow this fragment.\n-->\n");
    out
}

/// Write a rendered fragment for `mappings` to `path`.
pub fn write_fragment(path: &Path, mappings: &[ServletMapping]) -> Result<(), JspcError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| JspcError::io("create", parent, e))?;
    }
    fs::write(path, render_fragment(mappings)).map_err(|e| JspcError::io("write", path, e))
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Splice `fragments` into `base` at the first line containing the marker.
///
/// The marker line is consumed. When the marker is the closing root tag,
/// whether configured or defaulted, that tag is re-emitted after the
/// fragments; any other marker is dropped. When
/// no line contains the marker, the whole base is copied and the fragments
/// follow it.
pub fn splice(base: &str, marker: Option<&str>, fragments: &[String]) -> String {
    let needle = marker.unwrap_or(DEFAULT_MARKER);
    let extra: usize = fragments.iter().map(String::len).sum();
    let mut out = String::with_capacity(base.len() + extra);
    let mut lines = base.lines();

    let mut found = false;
    for line in lines.by_ref() {
        if line.contains(needle) {
            found = true;
            break;
        }
        out.push_str(line);
        out.push('\n');
    }
    if !found {
        tracing::warn!("insertion marker {needle} not found, appending fragments at the end");
    }

    for fragment in fragments {
        out.push_str(fragment);
        if !fragment.is_empty() && !fragment.ends_with('\n') {
            out.push('\n');
        }
    }

    if needle == DEFAULT_MARKER {
        out.push_str(DEFAULT_MARKER);
        out.push('\n');
    }
    for line in lines {
        out.push_str(line);
        out.push('\n');
    }
    out
}

/// What a merge did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The merged descriptor was written.
    Merged {
        output: PathBuf,
        /// Worker indices whose fragment was inserted, ascending.
        inserted: Vec<usize>,
        /// Worker indices without a fragment.
        missing: Vec<usize>,
    },
    /// There was no base descriptor to merge into.
    NoBaseDocument,
}

/// Merges per-worker fragments into the application descriptor.
#[derive(Clone, Debug)]
pub struct FragmentMerger {
    base_document: PathBuf,
    output: PathBuf,
    marker: Option<String>,
    fragments: Vec<PathBuf>,
}

impl FragmentMerger {
    /// `fragments` must be ordered by worker index.
    pub fn new(base_document: PathBuf, output: PathBuf, fragments: Vec<PathBuf>) -> Self {
        FragmentMerger {
            base_document,
            output,
            marker: None,
            fragments,
        }
    }

    /// Use a custom insertion marker. An empty marker, or the closing root
    /// tag itself, keeps the default.
    #[must_use]
    pub fn with_marker(mut self, marker: Option<String>) -> Self {
        self.marker = marker.filter(|m| !m.is_empty() && m.as_str() != DEFAULT_MARKER);
        self
    }

    #[tracing::instrument(level = "debug", skip(self), fields(output = %self.output.display()))]
    pub fn merge(&self) -> Result<MergeOutcome, JspcError> {
        let base = match fs::read_to_string(&self.base_document) {
            Ok(base) => base,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::info!(
                    "{} does not exist, cannot merge with generated fragment",
                    self.base_document.display()
                );
                return Ok(MergeOutcome::NoBaseDocument);
            }
            Err(e) => return Err(JspcError::io("read", &self.base_document, e)),
        };

        let mut contents = Vec::with_capacity(self.fragments.len());
        let mut inserted = Vec::new();
        let mut missing = Vec::new();
        for (index, path) in self.fragments.iter().enumerate() {
            match fs::read_to_string(path) {
                Ok(text) => {
                    contents.push(text);
                    inserted.push(index);
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    tracing::info!("No fragment web.xml file generated for worker {index}");
                    missing.push(index);
                }
                Err(e) => return Err(JspcError::io("read", path, e)),
            }
        }

        let merged = splice(&base, self.marker.as_deref(), &contents);
        if let Some(parent) = self.output.parent() {
            fs::create_dir_all(parent).map_err(|e| JspcError::io("create", parent, e))?;
        }
        let mut file = io::BufWriter::new(
            fs::File::create(&self.output).map_err(|e| JspcError::io("create", &self.output, e))?,
        );
        file.write_all(merged.as_bytes())
            .and_then(|()| file.flush())
            .map_err(|e| JspcError::io("write", &self.output, e))?;

        tracing::info!(
            fragments = inserted.len(),
            "merged descriptor written to {}",
            self.output.display()
        );
        Ok(MergeOutcome::Merged {
            output: self.output.clone(),
            inserted,
            missing,
        })
    }
}
