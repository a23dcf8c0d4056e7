//! Project configuration.
//!
//! Settings come from an optional `jspc.toml` in the project directory,
//! overridden by command-line flags. [`JspcConfig::resolve`] turns the raw
//! values into absolute paths and a [`CompilerSettings`] template that every
//! worker copies.

use std::io;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use jspc_resolve::{CompilerSettings, LanguageLevel, SourceEncoding};
use serde::Deserialize;

use crate::fragment::fragment_path;

/// File name looked up in the project directory.
pub const CONFIG_FILE_NAME: &str = "jspc.toml";

/// Errors that can occur when loading or validating a configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse configuration: {0}")]
    Parse(String),

    /// A value failed validation.
    #[error("invalid value for `{field}`: {message}")]
    Invalid { field: &'static str, message: String },
}

/// Raw configuration as written in `jspc.toml`.
///
/// Relative paths are relative to the project directory.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
#[allow(
    clippy::struct_excessive_bools,
    reason = "Config struct: each bool controls an independent flag"
)]
pub struct JspcConfig {
    /// Root of the page sources.
    pub webapp_dir: PathBuf,
    /// Descriptor the fragments are merged into. Defaults to
    /// `<webapp_dir>/WEB-INF/web.xml`.
    pub web_xml: Option<PathBuf>,
    /// Base name of the per-worker fragment files.
    pub web_xml_fragment: PathBuf,
    /// Merged descriptor. Defaults to `web.xml` next to the fragment base.
    pub merged_web_xml: Option<PathBuf>,
    /// Line marker the fragments are inserted at. Empty means the default.
    pub insertion_marker: Option<String>,
    pub merge_fragment: bool,
    /// Output directory; always the first classpath entry.
    pub generated_classes: PathBuf,
    /// Extra class directories.
    pub classpath: Vec<PathBuf>,
    pub package_root: String,
    pub includes: Vec<String>,
    pub excludes: Vec<String>,
    pub java_encoding: String,
    pub compiler_version: String,
    pub stop_at_first_error: bool,
    /// Worker count. Absent or 0 uses the available parallelism.
    pub threads: Option<usize>,
    pub incremental: bool,
    /// Where incremental builds keep their content hashes.
    pub state_file: PathBuf,
    pub verbose: bool,
}

impl Default for JspcConfig {
    fn default() -> Self {
        JspcConfig {
            webapp_dir: PathBuf::from("src/main/webapp"),
            web_xml: None,
            web_xml_fragment: PathBuf::from("target/webfrag.xml"),
            merged_web_xml: None,
            insertion_marker: None,
            merge_fragment: true,
            generated_classes: PathBuf::from("target/classes"),
            classpath: Vec::new(),
            package_root: "jsp".to_string(),
            includes: vec![
                "**/*.jsp".to_string(),
                "**/*.jspx".to_string(),
                "**/*.jspf".to_string(),
            ],
            excludes: vec!["**/.svn/**".to_string()],
            java_encoding: "UTF-8".to_string(),
            compiler_version: "1.7".to_string(),
            stop_at_first_error: true,
            threads: None,
            incremental: false,
            state_file: PathBuf::from("target/jspc-state.json"),
            verbose: false,
        }
    }
}

/// Values given on the command line. `None` keeps the file value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub threads: Option<usize>,
    pub stop_at_first_error: Option<bool>,
    pub incremental: Option<bool>,
    pub merge_fragment: Option<bool>,
    pub insertion_marker: Option<String>,
    pub verbose: Option<bool>,
}

/// Loads the configuration for `project_dir`.
///
/// An explicit `config_file` must exist. Without one, `<project_dir>/jspc.toml`
/// is read when present and defaults are used otherwise.
pub fn load_config(
    project_dir: &Path,
    config_file: Option<&Path>,
) -> Result<JspcConfig, ConfigError> {
    let path = match config_file {
        Some(path) => project_dir.join(path),
        None => {
            let path = project_dir.join(CONFIG_FILE_NAME);
            if !path.is_file() {
                tracing::debug!(path = %path.display(), "no configuration file, using defaults");
                return Ok(JspcConfig::default());
            }
            path
        }
    };
    let content =
        std::fs::read_to_string(&path).map_err(|source| ConfigError::Io { path, source })?;
    load_config_from_str(&content)
}

/// Parses and validates a configuration from a string.
pub fn load_config_from_str(content: &str) -> Result<JspcConfig, ConfigError> {
    let config: JspcConfig =
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
    config.validate()?;
    Ok(config)
}

impl JspcConfig {
    /// Apply command-line overrides.
    pub fn apply(&mut self, overrides: &ConfigOverrides) {
        if let Some(threads) = overrides.threads {
            self.threads = Some(threads);
        }
        if let Some(stop) = overrides.stop_at_first_error {
            self.stop_at_first_error = stop;
        }
        if let Some(incremental) = overrides.incremental {
            self.incremental = incremental;
        }
        if let Some(merge) = overrides.merge_fragment {
            self.merge_fragment = merge;
        }
        if let Some(marker) = &overrides.insertion_marker {
            self.insertion_marker = Some(marker.clone());
        }
        if let Some(verbose) = overrides.verbose {
            self.verbose = verbose;
        }
    }

    /// Check values that cannot be represented by the types alone.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if SourceEncoding::parse(&self.java_encoding).is_none() {
            return Err(ConfigError::Invalid {
                field: "java_encoding",
                message: format!("unsupported encoding `{}`", self.java_encoding),
            });
        }
        if !is_package_name(&self.package_root) {
            return Err(ConfigError::Invalid {
                field: "package_root",
                message: format!("`{}` is not a package name", self.package_root),
            });
        }
        if self.includes.is_empty() {
            return Err(ConfigError::Invalid {
                field: "includes",
                message: "at least one include pattern is required".to_string(),
            });
        }
        Ok(())
    }

    /// Worker count after applying the "0 or absent means all cores" rule.
    pub fn effective_threads(&self) -> usize {
        match self.threads {
            Some(n) if n > 0 => n,
            _ => std::thread::available_parallelism().map_or(1, NonZeroUsize::get),
        }
    }

    /// Configured marker, treating an empty string as unset.
    pub fn insertion_marker(&self) -> Option<&str> {
        self.insertion_marker.as_deref().filter(|m| !m.is_empty())
    }

    /// Resolve paths against `project_dir` and build the compiler settings.
    pub fn resolve(&self, project_dir: &Path) -> Result<ResolvedConfig, ConfigError> {
        self.validate()?;

        let at = |path: &Path| project_dir.join(path);
        let webapp_dir = at(&self.webapp_dir);
        let web_xml = self
            .web_xml
            .as_deref()
            .map_or_else(|| webapp_dir.join("WEB-INF").join("web.xml"), at);
        let fragment_base = at(&self.web_xml_fragment);
        let merged_web_xml = self.merged_web_xml.as_deref().map_or_else(
            || {
                fragment_base
                    .parent()
                    .unwrap_or(project_dir)
                    .join("web.xml")
            },
            at,
        );
        let generated_classes = at(&self.generated_classes);

        let mut classpath = Vec::with_capacity(self.classpath.len() + 1);
        classpath.push(generated_classes.clone());
        classpath.extend(self.classpath.iter().map(|entry| at(entry)));

        let encoding = SourceEncoding::parse(&self.java_encoding).unwrap_or_default();
        let settings = CompilerSettings {
            classpath,
            output_dir: generated_classes.clone(),
            encoding,
            source_level: LanguageLevel::parse_or_default(Some(&self.compiler_version), "source"),
            target_level: LanguageLevel::parse_or_default(Some(&self.compiler_version), "target"),
            package_root: self.package_root.clone(),
        };

        Ok(ResolvedConfig {
            project_dir: project_dir.to_path_buf(),
            webapp_dir,
            web_xml,
            fragment_base,
            merged_web_xml,
            insertion_marker: self.insertion_marker().map(str::to_string),
            merge_fragment: self.merge_fragment,
            generated_classes,
            includes: self.includes.clone(),
            excludes: self.excludes.clone(),
            stop_at_first_error: self.stop_at_first_error,
            threads: self.effective_threads(),
            incremental: self.incremental,
            state_file: at(&self.state_file),
            verbose: self.verbose,
            settings,
        })
    }
}

fn is_package_name(name: &str) -> bool {
    !name.is_empty()
        && name.split('.').all(|segment| {
            let mut chars = segment.chars();
            chars
                .next()
                .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$')
                && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
        })
}

/// Configuration with every path made absolute and defaults filled in.
#[derive(Clone, Debug, PartialEq, Eq)]
#[allow(
    clippy::struct_excessive_bools,
    reason = "Config struct: each bool controls an independent flag"
)]
pub struct ResolvedConfig {
    pub project_dir: PathBuf,
    pub webapp_dir: PathBuf,
    pub web_xml: PathBuf,
    pub fragment_base: PathBuf,
    pub merged_web_xml: PathBuf,
    pub insertion_marker: Option<String>,
    pub merge_fragment: bool,
    pub generated_classes: PathBuf,
    pub includes: Vec<String>,
    pub excludes: Vec<String>,
    pub stop_at_first_error: bool,
    /// Configured worker count, always at least 1.
    pub threads: usize,
    pub incremental: bool,
    pub state_file: PathBuf,
    pub verbose: bool,
    /// Template copied into every worker's context.
    pub settings: CompilerSettings,
}

impl ResolvedConfig {
    /// Fragment file written by worker `index`.
    pub fn fragment_path(&self, index: usize) -> PathBuf {
        fragment_path(&self.fragment_base, self.threads, index)
    }

    /// Log every effective setting at debug level.
    pub fn log_settings(&self) {
        tracing::debug!("webapp_dir={}", self.webapp_dir.display());
        tracing::debug!("generated_classes={}", self.generated_classes.display());
        tracing::debug!("web_xml={}", self.web_xml.display());
        tracing::debug!("web_xml_fragment={}", self.fragment_base.display());
        tracing::debug!("merged_web_xml={}", self.merged_web_xml.display());
        tracing::debug!(
            "insertion_marker={}",
            self.insertion_marker
                .as_deref()
                .unwrap_or(crate::fragment::DEFAULT_MARKER)
        );
        tracing::debug!("merge_fragment={}", self.merge_fragment);
        tracing::debug!("package_root={}", self.settings.package_root);
        tracing::debug!("java_encoding={}", self.settings.encoding);
        tracing::debug!("compiler_version={}", self.settings.source_level);
        tracing::debug!("stop_at_first_error={}", self.stop_at_first_error);
        tracing::debug!("threads={}", self.threads);
        tracing::debug!("incremental={}", self.incremental);
        tracing::debug!("includes={}", self.includes.join(","));
        tracing::debug!("excludes={}", self.excludes.join(","));
        for entry in &self.settings.classpath {
            tracing::debug!("classpath entry: {}", entry.display());
        }
    }
}
