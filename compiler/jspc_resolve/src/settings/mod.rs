//! Per-worker compiler settings.
//!
//! A run builds one [`CompilerSettings`] value and clones it into every
//! worker's context, so no worker can observe another worker's changes.

use std::fmt;
use std::path::PathBuf;

/// Language level used for both source and target compatibility.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LanguageLevel(u8);

impl LanguageLevel {
    /// Level used when none is configured or the configured one is unknown.
    pub const DEFAULT: LanguageLevel = LanguageLevel(7);

    const MAX_RELEASE: u8 = 21;

    /// Parse `1.1`..`1.9` or a plain release number `9`..`21`.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if let Some(minor) = text.strip_prefix("1.") {
            return match minor.parse::<u8>() {
                Ok(n @ 1..=9) => Some(LanguageLevel(n)),
                _ => None,
            };
        }
        match text.parse::<u8>() {
            Ok(n) if (9..=Self::MAX_RELEASE).contains(&n) => Some(LanguageLevel(n)),
            _ => None,
        }
    }

    /// Parse a configured level, warning and falling back on unknown input.
    ///
    /// `role` names the setting in the warning ("source" or "target").
    pub fn parse_or_default(text: Option<&str>, role: &str) -> Self {
        match text {
            None => Self::DEFAULT,
            Some(text) => Self::parse(text).unwrap_or_else(|| {
                tracing::warn!("Unknown {role} VM {text} ignored.");
                Self::DEFAULT
            }),
        }
    }

    pub fn release(self) -> u8 {
        self.0
    }

    /// Class-file major version emitted for this level.
    pub fn class_file_major(self) -> u16 {
        u16::from(self.0) + 44
    }
}

impl Default for LanguageLevel {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for LanguageLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 < 9 {
            write!(f, "1.{}", self.0)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Character encoding of page sources.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum SourceEncoding {
    #[default]
    Utf8,
    Latin1,
    Ascii,
}

/// Source bytes that are invalid in the configured encoding.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {encoding} byte sequence at offset {offset}")]
pub struct DecodeError {
    pub encoding: SourceEncoding,
    pub offset: usize,
}

impl SourceEncoding {
    /// Parse an encoding name, case-insensitively.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Some(SourceEncoding::Utf8),
            "iso-8859-1" | "iso8859-1" | "iso_8859_1" | "latin1" | "latin-1" => {
                Some(SourceEncoding::Latin1)
            }
            "us-ascii" | "ascii" => Some(SourceEncoding::Ascii),
            _ => None,
        }
    }

    /// Decode raw page bytes.
    pub fn decode(self, bytes: &[u8]) -> Result<String, DecodeError> {
        match self {
            SourceEncoding::Utf8 => String::from_utf8(bytes.to_vec()).map_err(|e| DecodeError {
                encoding: self,
                offset: e.utf8_error().valid_up_to(),
            }),
            SourceEncoding::Latin1 => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
            SourceEncoding::Ascii => match bytes.iter().position(|b| !b.is_ascii()) {
                Some(offset) => Err(DecodeError {
                    encoding: self,
                    offset,
                }),
                None => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
            },
        }
    }
}

impl fmt::Display for SourceEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceEncoding::Utf8 => write!(f, "UTF-8"),
            SourceEncoding::Latin1 => write!(f, "ISO-8859-1"),
            SourceEncoding::Ascii => write!(f, "US-ASCII"),
        }
    }
}

/// Immutable compiler configuration, copied into each worker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompilerSettings {
    /// Class directories searched for referenced classes.
    pub classpath: Vec<PathBuf>,
    /// Directory receiving generated artifacts.
    pub output_dir: PathBuf,
    pub encoding: SourceEncoding,
    pub source_level: LanguageLevel,
    pub target_level: LanguageLevel,
    /// Root package for generated classes.
    pub package_root: String,
}

impl CompilerSettings {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        CompilerSettings {
            classpath: Vec::new(),
            output_dir: output_dir.into(),
            encoding: SourceEncoding::Utf8,
            source_level: LanguageLevel::DEFAULT,
            target_level: LanguageLevel::DEFAULT,
            package_root: "jsp".to_string(),
        }
    }

    #[must_use]
    pub fn with_classpath(mut self, classpath: Vec<PathBuf>) -> Self {
        self.classpath = classpath;
        self
    }

    #[must_use]
    pub fn with_encoding(mut self, encoding: SourceEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Use one level for both source and target.
    #[must_use]
    pub fn with_level(mut self, level: LanguageLevel) -> Self {
        self.source_level = level;
        self.target_level = level;
        self
    }

    #[must_use]
    pub fn with_package_root(mut self, package_root: impl Into<String>) -> Self {
        self.package_root = package_root.into();
        self
    }
}
