//! Resolved class artifacts and class-file header parsing.

use std::path::PathBuf;
use std::sync::Arc;

use crate::ResolutionKey;

/// Magic number that starts every class file.
const CLASS_MAGIC: u32 = 0xCAFE_BABE;

/// Bytes needed for magic, minor and major version.
const HEADER_LEN: usize = 8;

/// Header fields of a class file.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ClassMetadata {
    pub minor_version: u16,
    pub major_version: u16,
}

impl ClassMetadata {
    /// Feature release that produced this class (major 52 is release 8).
    pub fn release(&self) -> u16 {
        self.major_version.saturating_sub(44)
    }
}

/// A class found on the classpath: its bytes plus parsed header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassArtifact {
    pub name: ResolutionKey,
    pub bytes: Arc<[u8]>,
    pub metadata: ClassMetadata,
    /// File the bytes were read from.
    pub origin: PathBuf,
}

impl ClassArtifact {
    /// Parse the header of `bytes` and wrap them as an artifact.
    pub fn from_bytes(
        name: ResolutionKey,
        bytes: Vec<u8>,
        origin: PathBuf,
    ) -> Result<Self, ClassFormatError> {
        let metadata = parse_header(&bytes)?;
        Ok(ClassArtifact {
            name,
            bytes: Arc::from(bytes),
            metadata,
            origin,
        })
    }
}

/// A class file whose header cannot be read.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClassFormatError {
    #[error("class file truncated: {len} bytes, need at least {}", HEADER_LEN)]
    Truncated { len: usize },
    #[error("bad class file magic {found:#010x}")]
    BadMagic { found: u32 },
}

/// Parse the fixed class-file header.
pub fn parse_header(bytes: &[u8]) -> Result<ClassMetadata, ClassFormatError> {
    let [m0, m1, m2, m3, n0, n1, j0, j1, ..] = *bytes else {
        return Err(ClassFormatError::Truncated { len: bytes.len() });
    };

    let magic = u32::from_be_bytes([m0, m1, m2, m3]);
    if magic != CLASS_MAGIC {
        return Err(ClassFormatError::BadMagic { found: magic });
    }

    Ok(ClassMetadata {
        minor_version: u16::from_be_bytes([n0, n1]),
        major_version: u16::from_be_bytes([j0, j1]),
    })
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
