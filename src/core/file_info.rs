//! core::file_info
//!
//! File-system metadata attached to tree nodes.
//!
//! `FileInfo` records are produced by the scanner and handed to the core
//! already computed. Nothing in this module touches the file system.
//!
//! # Invariants
//!
//! - A record describes either a file or a directory, never both
//! - Checksums exist only on file records
//! - Timestamps are held at millisecond precision, matching the wire format

use std::collections::BTreeMap;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::types::TypeError;

/// Errors from building file metadata.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FileInfoError {
    #[error("checksums are only recorded for files, '{name}' is a directory")]
    ChecksumOnDirectory { name: String },

    #[error("file name cannot be empty")]
    EmptyName,

    #[error("timestamp {0} ms is out of range")]
    TimestampOutOfRange(i64),

    #[error(transparent)]
    Type(#[from] TypeError),
}

/// Whether a record describes a file or a directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    File,
    Directory,
}

/// Checksum algorithms carried on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChecksumAlgorithm {
    Sha1,
    Md5,
}

impl ChecksumAlgorithm {
    /// Length of the hex digest for this algorithm.
    pub fn hex_len(self) -> usize {
        match self {
            ChecksumAlgorithm::Sha1 => 40,
            ChecksumAlgorithm::Md5 => 32,
        }
    }

    /// Validate and normalize (lowercase) a hex digest.
    pub fn normalize(self, digest: &str) -> Result<String, TypeError> {
        let digest = digest.to_ascii_lowercase();
        if digest.len() != self.hex_len() {
            return Err(TypeError::InvalidChecksum(format!(
                "expected {} hex characters for {:?}, got {}",
                self.hex_len(),
                self,
                digest.len()
            )));
        }
        if !digest.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(TypeError::InvalidChecksum(
                "checksum must be hexadecimal".into(),
            ));
        }
        Ok(digest)
    }
}

/// File-system metadata for one node.
///
/// # Example
///
/// ```
/// use ipmkit::core::file_info::{ChecksumAlgorithm, FileInfo, FileKind};
///
/// let mut info = FileInfo::file("report.pdf").unwrap();
/// info.set_location("file:///data/report.pdf").unwrap();
/// info.set_size(Some(2048));
/// info.set_checksum(ChecksumAlgorithm::Md5, "D41D8CD98F00B204E9800998ECF8427E").unwrap();
///
/// assert_eq!(info.kind(), FileKind::File);
/// assert_eq!(
///     info.checksum(ChecksumAlgorithm::Md5),
///     Some("d41d8cd98f00b204e9800998ecf8427e")
/// );
///
/// let mut dir = FileInfo::directory("data").unwrap();
/// assert!(dir.set_checksum(ChecksumAlgorithm::Md5, "d41d8cd98f00b204e9800998ecf8427e").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    name: String,
    location: Option<String>,
    kind: FileKind,
    size: Option<u64>,
    checksums: BTreeMap<ChecksumAlgorithm, String>,
    formats: Vec<String>,
    created: Option<DateTime<Utc>>,
    modified: Option<DateTime<Utc>>,
}

impl FileInfo {
    fn new(name: impl Into<String>, kind: FileKind) -> Result<Self, FileInfoError> {
        let name = name.into();
        if name.is_empty() {
            return Err(FileInfoError::EmptyName);
        }
        Ok(Self {
            name,
            location: None,
            kind,
            size: None,
            checksums: BTreeMap::new(),
            formats: Vec::new(),
            created: None,
            modified: None,
        })
    }

    /// Metadata for a regular file.
    pub fn file(name: impl Into<String>) -> Result<Self, FileInfoError> {
        Self::new(name, FileKind::File)
    }

    /// Metadata for a directory.
    pub fn directory(name: impl Into<String>) -> Result<Self, FileInfoError> {
        Self::new(name, FileKind::Directory)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> FileKind {
        self.kind
    }

    pub fn is_file(&self) -> bool {
        self.kind == FileKind::File
    }

    pub fn is_directory(&self) -> bool {
        self.kind == FileKind::Directory
    }

    /// Location of the backing entity, as a URI.
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    /// Set the location. The value must be an absolute URI.
    pub fn set_location(&mut self, location: impl Into<String>) -> Result<(), FileInfoError> {
        let location = super::types::Iri::new(location)?;
        self.location = Some(location.into());
        Ok(())
    }

    pub fn size(&self) -> Option<u64> {
        self.size
    }

    pub fn set_size(&mut self, size: Option<u64>) {
        self.size = size;
    }

    /// Get the checksum recorded for an algorithm.
    pub fn checksum(&self, algorithm: ChecksumAlgorithm) -> Option<&str> {
        self.checksums.get(&algorithm).map(String::as_str)
    }

    /// All recorded checksums, ordered by algorithm.
    pub fn checksums(&self) -> impl Iterator<Item = (ChecksumAlgorithm, &str)> {
        self.checksums.iter().map(|(a, d)| (*a, d.as_str()))
    }

    /// Record a checksum. Rejected for directories and malformed digests.
    pub fn set_checksum(
        &mut self,
        algorithm: ChecksumAlgorithm,
        digest: &str,
    ) -> Result<(), FileInfoError> {
        if self.is_directory() {
            return Err(FileInfoError::ChecksumOnDirectory {
                name: self.name.clone(),
            });
        }
        let digest = algorithm.normalize(digest)?;
        self.checksums.insert(algorithm, digest);
        Ok(())
    }

    /// Format identifiers, in the order they were detected.
    pub fn formats(&self) -> &[String] {
        &self.formats
    }

    pub fn add_format(&mut self, format: impl Into<String>) {
        let format = format.into();
        if !self.formats.contains(&format) {
            self.formats.push(format);
        }
    }

    pub fn created(&self) -> Option<DateTime<Utc>> {
        self.created
    }

    /// Set the creation time, truncated to milliseconds.
    pub fn set_created(&mut self, time: Option<DateTime<Utc>>) {
        self.created = time.map(truncate_millis);
    }

    pub fn modified(&self) -> Option<DateTime<Utc>> {
        self.modified
    }

    /// Set the modification time, truncated to milliseconds.
    pub fn set_modified(&mut self, time: Option<DateTime<Utc>>) {
        self.modified = time.map(truncate_millis);
    }
}

fn truncate_millis(time: DateTime<Utc>) -> DateTime<Utc> {
    let millis = time.timestamp_millis();
    Utc.timestamp_millis_opt(millis).single().unwrap_or(time)
}

/// Convert epoch milliseconds to a UTC timestamp.
pub fn from_epoch_millis(millis: i64) -> Result<DateTime<Utc>, FileInfoError> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or(FileInfoError::TimestampOutOfRange(millis))
}
