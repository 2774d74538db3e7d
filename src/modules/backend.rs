//! The contract every backing store implements.
//!
//! A backend is a read-only view over one physical source of files. Paths
//! handed to a backend are normalized logical paths relative to the
//! backend's own root (`"."` names the root itself).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{Read, Seek};
use std::time::SystemTime;

use super::error::Result;

/// Kind of a namespace entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileType {
    /// Regular file.
    File,
    /// Directory.
    Directory,
}

impl FileType {
    /// Returns true if this is a directory.
    pub fn is_dir(&self) -> bool {
        matches!(self, FileType::Directory)
    }
}

/// Metadata reported by `stat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// Entry kind.
    pub kind: FileType,
    /// Size in bytes (0 for directories).
    pub size: u64,
    /// Last modification time, when the store records one.
    pub modified: Option<SystemTime>,
}

impl Metadata {
    /// Metadata for a file of the given size.
    pub fn file(size: u64) -> Self {
        Self {
            kind: FileType::File,
            size,
            modified: None,
        }
    }

    /// Metadata for a directory.
    pub fn directory() -> Self {
        Self {
            kind: FileType::Directory,
            size: 0,
            modified: None,
        }
    }

    /// Returns true if this describes a directory.
    pub fn is_dir(&self) -> bool {
        self.kind.is_dir()
    }
}

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirEntry {
    /// Entry name (a single path component).
    pub name: String,
    /// Metadata of the entry as reported by the store that supplied it.
    pub metadata: Metadata,
}

impl DirEntry {
    /// Create a new directory entry.
    pub fn new(name: impl Into<String>, metadata: Metadata) -> Self {
        Self {
            name: name.into(),
            metadata,
        }
    }

    /// Returns true if the entry is a directory.
    pub fn is_dir(&self) -> bool {
        self.metadata.is_dir()
    }
}

/// A readable, seekable asset stream.
pub trait AssetFile: Read + Seek + Send {}

impl<T: Read + Seek + Send> AssetFile for T {}

/// An owned asset stream handed back by `open`.
///
/// The caller owns it; dropping it releases any underlying handle.
pub type AssetReader = Box<dyn AssetFile>;

/// A read-only backing store.
///
/// Implementations must return `NotFound` for missing paths so the
/// namespace can fall through to lower-precedence layers. Every other
/// error is treated as authoritative.
pub trait Backend: Send + Sync + fmt::Debug {
    /// Open a file for reading.
    ///
    /// Fails with `NotFound` when absent and `IsADirectory` for directories.
    fn open(&self, path: &str) -> Result<AssetReader>;

    /// Report metadata for a file or directory.
    fn stat(&self, path: &str) -> Result<Metadata>;

    /// List a directory, sorted by name.
    ///
    /// Fails with `NotFound` when absent and `NotADirectory` for files.
    fn read_dir(&self, path: &str) -> Result<Vec<DirEntry>>;
}
