//! In-memory backend for assets compiled into the program.

use std::collections::BTreeMap;
use std::io::Cursor;
use std::sync::Arc;

use super::backend::{AssetReader, Backend, DirEntry, Metadata};
use super::error::{Error, Result};
use super::path::{self, ROOT};

/// A fixed set of files held in memory.
///
/// Directories are implied by the file names.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    files: BTreeMap<String, Arc<[u8]>>,
}

impl MemoryBackend {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file, normalizing its name.
    ///
    /// # Errors
    ///
    /// `InvalidPath` when the name escapes the root or names the root.
    pub fn with_file(mut self, name: &str, content: impl AsRef<[u8]>) -> Result<Self> {
        let name = path::normalize(name)?;
        if name == ROOT {
            return Err(Error::invalid_path(name));
        }
        self.files.insert(name, Arc::from(content.as_ref()));
        Ok(self)
    }

    fn is_dir(&self, path: &str) -> bool {
        if path == ROOT {
            return true;
        }
        let prefix = format!("{}/", path);
        self.files
            .range(prefix.clone()..)
            .next()
            .is_some_and(|(name, _)| name.starts_with(&prefix))
    }
}

impl Backend for MemoryBackend {
    fn open(&self, path: &str) -> Result<AssetReader> {
        match self.files.get(path) {
            Some(content) => Ok(Box::new(Cursor::new(content.clone()))),
            None if self.is_dir(path) => Err(Error::is_a_directory(path)),
            None => Err(Error::not_found(path)),
        }
    }

    fn stat(&self, path: &str) -> Result<Metadata> {
        match self.files.get(path) {
            Some(content) => Ok(Metadata::file(content.len() as u64)),
            None if self.is_dir(path) => Ok(Metadata::directory()),
            None => Err(Error::not_found(path)),
        }
    }

    fn read_dir(&self, path: &str) -> Result<Vec<DirEntry>> {
        if self.files.contains_key(path) {
            return Err(Error::not_a_directory(path));
        }
        if !self.is_dir(path) {
            return Err(Error::not_found(path));
        }

        let mut listing: BTreeMap<&str, Metadata> = BTreeMap::new();
        for (name, content) in &self.files {
            let rest = match path::relative_to(path, name) {
                Some(rest) if rest != ROOT => rest,
                _ => continue,
            };
            match rest.split_once('/') {
                Some((dir, _)) => {
                    listing.entry(dir).or_insert_with(Metadata::directory);
                }
                None => {
                    listing.insert(rest, Metadata::file(content.len() as u64));
                }
            }
        }

        Ok(listing
            .into_iter()
            .map(|(name, metadata)| DirEntry::new(name, metadata))
            .collect())
    }
}
