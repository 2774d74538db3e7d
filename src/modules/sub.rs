//! Views into a sub-tree of another backend.

use super::backend::{AssetReader, Backend, DirEntry, Metadata};
use super::error::Result;
use super::path;

/// Exposes the tree below `prefix` of an inner backend as its root.
#[derive(Debug, Clone)]
pub struct SubBackend<B> {
    inner: B,
    prefix: String,
}

impl<B: Backend> SubBackend<B> {
    /// Create a view of `inner` rooted at `prefix`.
    ///
    /// # Errors
    ///
    /// `InvalidPath` if `prefix` escapes the inner root.
    pub fn new(inner: B, prefix: &str) -> Result<Self> {
        Ok(Self {
            inner,
            prefix: path::normalize(prefix)?,
        })
    }

    /// Get a reference to the inner backend.
    pub fn inner(&self) -> &B {
        &self.inner
    }

    fn full(&self, rel: &str) -> String {
        path::join(&self.prefix, rel)
    }

}

impl<B: Backend> Backend for SubBackend<B> {
    fn open(&self, path: &str) -> Result<AssetReader> {
        self.inner
            .open(&self.full(path))
            .map_err(|e| e.at_path(path))
    }

    fn stat(&self, path: &str) -> Result<Metadata> {
        self.inner
            .stat(&self.full(path))
            .map_err(|e| e.at_path(path))
    }

    fn read_dir(&self, path: &str) -> Result<Vec<DirEntry>> {
        self.inner
            .read_dir(&self.full(path))
            .map_err(|e| e.at_path(path))
    }
}
