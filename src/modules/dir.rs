//! Directory backend: serves files from a real directory tree.

use log::debug;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use super::backend::{AssetReader, Backend, DirEntry, FileType, Metadata};
use super::error::{Error, Result};
use super::path::ROOT;

/// Serves the tree below `root` using ordinary file semantics.
#[derive(Debug, Clone)]
pub struct DirBackend {
    root: PathBuf,
}

impl DirBackend {
    /// Creates a backend rooted at `root`.
    ///
    /// The directory is not required to exist yet; lookups simply fail
    /// with `NotFound` until it does.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The directory this backend serves.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn host_path(&self, path: &str) -> PathBuf {
        if path == ROOT {
            self.root.clone()
        } else {
            self.root.join(path)
        }
    }

    fn metadata_for(meta: &fs::Metadata) -> Metadata {
        let kind = if meta.is_dir() {
            FileType::Directory
        } else {
            FileType::File
        };
        Metadata {
            kind,
            size: if meta.is_dir() { 0 } else { meta.len() },
            modified: meta.modified().ok().filter(|t| *t != SystemTime::UNIX_EPOCH),
        }
    }
}

impl Backend for DirBackend {
    fn open(&self, path: &str) -> Result<AssetReader> {
        let host = self.host_path(path);
        let meta = fs::metadata(&host).map_err(|e| Error::from_io(e, path))?;
        if meta.is_dir() {
            return Err(Error::is_a_directory(path));
        }
        let file = fs::File::open(&host).map_err(|e| Error::from_io(e, path))?;
        Ok(Box::new(file))
    }

    fn stat(&self, path: &str) -> Result<Metadata> {
        let meta = fs::metadata(self.host_path(path)).map_err(|e| Error::from_io(e, path))?;
        Ok(Self::metadata_for(&meta))
    }

    fn read_dir(&self, path: &str) -> Result<Vec<DirEntry>> {
        let host = self.host_path(path);
        let meta = fs::metadata(&host).map_err(|e| Error::from_io(e, path))?;
        if !meta.is_dir() {
            return Err(Error::not_a_directory(path));
        }

        let mut entries = Vec::new();
        for entry in fs::read_dir(&host)? {
            let entry = entry?;
            let name = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(raw) => {
                    debug!("skipping non-UTF-8 name {:?} in {:?}", raw, host);
                    continue;
                }
            };
            // Follow symlinks so a linked directory lists as a directory.
            let meta = match fs::metadata(entry.path()) {
                Ok(meta) => meta,
                Err(e) => {
                    debug!("skipping dangling entry {:?}: {}", entry.path(), e);
                    continue;
                }
            };
            entries.push(DirEntry::new(name, Self::metadata_for(&meta)));
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::TempDir;

    fn setup_test_dir() -> Result<TempDir> {
        let dir = tempfile::tempdir()?;
        fs::write(dir.path().join("index.html"), "<h1>hi</h1>")?;
        fs::create_dir_all(dir.path().join("css"))?;
        fs::write(dir.path().join("css/site.css"), "body{}")?;
        Ok(dir)
    }

    #[test]
    fn test_open_and_read() -> Result<()> {
        let dir = setup_test_dir()?;
        let backend = DirBackend::new(dir.path());

        let mut content = String::new();
        backend.open("css/site.css")?.read_to_string(&mut content)?;
        assert_eq!(content, "body{}");
        Ok(())
    }

    #[test]
    fn test_open_errors() -> Result<()> {
        let dir = setup_test_dir()?;
        let backend = DirBackend::new(dir.path());

        assert!(matches!(backend.open("missing.html"), Err(Error::NotFound(_))));
        assert!(matches!(backend.open("css"), Err(Error::IsADirectory(_))));
        assert!(matches!(backend.open("."), Err(Error::IsADirectory(_))));
        Ok(())
    }

    #[test]
    fn test_stat() -> Result<()> {
        let dir = setup_test_dir()?;
        let backend = DirBackend::new(dir.path());

        let meta = backend.stat("index.html")?;
        assert_eq!(meta.kind, FileType::File);
        assert_eq!(meta.size, 11);
        assert!(meta.modified.is_some());

        assert!(backend.stat("css")?.is_dir());
        assert!(backend.stat(".")?.is_dir());
        assert!(backend.stat("nope").unwrap_err().is_not_found());
        // a file used as a directory component
        assert!(backend.stat("index.html/x").unwrap_err().is_not_found());
        Ok(())
    }

    #[test]
    fn test_read_dir_sorted() -> Result<()> {
        let dir = setup_test_dir()?;
        fs::write(dir.path().join("about.html"), "about")?;
        let backend = DirBackend::new(dir.path());

        let names: Vec<_> = backend
            .read_dir(".")?
            .into_iter()
            .map(|e| (e.name.clone(), e.is_dir()))
            .collect();
        assert_eq!(
            names,
            vec![
                ("about.html".to_string(), false),
                ("css".to_string(), true),
                ("index.html".to_string(), false),
            ]
        );

        assert!(matches!(backend.read_dir("index.html"), Err(Error::NotADirectory(_))));
        assert!(matches!(backend.read_dir("js"), Err(Error::NotFound(_))));
        Ok(())
    }

    #[test]
    fn test_missing_root() {
        let backend = DirBackend::new("/definitely/not/here/tadpole");
        assert!(backend.stat(".").unwrap_err().is_not_found());
    }
}
