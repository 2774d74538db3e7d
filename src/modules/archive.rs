//! Zip archive backend.
//!
//! The central directory is read once at construction and turned into an
//! index of files and directories, including directories that only exist
//! implicitly as prefixes of member names. The archive handle stays open
//! for the backend's lifetime; each `open` decompresses one member into
//! memory so the returned stream is seekable and independent of the
//! archive lock.

use log::{debug, warn};
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs::File;
use std::io::{Cursor, Read, Seek};
use std::path::Path;
use zip::ZipArchive;

use super::backend::{AssetReader, Backend, DirEntry, FileType, Metadata};
use super::error::{Error, Result};
use super::path::{self, ROOT};

/// Upper bound on the buffer reserved up front for one member. The declared
/// size comes from the archive header and is not trusted beyond this.
const MAX_PREALLOC: u64 = 1 << 20;

fn prealloc_hint(declared: u64) -> usize {
    declared.min(MAX_PREALLOC) as usize
}

#[derive(Debug, Clone)]
struct Node {
    kind: FileType,
    size: u64,
    /// Position in the archive, for files.
    index: Option<usize>,
}

/// Serves the members of a zip archive.
pub struct ArchiveBackend<R> {
    archive: Mutex<ZipArchive<R>>,
    nodes: BTreeMap<String, Node>,
    children: BTreeMap<String, BTreeSet<String>>,
}

impl<R> fmt::Debug for ArchiveBackend<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArchiveBackend")
            .field("entries", &self.nodes.len())
            .finish()
    }
}

impl ArchiveBackend<File> {
    /// Opens the archive stored in (or appended to) the file at `path`.
    ///
    /// # Errors
    ///
    /// `NotFound` if the file does not exist, `Archive` if it carries no
    /// readable zip directory.
    pub fn open_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| Error::from_io(e, &path.display().to_string()))?;
        Self::new(file)
    }
}

impl<R: Read + Seek> ArchiveBackend<R> {
    /// Reads the archive directory from `reader` and builds the index.
    pub fn new(reader: R) -> Result<Self> {
        let mut archive = ZipArchive::new(reader)?;

        let mut nodes = BTreeMap::new();
        let mut children: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        nodes.insert(
            ROOT.to_string(),
            Node {
                kind: FileType::Directory,
                size: 0,
                index: None,
            },
        );

        for i in 0..archive.len() {
            let member = archive.by_index_raw(i)?;
            let raw_name = member.name().to_string();
            let name = match path::normalize(&raw_name) {
                Ok(name) if name != ROOT => name,
                _ => {
                    warn!("skipping archive member with unusable name {:?}", raw_name);
                    continue;
                }
            };

            let node = if member.is_dir() {
                Node {
                    kind: FileType::Directory,
                    size: 0,
                    index: None,
                }
            } else {
                Node {
                    kind: FileType::File,
                    size: member.size(),
                    index: Some(i),
                }
            };
            drop(member);

            Self::insert(&mut nodes, &mut children, name, node);
        }

        debug!("indexed archive with {} entries", nodes.len());

        Ok(Self {
            archive: Mutex::new(archive),
            nodes,
            children,
        })
    }

    fn insert(
        nodes: &mut BTreeMap<String, Node>,
        children: &mut BTreeMap<String, BTreeSet<String>>,
        name: String,
        node: Node,
    ) {
        // Register every ancestor as a directory.
        let mut child = name.clone();
        loop {
            let (parent, base) = match child.rsplit_once('/') {
                Some((parent, base)) => (parent.to_string(), base.to_string()),
                None => (ROOT.to_string(), child.clone()),
            };
            children.entry(parent.clone()).or_default().insert(base);
            if parent == ROOT || nodes.contains_key(&parent) {
                break;
            }
            nodes.insert(
                parent.clone(),
                Node {
                    kind: FileType::Directory,
                    size: 0,
                    index: None,
                },
            );
            child = parent;
        }

        if let Some(existing) = nodes.get(&name) {
            if existing.kind != node.kind {
                warn!("archive member {:?} listed twice with different kinds", name);
            }
            if existing.kind.is_dir() {
                return;
            }
        }
        nodes.insert(name, node);
    }

    fn lookup(&self, path: &str) -> Result<&Node> {
        self.nodes.get(path).ok_or_else(|| Error::not_found(path))
    }

    fn metadata_for(node: &Node) -> Metadata {
        match node.kind {
            FileType::Directory => Metadata::directory(),
            FileType::File => Metadata::file(node.size),
        }
    }
}

impl<R: Read + Seek + Send> Backend for ArchiveBackend<R> {
    fn open(&self, path: &str) -> Result<AssetReader> {
        let node = self.lookup(path)?;
        let index = match node.index {
            Some(index) => index,
            None => return Err(Error::is_a_directory(path)),
        };

        let mut content = Vec::with_capacity(prealloc_hint(node.size));
        {
            let mut archive = self.archive.lock();
            let mut member = archive.by_index(index)?;
            member.read_to_end(&mut content)?;
        }
        Ok(Box::new(Cursor::new(content)))
    }

    fn stat(&self, path: &str) -> Result<Metadata> {
        self.lookup(path).map(Self::metadata_for)
    }

    fn read_dir(&self, path: &str) -> Result<Vec<DirEntry>> {
        let node = self.lookup(path)?;
        if !node.kind.is_dir() {
            return Err(Error::not_a_directory(path));
        }

        let names = match self.children.get(path) {
            Some(names) => names,
            None => return Ok(Vec::new()),
        };
        let mut entries = Vec::with_capacity(names.len());
        for name in names {
            let full = path::join(path, name);
            if let Some(child) = self.nodes.get(&full) {
                entries.push(DirEntry::new(name.clone(), Self::metadata_for(child)));
            }
        }
        Ok(entries)
    }
}
