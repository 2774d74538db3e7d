use log::debug;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::io::Read;
use std::sync::Arc;

use super::backend::{AssetReader, Backend, DirEntry, Metadata};
use super::error::{Error, Result};
use super::path::{self, ROOT};

/// Represents different modes for binding operations
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BindMode {
    /// Replace existing layers at the mount point
    Replace,
    /// Add the layer with the highest precedence
    Before,
    /// Add the layer with the lowest precedence
    #[default]
    After,
}

/// A backend bound at a mount point.
///
/// Layers are immutable once created by a bind.
#[derive(Clone)]
pub struct Layer {
    backend: Arc<dyn Backend>,
    mount_path: String,
    label: String,
    order: u64,
}

impl Layer {
    /// The backend serving this layer.
    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    /// The normalized mount path.
    pub fn mount_path(&self) -> &str {
        &self.mount_path
    }

    /// Diagnostic label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Insertion rank across the whole namespace.
    pub fn order(&self) -> u64 {
        self.order
    }

    fn info(&self) -> LayerInfo {
        LayerInfo {
            mount_path: self.mount_path.clone(),
            label: self.label.clone(),
            order: self.order,
        }
    }
}

impl fmt::Debug for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Layer")
            .field("mount_path", &self.mount_path)
            .field("label", &self.label)
            .field("order", &self.order)
            .field("backend", &self.backend)
            .finish()
    }
}

/// Description of a bound layer, as reported by [`Namespace::list_layers`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerInfo {
    /// Mount path of the layer
    pub mount_path: String,
    /// Diagnostic label
    pub label: String,
    /// Insertion rank
    pub order: u64,
}

/// Layer sequence at one mount point, first entry wins.
type LayerSeq = Arc<Vec<Layer>>;

#[derive(Default)]
struct Bindings {
    mounts: BTreeMap<String, LayerSeq>,
    next_order: u64,
}

/// What a lookup resolved to, captured under the read lock.
struct Resolution {
    path: String,
    rel: String,
    layers: Option<LayerSeq>,
    /// Children of `path` that lead to deeper mount points.
    mount_children: Vec<String>,
    /// The subset of `mount_children` that are mount points themselves.
    bound_children: Vec<String>,
}

/// Ordered mapping from mount paths to layer sequences, and the resolver
/// walking them.
///
/// Cloning yields another handle onto the same bindings. Binds swap in a
/// new sequence under the write lock; lookups copy the sequence they need
/// under the read lock and do all backend I/O after releasing it.
#[derive(Clone, Default)]
pub struct Namespace {
    bindings: Arc<RwLock<Bindings>>,
}

impl fmt::Debug for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Namespace")
            .field("layers", &self.list_layers())
            .finish()
    }
}

impl Namespace {
    /// Creates an empty namespace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `backend` at `mount_path`.
    ///
    /// # Errors
    ///
    /// `InvalidPath` if the mount path cannot be normalized.
    pub fn bind(
        &self,
        mount_path: &str,
        backend: impl Backend + 'static,
        label: &str,
        mode: BindMode,
    ) -> Result<()> {
        self.bind_arc(mount_path, Arc::new(backend), label, mode)
    }

    /// Binds an already shared backend at `mount_path`.
    pub fn bind_arc(
        &self,
        mount_path: &str,
        backend: Arc<dyn Backend>,
        label: &str,
        mode: BindMode,
    ) -> Result<()> {
        let mount_path = path::normalize(mount_path)?;
        let mut bindings = self.bindings.write();
        Self::insert_layer(&mut bindings, mount_path, backend, label, mode);
        Ok(())
    }

    /// Binds `backend` at `mount_path` only if nothing is bound there yet.
    ///
    /// Returns whether the layer was installed.
    pub fn bind_if_empty(
        &self,
        mount_path: &str,
        backend: impl Backend + 'static,
        label: &str,
    ) -> Result<bool> {
        let mount_path = path::normalize(mount_path)?;
        let mut bindings = self.bindings.write();
        if bindings.mounts.contains_key(&mount_path) {
            debug!("{} already bound, skipping {}", mount_path, label);
            return Ok(false);
        }
        Self::insert_layer(
            &mut bindings,
            mount_path,
            Arc::new(backend),
            label,
            BindMode::After,
        );
        Ok(true)
    }

    fn insert_layer(
        bindings: &mut Bindings,
        mount_path: String,
        backend: Arc<dyn Backend>,
        label: &str,
        mode: BindMode,
    ) {
        let layer = Layer {
            backend,
            mount_path: mount_path.clone(),
            label: label.to_string(),
            order: bindings.next_order,
        };
        bindings.next_order += 1;

        debug!("Binding {} at {} with mode {:?}", label, mount_path, mode);

        let current = bindings.mounts.get(&mount_path);
        let layers = match (mode, current) {
            (BindMode::Replace, _) | (_, None) => vec![layer],
            (BindMode::Before, Some(seq)) => {
                let mut layers = Vec::with_capacity(seq.len() + 1);
                layers.push(layer);
                layers.extend(seq.iter().cloned());
                layers
            }
            (BindMode::After, Some(seq)) => {
                let mut layers = Vec::with_capacity(seq.len() + 1);
                layers.extend(seq.iter().cloned());
                layers.push(layer);
                layers
            }
        };
        bindings.mounts.insert(mount_path, Arc::new(layers));
    }

    /// Removes layers at `mount_path`: those carrying `label`, or all of
    /// them when no label is given.
    ///
    /// Returns the number of layers removed. A mount point left without
    /// layers is dropped entirely.
    pub fn unbind(&self, mount_path: &str, label: Option<&str>) -> Result<usize> {
        let mount_path = path::normalize(mount_path)?;
        let mut bindings = self.bindings.write();

        let Some(seq) = bindings.mounts.get(&mount_path) else {
            return Ok(0);
        };
        let kept: Vec<Layer> = match label {
            Some(label) => seq.iter().filter(|l| l.label != label).cloned().collect(),
            None => Vec::new(),
        };
        let removed = seq.len() - kept.len();

        if kept.is_empty() {
            bindings.mounts.remove(&mount_path);
        } else {
            bindings.mounts.insert(mount_path.clone(), Arc::new(kept));
        }
        debug!("Unbound {} layer(s) at {}", removed, mount_path);
        Ok(removed)
    }

    /// Lists all layers, by mount path and then precedence.
    pub fn list_layers(&self) -> Vec<LayerInfo> {
        let bindings = self.bindings.read();
        bindings
            .mounts
            .values()
            .flat_map(|seq| seq.iter().map(Layer::info))
            .collect()
    }

    /// Snapshot of the layer sequence bound exactly at `mount_path`.
    pub fn layers_at(&self, mount_path: &str) -> Result<Vec<Layer>> {
        let mount_path = path::normalize(mount_path)?;
        let bindings = self.bindings.read();
        Ok(bindings
            .mounts
            .get(&mount_path)
            .map(|seq| seq.as_ref().clone())
            .unwrap_or_default())
    }

    /// Finds the deepest mount point covering `name` and copies its layer
    /// sequence out of the lock.
    fn resolve(&self, name: &str) -> Result<Resolution> {
        let path = path::normalize(name)?;
        let bindings = self.bindings.read();

        let mut best: Option<(&String, &LayerSeq)> = None;
        let mut mount_children = Vec::new();
        let mut bound_children = Vec::new();
        for (mount, seq) in bindings.mounts.iter() {
            if path::is_within(mount, &path) {
                if best.map_or(true, |(b, _)| mount.len() > b.len()) {
                    best = Some((mount, seq));
                }
            } else if let Some(child) = path::child_toward(&path, mount) {
                if !mount_children.iter().any(|c| c == child) {
                    mount_children.push(child.to_string());
                }
                if path::join(&path, child) == *mount {
                    bound_children.push(child.to_string());
                }
            }
        }

        let (rel, layers) = match best {
            Some((mount, seq)) => {
                let rel = path::relative_to(mount, &path).unwrap_or(ROOT).to_string();
                (rel, Some(Arc::clone(seq)))
            }
            None => (path.clone(), None),
        };

        Ok(Resolution {
            path,
            rel,
            layers,
            mount_children,
            bound_children,
        })
    }

    /// Walks layers in precedence order until one has the path.
    ///
    /// `NotFound` falls through to the next layer; anything else is
    /// authoritative. Path-kind errors are re-pointed at the requested path
    /// and storage failures get the layer's label attached.
    fn first_match<'a, T>(
        res: &'a Resolution,
        op: impl Fn(&dyn Backend, &str) -> Result<T>,
    ) -> Result<Option<(T, &'a Layer)>> {
        let Some(layers) = &res.layers else {
            return Ok(None);
        };
        for layer in layers.iter() {
            match op(layer.backend.as_ref(), &res.rel) {
                Ok(found) => return Ok(Some((found, layer))),
                Err(e) if e.is_not_found() => {
                    debug!("{}: {} not in {}", res.path, res.rel, layer.label);
                }
                Err(e) => return Err(e.at_path(&res.path).with_label(&layer.label)),
            }
        }
        Ok(None)
    }

    fn open_resolved(res: &Resolution) -> Result<(AssetReader, &Layer)> {
        match Self::first_match(res, |b, rel| b.open(rel))? {
            Some(found) => Ok(found),
            None if !res.mount_children.is_empty() => Err(Error::is_a_directory(&res.path)),
            None => Err(Error::not_found(&res.path)),
        }
    }

    /// Opens a file for reading.
    pub fn open(&self, name: &str) -> Result<AssetReader> {
        let res = self.resolve(name)?;
        Self::open_resolved(&res).map(|(reader, _)| reader)
    }

    /// Reports metadata for a file or directory.
    pub fn stat(&self, name: &str) -> Result<Metadata> {
        let res = self.resolve(name)?;
        match Self::first_match(&res, |b, rel| b.stat(rel))? {
            Some((meta, _)) => Ok(meta),
            None if !res.mount_children.is_empty() => Ok(Metadata::directory()),
            None => Err(Error::not_found(res.path)),
        }
    }

    /// Lists a directory, merging every layer at its mount point.
    ///
    /// When several layers have an entry with the same name, the one from
    /// the highest-precedence layer is kept. A child that is itself a mount
    /// point is listed as that mount reports it. Other children leading to
    /// deeper mounts show up as directories unless a layer already provides
    /// that name.
    pub fn read_dir(&self, name: &str) -> Result<Vec<DirEntry>> {
        let res = self.resolve(name)?;

        let mut merged: BTreeMap<String, DirEntry> = BTreeMap::new();
        let mut found = false;
        let mut not_dir = false;

        if let Some(layers) = &res.layers {
            for layer in layers.iter() {
                match layer.backend.read_dir(&res.rel) {
                    Ok(entries) => {
                        found = true;
                        for entry in entries {
                            merged.entry(entry.name.clone()).or_insert(entry);
                        }
                    }
                    Err(Error::NotFound(_)) => {}
                    Err(Error::NotADirectory(_)) => not_dir = true,
                    Err(e) => return Err(e.at_path(&res.path).with_label(&layer.label)),
                }
            }
        }

        for child in &res.mount_children {
            found = true;
            if res.bound_children.contains(child) {
                // Lookups of this name go to the deeper mount, so must the listing.
                match self.stat(&path::join(&res.path, child)) {
                    Ok(meta) => {
                        merged.insert(child.clone(), DirEntry::new(child.clone(), meta));
                    }
                    Err(e) if e.is_not_found() => {
                        merged.remove(child);
                    }
                    Err(e) => return Err(e),
                }
            } else {
                merged
                    .entry(child.clone())
                    .or_insert_with(|| DirEntry::new(child.clone(), Metadata::directory()));
            }
        }

        if !found {
            return Err(if not_dir {
                Error::not_a_directory(res.path)
            } else {
                Error::not_found(res.path)
            });
        }
        Ok(merged.into_values().collect())
    }

    /// Returns whether the path resolves to anything.
    ///
    /// Errors other than `NotFound` are passed on.
    pub fn exists(&self, name: &str) -> Result<bool> {
        match self.stat(name) {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Reads a whole file.
    ///
    /// Read failures carry the label of the layer that served the file.
    pub fn read_all(&self, name: &str) -> Result<Vec<u8>> {
        let res = self.resolve(name)?;
        let (mut reader, layer) = Self::open_resolved(&res)?;
        let mut content = Vec::new();
        reader
            .read_to_end(&mut content)
            .map_err(|e| Error::Io(e).with_label(&layer.label))?;
        Ok(content)
    }

    /// Reads a whole file as UTF-8 text.
    pub fn read_to_string(&self, name: &str) -> Result<String> {
        let res = self.resolve(name)?;
        let (mut reader, layer) = Self::open_resolved(&res)?;
        let mut content = String::new();
        reader
            .read_to_string(&mut content)
            .map_err(|e| Error::Io(e).with_label(&layer.label))?;
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::backend::FileType;
    use crate::modules::dir::DirBackend;
    use crate::modules::memory::MemoryBackend;
    use std::fs;
    use std::io;
    use tempfile::TempDir;

    fn mem(files: &[(&str, &str)]) -> MemoryBackend {
        files
            .iter()
            .try_fold(MemoryBackend::new(), |b, (name, content)| {
                b.with_file(name, content)
            })
            .unwrap()
    }

    /// A backend whose every operation fails with a non-NotFound error.
    #[derive(Debug)]
    struct BrokenBackend;

    impl Backend for BrokenBackend {
        fn open(&self, _path: &str) -> Result<AssetReader> {
            Err(Error::Io(io::Error::new(io::ErrorKind::PermissionDenied, "denied")))
        }

        fn stat(&self, _path: &str) -> Result<Metadata> {
            Err(Error::Io(io::Error::new(io::ErrorKind::PermissionDenied, "denied")))
        }

        fn read_dir(&self, _path: &str) -> Result<Vec<DirEntry>> {
            Err(Error::Io(io::Error::new(io::ErrorKind::PermissionDenied, "denied")))
        }
    }

    #[test]
    fn test_namespace_creation() {
        let ns = Namespace::new();
        assert!(ns.list_layers().is_empty());
        assert!(ns.stat(".").unwrap_err().is_not_found());
    }

    #[test]
    fn test_precedence_before_wins() -> Result<()> {
        let ns = Namespace::new();
        ns.bind(".", mem(&[("index.html", "low")]), "b", BindMode::After)?;
        ns.bind(".", mem(&[("index.html", "high!")]), "a", BindMode::Before)?;

        assert_eq!(ns.read_to_string("index.html")?, "high!");
        assert_eq!(ns.stat("index.html")?.size, 5);
        Ok(())
    }

    #[test]
    fn test_after_falls_through() -> Result<()> {
        let ns = Namespace::new();
        ns.bind(".", mem(&[("a.txt", "first")]), "first", BindMode::After)?;
        ns.bind(".", mem(&[("b.txt", "second")]), "second", BindMode::After)?;

        assert_eq!(ns.read_to_string("a.txt")?, "first");
        assert_eq!(ns.read_to_string("b.txt")?, "second");
        assert!(matches!(ns.open("c.txt"), Err(Error::NotFound(ref p)) if p == "c.txt"));
        Ok(())
    }

    #[test]
    fn test_replace_semantics() -> Result<()> {
        let ns = Namespace::new();
        ns.bind(".", mem(&[("x.txt", "x")]), "x", BindMode::Replace)?;
        ns.bind(".", mem(&[("y.txt", "y")]), "y", BindMode::Replace)?;

        assert!(!ns.exists("x.txt")?);
        assert!(ns.exists("y.txt")?);
        let labels: Vec<_> = ns.list_layers().into_iter().map(|l| l.label).collect();
        assert_eq!(labels, vec!["y"]);
        Ok(())
    }

    #[test]
    fn test_read_dir_merge() -> Result<()> {
        let ns = Namespace::new();
        ns.bind(".", mem(&[("x", "a-x"), ("y", "a-y")]), "A", BindMode::After)?;
        ns.bind(".", mem(&[("y", "b-y-longer"), ("z", "b-z")]), "B", BindMode::After)?;

        let entries = ns.read_dir(".")?;
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["x", "y", "z"]);
        // "y" must carry A's metadata
        assert_eq!(entries[1].metadata.size, 3);
        Ok(())
    }

    #[test]
    fn test_read_dir_partial_layers() -> Result<()> {
        let ns = Namespace::new();
        ns.bind(".", mem(&[("docs/a.md", "a")]), "A", BindMode::After)?;
        ns.bind(".", mem(&[("other.txt", "o")]), "B", BindMode::After)?;

        let names: Vec<_> = ns.read_dir("docs")?.into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["a.md"]);
        assert!(ns.read_dir("nothing").unwrap_err().is_not_found());
        assert!(matches!(ns.read_dir("other.txt"), Err(Error::NotADirectory(_))));
        Ok(())
    }

    #[test]
    fn test_unbound_and_emptied_mounts_match() -> Result<()> {
        let never = Namespace::new();
        let emptied = Namespace::new();
        emptied.bind(".", mem(&[("f", "x")]), "tmp", BindMode::After)?;
        assert_eq!(emptied.unbind(".", None)?, 1);

        for ns in [&never, &emptied] {
            assert!(matches!(ns.open("f"), Err(Error::NotFound(_))));
            assert!(ns.stat("f").unwrap_err().is_not_found());
            assert!(ns.read_dir(".").unwrap_err().is_not_found());
            assert!(!ns.exists("f")?);
        }
        assert!(emptied.list_layers().is_empty());
        Ok(())
    }

    #[test]
    fn test_unbind_by_label() -> Result<()> {
        let ns = Namespace::new();
        ns.bind(".", mem(&[("f", "one")]), "one", BindMode::After)?;
        ns.bind(".", mem(&[("f", "two")]), "two", BindMode::Before)?;

        assert_eq!(ns.unbind(".", Some("two"))?, 1);
        assert_eq!(ns.read_to_string("f")?, "one");
        assert_eq!(ns.unbind(".", Some("missing"))?, 0);
        assert_eq!(ns.unbind("elsewhere", None)?, 0);
        Ok(())
    }

    #[test]
    fn test_bind_if_empty_idempotent() -> Result<()> {
        let ns = Namespace::new();
        assert!(ns.bind_if_empty(".", mem(&[("f", "default")]), "default")?);
        assert!(!ns.bind_if_empty(".", mem(&[("f", "other")]), "default")?);

        assert_eq!(ns.layers_at(".")?.len(), 1);
        assert_eq!(ns.read_to_string("f")?, "default");
        Ok(())
    }

    #[test]
    fn test_bind_if_empty_respects_existing() -> Result<()> {
        let ns = Namespace::new();
        ns.bind(".", mem(&[("f", "configured")]), "asset dir", BindMode::After)?;
        assert!(!ns.bind_if_empty(".", mem(&[("f", "fallback")]), "fallback")?);
        assert_eq!(ns.read_to_string("f")?, "configured");
        Ok(())
    }

    #[test]
    fn test_invalid_paths() {
        let ns = Namespace::new();
        assert!(matches!(
            ns.bind("../up", mem(&[]), "bad", BindMode::After),
            Err(Error::InvalidPath(_))
        ));
        assert!(matches!(ns.open("../etc/passwd"), Err(Error::InvalidPath(_))));
    }

    #[test]
    fn test_order_is_deterministic() -> Result<()> {
        let build = || -> Result<Vec<LayerInfo>> {
            let ns = Namespace::new();
            ns.bind(".", mem(&[]), "one", BindMode::After)?;
            ns.bind("static", mem(&[]), "two", BindMode::After)?;
            ns.bind(".", mem(&[]), "three", BindMode::Before)?;
            Ok(ns.list_layers())
        };
        let first = build()?;
        assert_eq!(first, build()?);

        let summary: Vec<_> = first
            .iter()
            .map(|l| (l.mount_path.as_str(), l.label.as_str(), l.order))
            .collect();
        assert_eq!(
            summary,
            vec![(".", "three", 2), (".", "one", 0), ("static", "two", 1)]
        );
        Ok(())
    }

    #[test]
    fn test_longest_mount_wins() -> Result<()> {
        let ns = Namespace::new();
        ns.bind(".", mem(&[("static/app.js", "root copy")]), "root", BindMode::After)?;
        ns.bind("static", mem(&[("app.js", "mounted")]), "static", BindMode::After)?;

        assert_eq!(ns.read_to_string("static/app.js")?, "mounted");
        assert_eq!(ns.read_to_string("/static/./app.js")?, "mounted");
        Ok(())
    }

    #[test]
    fn test_mount_points_are_listed() -> Result<()> {
        let ns = Namespace::new();
        ns.bind(".", mem(&[("index.html", "i")]), "root", BindMode::After)?;
        ns.bind("vendor/lib", mem(&[("x.js", "x")]), "lib", BindMode::After)?;

        let names: Vec<_> = ns.read_dir(".")?.into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["index.html", "vendor"]);

        assert!(ns.stat("vendor")?.is_dir());
        assert!(matches!(ns.open("vendor"), Err(Error::IsADirectory(_))));
        let names: Vec<_> = ns.read_dir("vendor")?.into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["lib"]);
        Ok(())
    }

    #[test]
    fn test_non_not_found_errors_are_authoritative() -> Result<()> {
        let ns = Namespace::new();
        ns.bind(".", mem(&[("f", "fine")]), "healthy", BindMode::After)?;
        ns.bind(".", BrokenBackend, "broken", BindMode::Before)?;

        for err in [
            ns.open("f").err(),
            ns.stat("f").err(),
            ns.read_dir(".").err(),
            ns.exists("f").err(),
        ] {
            match err {
                Some(Error::Backend { label, .. }) => assert_eq!(label, "broken"),
                other => panic!("unexpected: {:?}", other),
            }
        }
        Ok(())
    }

    #[test]
    fn test_is_a_directory_not_masked() -> Result<()> {
        let ns = Namespace::new();
        ns.bind(".", mem(&[("page", "lower file")]), "lower", BindMode::After)?;
        ns.bind(".", mem(&[("page/inner.html", "x")]), "upper", BindMode::Before)?;

        assert!(matches!(ns.open("page"), Err(Error::IsADirectory(_))));
        assert_eq!(ns.stat("page")?.kind, FileType::Directory);
        Ok(())
    }

    #[test]
    fn test_bound_mount_shadows_outer_entry() -> Result<()> {
        let ns = Namespace::new();
        let root = mem(&[("static", "x"), ("index.html", "i")]);
        ns.bind(".", root, "root", BindMode::After)?;
        ns.bind("static", mem(&[("app.js", "js")]), "static", BindMode::After)?;

        let entries = ns.read_dir(".")?;
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["index.html", "static"]);
        assert_eq!(entries[1].metadata, ns.stat("static")?);
        assert!(entries[1].is_dir());
        assert!(matches!(ns.open("static"), Err(Error::IsADirectory(_))));
        Ok(())
    }

    #[test]
    fn test_emptied_mount_drops_out_of_listing() -> Result<()> {
        let ns = Namespace::new();
        ns.bind(".", mem(&[("static", "x")]), "root", BindMode::After)?;
        let missing = DirBackend::new("/definitely/not/here/tadpole");
        ns.bind("static", missing, "gone", BindMode::After)?;

        assert!(ns.stat("static").unwrap_err().is_not_found());
        assert!(ns.read_dir(".")?.is_empty());
        Ok(())
    }

    #[test]
    fn test_errors_name_requested_path() -> Result<()> {
        let ns = Namespace::new();
        let files = mem(&[("app.js", "js"), ("css/site.css", "c")]);
        ns.bind("static", files, "static", BindMode::After)?;

        match ns.open("static") {
            Err(Error::IsADirectory(p)) => assert_eq!(p, "static"),
            other => panic!("unexpected: {:?}", other.err()),
        }
        match ns.open("static/css") {
            Err(Error::IsADirectory(p)) => assert_eq!(p, "static/css"),
            other => panic!("unexpected: {:?}", other.err()),
        }
        match ns.read_dir("static/app.js") {
            Err(Error::NotADirectory(p)) => assert_eq!(p, "static/app.js"),
            other => panic!("unexpected: {:?}", other),
        }
        Ok(())
    }

    /// Serves one file whose stream fails on the first read.
    #[derive(Debug)]
    struct FailingReadBackend;

    struct FailingReader;

    impl io::Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::UnexpectedEof, "truncated"))
        }
    }

    impl io::Seek for FailingReader {
        fn seek(&mut self, _pos: io::SeekFrom) -> io::Result<u64> {
            Ok(0)
        }
    }

    impl Backend for FailingReadBackend {
        fn open(&self, _path: &str) -> Result<AssetReader> {
            Ok(Box::new(FailingReader))
        }

        fn stat(&self, _path: &str) -> Result<Metadata> {
            Ok(Metadata::file(4))
        }

        fn read_dir(&self, path: &str) -> Result<Vec<DirEntry>> {
            Err(Error::not_found(path))
        }
    }

    #[test]
    fn test_read_errors_carry_label() -> Result<()> {
        let ns = Namespace::new();
        ns.bind(".", FailingReadBackend, "truncated", BindMode::After)?;

        for err in [ns.read_all("f").err(), ns.read_to_string("f").err()] {
            match err {
                Some(Error::Backend { label, source }) => {
                    assert_eq!(label, "truncated");
                    assert!(matches!(*source, Error::Io(_)));
                }
                other => panic!("unexpected: {:?}", other),
            }
        }
        Ok(())
    }

    #[test]
    fn test_directory_layers() -> Result<()> {
        let low = TempDir::new()?;
        let high = TempDir::new()?;
        fs::write(low.path().join("index.html"), "archive-ish")?;
        fs::write(low.path().join("only-low.txt"), "low")?;
        fs::write(high.path().join("index.html"), "override")?;

        let ns = Namespace::new();
        ns.bind(".", DirBackend::new(low.path()), "low", BindMode::After)?;
        ns.bind(".", DirBackend::new(high.path()), "high", BindMode::Before)?;

        assert_eq!(ns.read_all("index.html")?, b"override");
        assert_eq!(ns.read_to_string("only-low.txt")?, "low");
        let names: Vec<_> = ns.read_dir(".")?.into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["index.html", "only-low.txt"]);
        Ok(())
    }

    #[test]
    fn test_concurrent_bind_and_read() -> Result<()> {
        let ns = Namespace::new();
        ns.bind(".", mem(&[("a", "base")]), "base", BindMode::After)?;

        std::thread::scope(|scope| {
            let writer = ns.clone();
            scope.spawn(move || {
                for _ in 0..200 {
                    writer
                        .bind(".", mem(&[("b", "extra")]), "extra", BindMode::Before)
                        .unwrap();
                    writer
                        .bind(".", mem(&[("a", "base")]), "base", BindMode::Replace)
                        .unwrap();
                }
            });

            for _ in 0..4 {
                let reader = ns.clone();
                scope.spawn(move || {
                    for _ in 0..200 {
                        let names: Vec<_> = reader
                            .read_dir(".")
                            .unwrap()
                            .into_iter()
                            .map(|e| e.name)
                            .collect();
                        assert!(
                            names == ["a"] || names == ["a", "b"],
                            "observed {:?}",
                            names
                        );
                        assert_eq!(reader.read_to_string("a").unwrap(), "base");
                    }
                });
            }
        });
        Ok(())
    }
}
