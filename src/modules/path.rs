//! Logical path handling.
//!
//! Logical paths are slash-separated and relative to a single root, which is
//! spelled `"."`. Normalized paths never carry empty or `.` segments, never
//! start or end with a separator and never contain `..`.

use super::error::{Error, Result};

/// The logical root.
pub const ROOT: &str = ".";

/// Normalizes a logical path.
///
/// Leading and trailing separators are dropped, `.` and empty segments are
/// removed and `..` is resolved lexically. A `..` that would climb above the
/// root is rejected.
///
/// # Errors
///
/// Returns `InvalidPath` for paths escaping the root or containing NUL bytes.
pub fn normalize(path: &str) -> Result<String> {
    if path.contains('\0') {
        return Err(Error::invalid_path(path));
    }

    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if parts.pop().is_none() {
                    return Err(Error::invalid_path(path));
                }
            }
            other => parts.push(other),
        }
    }

    if parts.is_empty() {
        Ok(ROOT.to_string())
    } else {
        Ok(parts.join("/"))
    }
}

/// Returns true if `path` equals `mount` or lies below it.
///
/// Both arguments must be normalized.
pub fn is_within(mount: &str, path: &str) -> bool {
    if mount == ROOT {
        return true;
    }
    match path.strip_prefix(mount) {
        Some("") => true,
        Some(rest) => rest.starts_with('/'),
        None => false,
    }
}

/// Translates `path` into a path relative to `mount`.
///
/// Returns `None` when `path` is not within `mount`.
pub fn relative_to<'a>(mount: &str, path: &'a str) -> Option<&'a str> {
    if mount == ROOT {
        return Some(path);
    }
    match path.strip_prefix(mount)? {
        "" => Some(ROOT),
        rest => rest.strip_prefix('/'),
    }
}

/// Joins two normalized paths.
pub fn join(base: &str, rel: &str) -> String {
    match (base, rel) {
        (ROOT, _) => rel.to_string(),
        (_, ROOT) => base.to_string(),
        _ => format!("{}/{}", base, rel),
    }
}

/// For a mount point strictly below `dir`, the name of the child of `dir`
/// leading to it.
pub fn child_toward<'a>(dir: &str, mount: &'a str) -> Option<&'a str> {
    if dir == mount {
        return None;
    }
    let rest = relative_to(dir, mount)?;
    if rest == ROOT {
        return None;
    }
    rest.split('/').next()
}
