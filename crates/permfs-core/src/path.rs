//! Path resolution against the directory tree.
//!
//! Paths are `/`-separated. A leading `/` starts at the root, anything
//! else starts at the caller's directory. Empty segments are ignored,
//! `.` stays in place and `..` moves to the parent (the root is its own
//! parent). Resolution never checks permissions.

use crate::error::FsError;
use crate::tree::{DirId, Tree};

pub fn is_absolute(path: &str) -> bool {
    path.starts_with('/')
}

/// Non-empty components of `path`.
pub fn split_components(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|c| !c.is_empty())
}

/// Resolve `path` to a directory, starting from `start` if relative.
pub fn resolve(tree: &Tree, path: &str, start: DirId) -> Result<DirId, FsError> {
    if path.is_empty() || path == "." {
        return if tree.contains(start) {
            Ok(start)
        } else {
            Err(FsError::not_found(path))
        };
    }
    if path == "/" {
        return Ok(tree.root());
    }

    let origin = if is_absolute(path) { tree.root() } else { start };
    walk(tree, origin, split_components(path)).ok_or_else(|| FsError::not_found(path))
}

/// Resolve all but the last component of `path`.
///
/// Returns the parent directory and the final component as a plain,
/// not yet looked up, name. When the path names a directory by itself
/// (empty, `/`, or ending in `.` or `..`) the whole path is resolved and
/// the name is `None`.
pub fn resolve_parent_and_name(
    tree: &Tree,
    path: &str,
    start: DirId,
) -> Result<(DirId, Option<String>), FsError> {
    let components: Vec<&str> = split_components(path).collect();

    match components.last() {
        None | Some(&".") | Some(&"..") => {
            let dir = resolve(tree, path, start)?;
            Ok((dir, None))
        }
        Some(leaf) => {
            let origin = if is_absolute(path) { tree.root() } else { start };
            let parent = walk(tree, origin, components[..components.len() - 1].iter().copied())
                .ok_or_else(|| FsError::not_found(path))?;
            Ok((parent, Some(leaf.to_string())))
        }
    }
}

fn walk<'a>(
    tree: &Tree,
    origin: DirId,
    components: impl IntoIterator<Item = &'a str>,
) -> Option<DirId> {
    let mut current = origin;
    tree.get(current)?;

    for component in components {
        current = match component {
            "." => current,
            ".." => tree.parent_of(current)?,
            name => tree.find_dir(current, name)?,
        };
    }
    Some(current)
}
