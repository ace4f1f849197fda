use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::identity::User;
use crate::permissions::PermissionTriple;

/// Handle to a directory in the [`Tree`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DirId(u64);

impl DirId {
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for DirId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dir#{}", self.0)
    }
}

/// Reserved id of the root directory.
pub const ROOT_DIR: DirId = DirId(1);

const FIRST_DYNAMIC_ID: u64 = 2;

#[derive(Debug, Clone)]
pub struct Directory {
    pub name: String,
    pub owner: Arc<User>,
    pub permissions: PermissionTriple,
    /// `None` only for the root.
    pub parent: Option<DirId>,
    pub dirs: BTreeMap<String, DirId>,
    pub files: BTreeMap<String, File>,
}

impl Directory {
    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty() && self.files.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct File {
    pub name: String,
    pub owner: Arc<User>,
    pub permissions: PermissionTriple,
    content: Vec<u8>,
}

impl File {
    pub fn new(name: impl Into<String>, owner: Arc<User>, permissions: PermissionTriple) -> Self {
        Self {
            name: name.into(),
            owner,
            permissions,
            content: Vec::new(),
        }
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// Replace the whole content.
    pub fn write(&mut self, content: impl Into<Vec<u8>>) {
        self.content = content.into();
    }

    pub fn size(&self) -> u64 {
        self.content.len() as u64
    }
}

/// Arena of directories. Files live inside their parent directory.
///
/// Ids are allocated monotonically and never reused, so a handle to a
/// removed directory stays dangling instead of aliasing a new one.
#[derive(Debug, Clone)]
pub struct Tree {
    dirs: HashMap<DirId, Directory>,
    next_id: u64,
}

impl Tree {
    /// A tree holding only the root directory.
    pub fn new(owner: Arc<User>, permissions: PermissionTriple) -> Self {
        let mut dirs = HashMap::new();
        dirs.insert(
            ROOT_DIR,
            Directory {
                name: "/".into(),
                owner,
                permissions,
                parent: None,
                dirs: BTreeMap::new(),
                files: BTreeMap::new(),
            },
        );

        Self {
            dirs,
            next_id: FIRST_DYNAMIC_ID,
        }
    }

    pub fn root(&self) -> DirId {
        ROOT_DIR
    }

    pub fn get(&self, id: DirId) -> Option<&Directory> {
        self.dirs.get(&id)
    }

    pub fn get_mut(&mut self, id: DirId) -> Option<&mut Directory> {
        self.dirs.get_mut(&id)
    }

    pub fn contains(&self, id: DirId) -> bool {
        self.dirs.contains_key(&id)
    }

    /// Number of live directories, root included.
    pub fn dir_count(&self) -> usize {
        self.dirs.len()
    }

    /// Child directory `name` of `parent`.
    pub fn find_dir(&self, parent: DirId, name: &str) -> Option<DirId> {
        self.get(parent)?.dirs.get(name).copied()
    }

    pub fn find_file(&self, parent: DirId, name: &str) -> Option<&File> {
        self.get(parent)?.files.get(name)
    }

    pub fn find_file_mut(&mut self, parent: DirId, name: &str) -> Option<&mut File> {
        self.get_mut(parent)?.files.get_mut(name)
    }

    /// The parent of `id`; the root is its own parent.
    pub fn parent_of(&self, id: DirId) -> Option<DirId> {
        let dir = self.get(id)?;
        Some(dir.parent.unwrap_or(id))
    }

    /// Create an empty subdirectory. Returns `None` if `parent` is gone
    /// or already has a subdirectory called `name`.
    pub fn insert_dir(
        &mut self,
        parent: DirId,
        name: &str,
        owner: Arc<User>,
        permissions: PermissionTriple,
    ) -> Option<DirId> {
        if self.get(parent)?.dirs.contains_key(name) {
            return None;
        }

        let id = DirId(self.next_id);
        self.next_id += 1;

        self.dirs.insert(
            id,
            Directory {
                name: name.to_string(),
                owner,
                permissions,
                parent: Some(parent),
                dirs: BTreeMap::new(),
                files: BTreeMap::new(),
            },
        );
        if let Some(p) = self.dirs.get_mut(&parent) {
            p.dirs.insert(name.to_string(), id);
        }
        Some(id)
    }

    /// Insert a file. Returns `false` if `parent` is gone or a file
    /// called `file.name` already exists there.
    pub fn insert_file(&mut self, parent: DirId, file: File) -> bool {
        let Some(dir) = self.get_mut(parent) else {
            return false;
        };
        if dir.files.contains_key(&file.name) {
            return false;
        }
        dir.files.insert(file.name.clone(), file);
        true
    }

    pub fn remove_file(&mut self, parent: DirId, name: &str) -> Option<File> {
        self.get_mut(parent)?.files.remove(name)
    }

    /// Remove an empty, non-root directory. Returns the removed entry,
    /// or `None` if it does not exist, is the root, or has children.
    pub fn remove_dir(&mut self, id: DirId) -> Option<Directory> {
        if id == ROOT_DIR || !self.get(id)?.is_empty() {
            return None;
        }

        let dir = self.dirs.remove(&id)?;
        if let Some(parent) = dir.parent.and_then(|p| self.dirs.get_mut(&p)) {
            parent.dirs.remove(&dir.name);
        }
        Some(dir)
    }

    /// Absolute path of `id`, by walking parent links up to the root.
    pub fn path_of(&self, id: DirId) -> Option<String> {
        let mut names = Vec::new();
        let mut current = self.get(id)?;
        while let Some(parent) = current.parent {
            names.push(current.name.as_str());
            current = self.get(parent)?;
        }

        if names.is_empty() {
            return Some("/".into());
        }
        let mut path = String::new();
        for name in names.iter().rev() {
            path.push('/');
            path.push_str(name);
        }
        Some(path)
    }
}
