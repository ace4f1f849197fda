//! Sessions: a current user and working directory over a shared tree.
//!
//! Every command resolves its path, asks [`can_access`] about the
//! resolved node, and only then touches the tree. Reads hold the tree's
//! read lock and mutations hold its write lock for the whole sequence,
//! so sessions on other threads never observe a half-applied command.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::FsError;
use crate::filesystem::{Filesystem, SharedFilesystem};
use crate::identity::User;
use crate::path::{resolve, resolve_parent_and_name};
use crate::permissions::{can_access, Access, PermissionTriple};
use crate::tree::{DirId, File, ROOT_DIR};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Directory,
    File,
}

/// One row of an `ls` listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryInfo {
    pub name: String,
    pub kind: EntryKind,
    pub owner: String,
    pub permissions: PermissionTriple,
    /// File size in bytes; `None` for directories.
    pub size: Option<u64>,
}

/// Immediate children of a directory, each list sorted by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    pub directories: Vec<EntryInfo>,
    pub files: Vec<EntryInfo>,
}

impl Listing {
    pub fn len(&self) -> usize {
        self.directories.len() + self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directories.is_empty() && self.files.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.directories
            .iter()
            .chain(self.files.iter())
            .map(|e| e.name.as_str())
    }
}

pub struct Session {
    fs: SharedFilesystem,
    user: Arc<User>,
    cwd: DirId,
}

impl Session {
    /// Start as the superuser at `/`.
    pub fn new(fs: SharedFilesystem) -> Self {
        let user = fs.read().users.superuser();
        Self {
            fs,
            user,
            cwd: ROOT_DIR,
        }
    }

    /// Start as `username` at `/`.
    pub fn login(fs: SharedFilesystem, username: &str) -> Result<Self, FsError> {
        let user = fs.read().users.lookup(username)?;
        info!("login: user={}", user.name);
        Ok(Self {
            fs,
            user,
            cwd: ROOT_DIR,
        })
    }

    pub fn filesystem(&self) -> &SharedFilesystem {
        &self.fs
    }

    pub fn current_user(&self) -> &User {
        &self.user
    }

    pub fn current_dir(&self) -> DirId {
        self.cwd
    }

    pub fn whoami(&self) -> String {
        self.user.name.clone()
    }

    /// Switch user without authentication. The working directory is kept
    /// even if the new user cannot access it.
    pub fn su(&mut self, username: &str) -> Result<(), FsError> {
        let user = self.fs.read().users.lookup(username)?;
        info!("su: {} -> {}", self.user.name, user.name);
        self.user = user;
        Ok(())
    }

    pub fn pwd(&self) -> Result<String, FsError> {
        let fs = self.fs.read();
        fs.tree
            .path_of(self.cwd)
            .ok_or_else(|| FsError::not_found("."))
    }

    pub fn list_users(&self) -> Vec<String> {
        self.fs.read().users.all_names().into_iter().collect()
    }

    pub fn ls(&self, path: &str) -> Result<Listing, FsError> {
        debug!("ls: user={} path={path:?}", self.user.name);
        let fs = self.fs.read();
        let id = resolve(&fs.tree, path, self.cwd)?;
        let dir = fs.tree.get(id).ok_or_else(|| FsError::not_found(path))?;
        self.check(&dir.owner, dir.permissions, Access::Read, path)?;

        let directories = dir
            .dirs
            .values()
            .filter_map(|child| fs.tree.get(*child))
            .map(|d| EntryInfo {
                name: d.name.clone(),
                kind: EntryKind::Directory,
                owner: d.owner.name.clone(),
                permissions: d.permissions,
                size: None,
            })
            .collect();
        let files = dir
            .files
            .values()
            .map(|f| EntryInfo {
                name: f.name.clone(),
                kind: EntryKind::File,
                owner: f.owner.name.clone(),
                permissions: f.permissions,
                size: Some(f.size()),
            })
            .collect();

        Ok(Listing { directories, files })
    }

    pub fn mkdir(&self, path: &str, permissions: PermissionTriple) -> Result<(), FsError> {
        debug!("mkdir: user={} path={path:?} perms={permissions}", self.user.name);
        let mut fs = self.fs.write();
        let (parent, name) = self.parent_for_create(&fs, path)?;

        if fs.tree.find_dir(parent, &name).is_some() {
            return Err(FsError::already_exists(path));
        }
        self.check_dir(&fs, parent, Access::Write, path)?;

        fs.tree
            .insert_dir(parent, &name, self.user.clone(), permissions)
            .ok_or_else(|| FsError::already_exists(path))?;
        Ok(())
    }

    pub fn cd(&mut self, path: &str) -> Result<(), FsError> {
        debug!("cd: user={} path={path:?}", self.user.name);
        let target = {
            let fs = self.fs.read();
            let id = resolve(&fs.tree, path, self.cwd)?;
            self.check_dir(&fs, id, Access::Execute, path)?;
            id
        };
        self.cwd = target;
        Ok(())
    }

    pub fn create_file(
        &self,
        path: &str,
        content: &[u8],
        permissions: PermissionTriple,
    ) -> Result<(), FsError> {
        debug!(
            "create_file: user={} path={path:?} len={} perms={permissions}",
            self.user.name,
            content.len()
        );
        let mut fs = self.fs.write();
        let (parent, name) = self.parent_for_create(&fs, path)?;

        if fs.tree.find_file(parent, &name).is_some() {
            return Err(FsError::already_exists(path));
        }
        self.check_dir(&fs, parent, Access::Write, path)?;

        let mut file = File::new(name, self.user.clone(), permissions);
        if !content.is_empty() {
            file.write(content);
        }
        if !fs.tree.insert_file(parent, file) {
            return Err(FsError::already_exists(path));
        }
        Ok(())
    }

    pub fn read(&self, path: &str) -> Result<Vec<u8>, FsError> {
        debug!("read: user={} path={path:?}", self.user.name);
        let fs = self.fs.read();
        let (parent, name) = self.parent_for_lookup(&fs, path)?;
        let file = fs
            .tree
            .find_file(parent, &name)
            .ok_or_else(|| FsError::not_found(path))?;
        self.check(&file.owner, file.permissions, Access::Read, path)?;
        Ok(file.content().to_vec())
    }

    pub fn write(&self, path: &str, content: &[u8]) -> Result<(), FsError> {
        debug!("write: user={} path={path:?} len={}", self.user.name, content.len());
        let mut fs = self.fs.write();
        let (parent, name) = self.parent_for_lookup(&fs, path)?;
        {
            let file = fs
                .tree
                .find_file(parent, &name)
                .ok_or_else(|| FsError::not_found(path))?;
            self.check(&file.owner, file.permissions, Access::Write, path)?;
        }

        let file = fs
            .tree
            .find_file_mut(parent, &name)
            .ok_or_else(|| FsError::not_found(path))?;
        file.write(content);
        Ok(())
    }

    /// Remove a file, or an empty directory. A file wins over a
    /// directory of the same name.
    pub fn rm(&self, path: &str) -> Result<(), FsError> {
        debug!("rm: user={} path={path:?}", self.user.name);
        let mut fs = self.fs.write();
        let (parent, name) = resolve_parent_and_name(&fs.tree, path, self.cwd)?;
        let name = name.ok_or_else(|| FsError::invalid_path(path))?;

        if fs.tree.find_file(parent, &name).is_some() {
            self.check_dir(&fs, parent, Access::Write, path)?;
            fs.tree.remove_file(parent, &name);
            return Ok(());
        }

        let dir = fs
            .tree
            .find_dir(parent, &name)
            .ok_or_else(|| FsError::not_found(path))?;
        if !fs.tree.get(dir).is_some_and(|d| d.is_empty()) {
            return Err(FsError::not_empty(path));
        }
        self.check_dir(&fs, parent, Access::Write, path)?;
        fs.tree
            .remove_dir(dir)
            .ok_or_else(|| FsError::not_empty(path))?;
        Ok(())
    }

    /// Change the permission triple. Only the owner or the superuser may.
    pub fn chmod(&self, path: &str, permissions: PermissionTriple) -> Result<(), FsError> {
        debug!("chmod: user={} path={path:?} perms={permissions}", self.user.name);
        let mut fs = self.fs.write();
        let target = self.target(&fs, path)?;

        let owner = match &target {
            Target::File(parent, name) => fs.tree.find_file(*parent, name).map(|f| &f.owner),
            Target::Dir(id) => fs.tree.get(*id).map(|d| &d.owner),
        }
        .ok_or_else(|| FsError::not_found(path))?;
        if !self.user.is_superuser() && owner.name != self.user.name {
            debug!("chmod denied: user={} owner={}", self.user.name, owner.name);
            return Err(FsError::permission_denied(path, Access::Write));
        }

        match target {
            Target::File(parent, name) => {
                if let Some(file) = fs.tree.find_file_mut(parent, &name) {
                    file.permissions = permissions;
                }
            }
            Target::Dir(id) => {
                if let Some(dir) = fs.tree.get_mut(id) {
                    dir.permissions = permissions;
                }
            }
        }
        Ok(())
    }

    /// Transfer ownership. Superuser only.
    pub fn chown(&self, path: &str, new_owner: &str) -> Result<(), FsError> {
        debug!("chown: user={} path={path:?} owner={new_owner:?}", self.user.name);
        let mut fs = self.fs.write();
        let (parent, name) = resolve_parent_and_name(&fs.tree, path, self.cwd)?;
        let owner = fs.users.lookup(new_owner)?;
        let target = self.pick_target(&fs, parent, name, path)?;

        if !self.user.is_superuser() {
            debug!("chown denied: user={}", self.user.name);
            return Err(FsError::permission_denied(path, Access::Write));
        }

        info!("chown: path={path:?} owner={}", owner.name);
        match target {
            Target::File(parent, name) => {
                if let Some(file) = fs.tree.find_file_mut(parent, &name) {
                    file.owner = owner;
                }
            }
            Target::Dir(id) => {
                if let Some(dir) = fs.tree.get_mut(id) {
                    dir.owner = owner;
                }
            }
        }
        Ok(())
    }

    fn check(
        &self,
        owner: &User,
        permissions: PermissionTriple,
        access: Access,
        path: &str,
    ) -> Result<(), FsError> {
        if can_access(&self.user, owner, &owner.group, permissions, access) {
            Ok(())
        } else {
            debug!(
                "denied: user={} access={access} path={path:?} owner={} perms={permissions}",
                self.user.name, owner.name
            );
            Err(FsError::permission_denied(path, access))
        }
    }

    fn check_dir(
        &self,
        fs: &Filesystem,
        id: DirId,
        access: Access,
        path: &str,
    ) -> Result<(), FsError> {
        let dir = fs.tree.get(id).ok_or_else(|| FsError::not_found(path))?;
        self.check(&dir.owner, dir.permissions, access, path)
    }

    /// Parent and leaf for `mkdir` / `create_file`.
    fn parent_for_create(&self, fs: &Filesystem, path: &str) -> Result<(DirId, String), FsError> {
        match resolve_parent_and_name(&fs.tree, path, self.cwd) {
            Ok((parent, Some(name))) => Ok((parent, name)),
            Ok((_, None)) | Err(_) => Err(FsError::invalid_path(path)),
        }
    }

    /// Parent and leaf for `read` / `write`.
    fn parent_for_lookup(&self, fs: &Filesystem, path: &str) -> Result<(DirId, String), FsError> {
        match resolve_parent_and_name(&fs.tree, path, self.cwd)? {
            (parent, Some(name)) => Ok((parent, name)),
            (_, None) => Err(FsError::not_found(path)),
        }
    }

    /// Node targeted by `chmod`: the directory itself when the leaf is absent.
    fn target(&self, fs: &Filesystem, path: &str) -> Result<Target, FsError> {
        let (parent, name) = resolve_parent_and_name(&fs.tree, path, self.cwd)?;
        self.pick_target(fs, parent, name, path)
    }

    fn pick_target(
        &self,
        fs: &Filesystem,
        parent: DirId,
        name: Option<String>,
        path: &str,
    ) -> Result<Target, FsError> {
        let Some(name) = name else {
            return Ok(Target::Dir(parent));
        };
        if fs.tree.find_file(parent, &name).is_some() {
            return Ok(Target::File(parent, name));
        }
        fs.tree
            .find_dir(parent, &name)
            .map(Target::Dir)
            .ok_or_else(|| FsError::not_found(path))
    }
}

enum Target {
    File(DirId, String),
    Dir(DirId),
}
