use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::identity::UserRegistry;
use crate::permissions::PermissionTriple;
use crate::tree::{DirId, Tree};

/// A filesystem shared by any number of sessions.
pub type SharedFilesystem = Arc<RwLock<Filesystem>>;

/// User registry plus the directory tree.
#[derive(Debug, Clone)]
pub struct Filesystem {
    pub users: UserRegistry,
    pub tree: Tree,
}

impl Filesystem {
    /// The initial image: `/` and `/home` open to everyone, plus a `755`
    /// home directory for `usuario1` and `usuario2`.
    pub fn bootstrap() -> Self {
        Self::with_users(UserRegistry::bootstrap())
    }

    /// Same layout as [`Filesystem::bootstrap`], with one home directory
    /// per non-superuser in `users`.
    pub fn with_users(users: UserRegistry) -> Self {
        let root = users.superuser();
        let mut tree = Tree::new(root.clone(), PermissionTriple::OPEN);
        let home = tree
            .insert_dir(tree.root(), "home", root, PermissionTriple::OPEN)
            .unwrap_or(tree.root());

        for user in users.iter().filter(|u| !u.is_superuser()) {
            tree.insert_dir(home, &user.name, user.clone(), PermissionTriple::DIR_DEFAULT);
        }

        debug!("bootstrap: users={} dirs={}", users.len(), tree.dir_count());
        Self { users, tree }
    }

    pub fn into_shared(self) -> SharedFilesystem {
        Arc::new(RwLock::new(self))
    }

    /// Home directory of `name`, if it exists.
    pub fn home_of(&self, name: &str) -> Option<DirId> {
        let home = self.tree.find_dir(self.tree.root(), "home")?;
        self.tree.find_dir(home, name)
    }
}

impl Default for Filesystem {
    fn default() -> Self {
        Self::bootstrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::User;
    use crate::tree::ROOT_DIR;

    #[test]
    fn test_bootstrap_layout() {
        let fs = Filesystem::bootstrap();
        let root = fs.tree.get(ROOT_DIR).unwrap();
        assert_eq!(root.owner.name, "root");
        assert_eq!(root.permissions, PermissionTriple::OPEN);

        let home = fs.tree.find_dir(ROOT_DIR, "home").unwrap();
        let home_dir = fs.tree.get(home).unwrap();
        assert_eq!(home_dir.owner.name, "root");
        assert_eq!(home_dir.permissions.to_string(), "777");

        for name in ["usuario1", "usuario2"] {
            let id = fs.home_of(name).unwrap();
            let dir = fs.tree.get(id).unwrap();
            assert_eq!(dir.owner.name, name);
            assert_eq!(dir.permissions.to_string(), "755");
            assert_eq!(fs.tree.path_of(id).unwrap(), format!("/home/{name}"));
        }
        assert!(fs.home_of("root").is_none());
        assert_eq!(fs.tree.dir_count(), 4);
    }

    #[test]
    fn test_with_users_creates_homes() {
        let users = UserRegistry::new([
            User::new("admin", 0, "wheel"),
            User::new("alice", 1000, "staff"),
            User::new("bob", 1001, "staff"),
            User::new("carol", 1002, "guests"),
        ])
        .unwrap();
        let fs = Filesystem::with_users(users);
        assert_eq!(fs.tree.get(ROOT_DIR).unwrap().owner.name, "admin");
        for name in ["alice", "bob", "carol"] {
            assert!(fs.home_of(name).is_some());
        }
    }
}
