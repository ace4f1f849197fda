//! User identities and the registry they are looked up in.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{FsError, RegistryError};

/// Numeric id reserved for the superuser.
pub const SUPERUSER_UID: u32 = 0;

/// A registered user. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct User {
    pub name: String,
    pub uid: u32,
    pub group: String,
}

impl User {
    pub fn new(name: impl Into<String>, uid: u32, group: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            uid,
            group: group.into(),
        }
    }

    pub fn is_superuser(&self) -> bool {
        self.uid == SUPERUSER_UID
    }
}

/// Fixed mapping from user name to [`User`].
#[derive(Debug, Clone)]
pub struct UserRegistry {
    users: BTreeMap<String, Arc<User>>,
    superuser: Arc<User>,
}

impl UserRegistry {
    /// Build a registry from a user list.
    ///
    /// Names must be unique path components and at least one user must
    /// have uid 0.
    pub fn new(users: impl IntoIterator<Item = User>) -> Result<Self, RegistryError> {
        let mut map = BTreeMap::new();
        for user in users {
            if !is_valid_name(&user.name) {
                return Err(RegistryError::InvalidName(user.name));
            }
            if map.contains_key(&user.name) {
                return Err(RegistryError::DuplicateUser(user.name));
            }
            map.insert(user.name.clone(), Arc::new(user));
        }

        let superuser = map
            .values()
            .find(|u| u.is_superuser())
            .cloned()
            .ok_or(RegistryError::MissingSuperuser)?;

        Ok(Self {
            users: map,
            superuser,
        })
    }

    /// The users of the initial image: `root`, `usuario1`, `usuario2`.
    pub fn bootstrap() -> Self {
        let root = Arc::new(User::new("root", SUPERUSER_UID, "root"));
        let mut users = BTreeMap::new();
        users.insert(root.name.clone(), root.clone());
        for (name, uid) in [("usuario1", 1001), ("usuario2", 1002)] {
            users.insert(name.to_string(), Arc::new(User::new(name, uid, "usuarios")));
        }

        Self {
            users,
            superuser: root,
        }
    }

    pub fn lookup(&self, name: &str) -> Result<Arc<User>, FsError> {
        self.users
            .get(name)
            .cloned()
            .ok_or_else(|| FsError::unknown_user(name))
    }

    pub fn exists(&self, name: &str) -> bool {
        self.users.contains_key(name)
    }

    pub fn all_names(&self) -> BTreeSet<String> {
        self.users.keys().cloned().collect()
    }

    /// The first user with uid 0, by name order.
    pub fn superuser(&self) -> Arc<User> {
        self.superuser.clone()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<User>> {
        self.users.values()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

/// Empty names, `.`, `..` and names containing `/` cannot name a directory.
fn is_valid_name(name: &str) -> bool {
    !matches!(name, "" | "." | "..") && !name.contains('/')
}

impl Default for UserRegistry {
    fn default() -> Self {
        Self::bootstrap()
    }
}
