//! Error types for permfs
//!
//! Every session command returns `Result<T, FsError>`. Errors are plain
//! values: the tree and the session remain usable after any of them.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::permissions::Access;

/// Errors returned by filesystem commands
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FsError {
    /// Path does not resolve to an existing node
    #[error("No such file or directory: {0}")]
    NotFound(String),

    /// Name collision on create
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// The permission evaluator denied the access
    #[error("Permission denied: {access} on {path}")]
    PermissionDenied { path: String, access: Access },

    /// Parent unresolved or malformed path
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Reference to a name missing from the user registry
    #[error("Unknown user: {0}")]
    UnknownUser(String),

    /// Removal of a directory that still has children
    #[error("Directory not empty: {0}")]
    NotEmpty(String),

    /// Permission string is not three octal digits
    #[error("Invalid permissions: {0:?} (expected three digits 0-7)")]
    InvalidPermissions(String),
}

impl FsError {
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound(path.into())
    }

    pub fn already_exists(path: impl Into<String>) -> Self {
        Self::AlreadyExists(path.into())
    }

    pub fn permission_denied(path: impl Into<String>, access: Access) -> Self {
        Self::PermissionDenied {
            path: path.into(),
            access,
        }
    }

    pub fn invalid_path(path: impl Into<String>) -> Self {
        Self::InvalidPath(path.into())
    }

    pub fn unknown_user(name: impl Into<String>) -> Self {
        Self::UnknownUser(name.into())
    }

    pub fn not_empty(path: impl Into<String>) -> Self {
        Self::NotEmpty(path.into())
    }

    /// The discriminant of this error, without its payload.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::AlreadyExists(_) => ErrorKind::AlreadyExists,
            Self::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            Self::InvalidPath(_) => ErrorKind::InvalidPath,
            Self::UnknownUser(_) => ErrorKind::UnknownUser,
            Self::NotEmpty(_) => ErrorKind::NotEmpty,
            Self::InvalidPermissions(_) => ErrorKind::InvalidPermissions,
        }
    }
}

/// Serializable tag for an [`FsError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    NotFound,
    AlreadyExists,
    PermissionDenied,
    InvalidPath,
    UnknownUser,
    NotEmpty,
    InvalidPermissions,
}

/// Errors building a user registry
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Duplicate user name: {0}")]
    DuplicateUser(String),

    #[error("Registry has no superuser (uid 0)")]
    MissingSuperuser,

    /// Name cannot be used as a home directory component
    #[error("Invalid user name: {0:?}")]
    InvalidName(String),
}
