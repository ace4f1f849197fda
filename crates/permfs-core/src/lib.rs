//! # permfs core
//!
//! A multi-user, in-memory hierarchical filesystem with Unix-style
//! ownership and permissions, built for teaching operating-system
//! concepts.
//!
//! ## Modules
//!
//! - [`identity`]: users and the fixed [`UserRegistry`]
//! - [`tree`]: the directory arena ([`Tree`], [`Directory`], [`File`])
//! - [`path`]: absolute/relative resolution with `.` and `..`
//! - [`permissions`]: [`PermissionTriple`] and the [`can_access`] decision
//! - [`filesystem`]: the shared [`Filesystem`] context and its initial image
//! - [`session`]: the command surface (`mkdir`, `ls`, `chmod`, ...)
//!
//! ## Example
//!
//! ```
//! use permfs_core::{Filesystem, PermissionTriple, Session};
//!
//! let mut session = Session::new(Filesystem::bootstrap().into_shared());
//! session.su("usuario1").unwrap();
//! session.cd("/home/usuario1").unwrap();
//! session
//!     .create_file("notes.txt", b"hello", PermissionTriple::FILE_DEFAULT)
//!     .unwrap();
//! assert_eq!(session.read("notes.txt").unwrap(), b"hello");
//! ```

pub mod error;
pub mod filesystem;
pub mod identity;
pub mod path;
pub mod permissions;
pub mod session;
pub mod tree;

pub use error::{ErrorKind, FsError, RegistryError};
pub use filesystem::{Filesystem, SharedFilesystem};
pub use identity::{User, UserRegistry, SUPERUSER_UID};
pub use path::{resolve, resolve_parent_and_name};
pub use permissions::{can_access, Access, PermissionTriple};
pub use session::{EntryInfo, EntryKind, Listing, Session};
pub use tree::{DirId, Directory, File, Tree, ROOT_DIR};
