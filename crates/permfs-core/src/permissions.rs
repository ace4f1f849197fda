//! Permission triples and the access decision.
//!
//! A [`PermissionTriple`] holds three octal digits (owner, group, other),
//! each a bitmask of read(4), write(2) and execute(1). [`can_access`] is
//! the single decision procedure every command goes through.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::FsError;
use crate::identity::User;

/// Requested access mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Access {
    Read,
    Write,
    Execute,
}

impl Access {
    /// Bit for this mode within a permission digit.
    pub const fn bit(self) -> u8 {
        match self {
            Access::Read => 4,
            Access::Write => 2,
            Access::Execute => 1,
        }
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Access::Read => "read",
            Access::Write => "write",
            Access::Execute => "execute",
        };
        f.write_str(name)
    }
}

/// Owner/group/other permission digits, each in `0..=7`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct PermissionTriple {
    owner: u8,
    group: u8,
    other: u8,
}

impl PermissionTriple {
    /// `755`: default for new directories.
    pub const DIR_DEFAULT: Self = Self::from_mode(0o755);
    /// `644`: default for new files.
    pub const FILE_DEFAULT: Self = Self::from_mode(0o644);
    /// `777`: root and `/home` in the initial image.
    pub const OPEN: Self = Self::from_mode(0o777);

    /// Build from three digits; any digit above 7 is rejected.
    pub fn new(owner: u8, group: u8, other: u8) -> Result<Self, FsError> {
        if owner > 7 || group > 7 || other > 7 {
            return Err(FsError::InvalidPermissions(format!("{owner}{group}{other}")));
        }
        Ok(Self { owner, group, other })
    }

    /// Build from a numeric mode such as `0o640`. Bits above the low nine are dropped.
    pub const fn from_mode(mode: u16) -> Self {
        Self {
            owner: ((mode >> 6) & 0o7) as u8,
            group: ((mode >> 3) & 0o7) as u8,
            other: (mode & 0o7) as u8,
        }
    }

    pub const fn mode(self) -> u16 {
        ((self.owner as u16) << 6) | ((self.group as u16) << 3) | self.other as u16
    }

    pub const fn owner(self) -> u8 {
        self.owner
    }

    pub const fn group(self) -> u8 {
        self.group
    }

    pub const fn other(self) -> u8 {
        self.other
    }

    /// Symbolic form, e.g. `rwxr-xr-x`.
    pub fn symbolic(self) -> String {
        [self.owner, self.group, self.other]
            .into_iter()
            .flat_map(|digit| {
                [
                    if digit & Access::Read.bit() != 0 { 'r' } else { '-' },
                    if digit & Access::Write.bit() != 0 { 'w' } else { '-' },
                    if digit & Access::Execute.bit() != 0 { 'x' } else { '-' },
                ]
            })
            .collect()
    }
}

impl Default for PermissionTriple {
    fn default() -> Self {
        Self::FILE_DEFAULT
    }
}

impl FromStr for PermissionTriple {
    type Err = FsError;

    /// Accepts exactly three ASCII digits `0`-`7`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || FsError::InvalidPermissions(s.to_string());
        let bytes = s.as_bytes();
        if bytes.len() != 3 {
            return Err(invalid());
        }
        let mut digits = [0u8; 3];
        for (slot, byte) in digits.iter_mut().zip(bytes) {
            match byte {
                b'0'..=b'7' => *slot = byte - b'0',
                _ => return Err(invalid()),
            }
        }
        Ok(Self {
            owner: digits[0],
            group: digits[1],
            other: digits[2],
        })
    }
}

impl fmt::Display for PermissionTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.owner, self.group, self.other)
    }
}

impl From<PermissionTriple> for String {
    fn from(perms: PermissionTriple) -> Self {
        perms.to_string()
    }
}

impl TryFrom<String> for PermissionTriple {
    type Error = FsError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Decide whether `actor` may perform `mode` on a node owned by `owner`.
///
/// The superuser is allowed unconditionally. Otherwise exactly one digit
/// applies: owner if the names match, else group if the groups match,
/// else other.
pub fn can_access(
    actor: &User,
    owner: &User,
    owner_group: &str,
    perms: PermissionTriple,
    mode: Access,
) -> bool {
    if actor.is_superuser() {
        return true;
    }

    let digit = if actor.name == owner.name {
        perms.owner
    } else if actor.group == owner_group {
        perms.group
    } else {
        perms.other
    };

    digit & mode.bit() != 0
}
