//! NTFS-style file attributes carried by directories and files.

use crate::error::{Result, ShareError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::str::FromStr;

/// Set of NTFS attribute flags.
///
/// Textual form is the `" | "`-joined flag names, e.g. `"ReadOnly | Archive"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NtfsAttributes(u32);

impl NtfsAttributes {
    pub const READ_ONLY: Self = Self(0x0000_0001);
    pub const HIDDEN: Self = Self(0x0000_0002);
    pub const SYSTEM: Self = Self(0x0000_0004);
    pub const DIRECTORY: Self = Self(0x0000_0010);
    pub const ARCHIVE: Self = Self(0x0000_0020);
    /// No other attributes set; the service calls this "None".
    pub const NONE: Self = Self(0x0000_0080);
    pub const TEMPORARY: Self = Self(0x0000_0100);
    pub const OFFLINE: Self = Self(0x0000_1000);
    pub const NOT_CONTENT_INDEXED: Self = Self(0x0000_2000);
    pub const NO_SCRUB_DATA: Self = Self(0x0002_0000);

    const NAMES: [(Self, &'static str); 10] = [
        (Self::READ_ONLY, "ReadOnly"),
        (Self::HIDDEN, "Hidden"),
        (Self::SYSTEM, "System"),
        (Self::NONE, "None"),
        (Self::DIRECTORY, "Directory"),
        (Self::ARCHIVE, "Archive"),
        (Self::TEMPORARY, "Temporary"),
        (Self::OFFLINE, "Offline"),
        (Self::NOT_CONTENT_INDEXED, "NotContentIndexed"),
        (Self::NO_SCRUB_DATA, "NoScrubData"),
    ];

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl Default for NtfsAttributes {
    fn default() -> Self {
        Self::NONE
    }
}

impl BitOr for NtfsAttributes {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for NtfsAttributes {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for NtfsAttributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = Self::NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        f.write_str(&names.join(" | "))
    }
}

impl FromStr for NtfsAttributes {
    type Err = ShareError;

    fn from_str(s: &str) -> Result<Self> {
        let mut attributes = Self(0);
        for part in s.split('|').map(str::trim) {
            let flag = Self::NAMES
                .iter()
                .find(|(_, name)| name.eq_ignore_ascii_case(part))
                .map(|(flag, _)| *flag)
                .ok_or_else(|| {
                    ShareError::InvalidArgument(format!("unknown NTFS attribute '{}'", part))
                })?;
            attributes |= flag;
        }
        Ok(attributes)
    }
}
