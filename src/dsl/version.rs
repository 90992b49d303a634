//! Description-language version numbers.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// A `major.minor[.patch]` language version declared with `DeclVersion`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LanguageVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl LanguageVersion {
    /// First released language version.
    pub const INITIAL: LanguageVersion = LanguageVersion::new(1, 0, 0);
    /// Most recent language version this engine understands.
    pub const LATEST: LanguageVersion = LanguageVersion::new(1, 1, 0);

    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        LanguageVersion {
            major,
            minor,
            patch,
        }
    }

    pub fn is_more_recent_than(&self, other: LanguageVersion) -> bool {
        *self > other
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid version string '{0}': expected 'major.minor' or 'major.minor.patch'")]
pub struct VersionParseError(pub String);

impl FromStr for LanguageVersion {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('.').collect();
        if parts.len() < 2 || parts.len() > 3 {
            return Err(VersionParseError(s.to_string()));
        }

        let mut numbers = [0u32; 3];
        for (i, part) in parts.iter().enumerate() {
            numbers[i] = part
                .parse()
                .map_err(|_| VersionParseError(s.to_string()))?;
        }

        Ok(LanguageVersion::new(numbers[0], numbers[1], numbers[2]))
    }
}

impl fmt::Display for LanguageVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}
