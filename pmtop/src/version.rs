//! Version parsing and staleness classification for the server list.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::VersionParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl Version {
    /// Sentinel substituted for servers whose real version is unknown.
    pub const UNKNOWN: Version = Version {
        major: 0,
        minor: 0,
        patch: 0,
    };
}

impl FromStr for Version {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || VersionParseError {
            input: s.to_string(),
        };
        let rest = s.strip_prefix(['v', 'V']).unwrap_or(s);
        let mut parts = rest.split('.');
        let major = parts.next().ok_or_else(err)?.parse().map_err(|_| err())?;
        let minor = parts.next().ok_or_else(err)?.parse().map_err(|_| err())?;
        let patch = parts.next().ok_or_else(err)?.parse().map_err(|_| err())?;
        if parts.next().is_some() {
            return Err(err());
        }
        Ok(Version {
            major,
            minor,
            patch,
        })
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// How a remote server's version relates to the local baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionStatus {
    Updated,
    Behind,
    Critical,
}

impl VersionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            VersionStatus::Updated => "updated",
            VersionStatus::Behind => "behind",
            VersionStatus::Critical => "critical",
        }
    }
}

// Whether `remote` has drifted too far from `current` to trust.
fn too_far(current: Version, remote: Version) -> bool {
    if remote.major > current.major + 1 {
        return true;
    }
    if remote.major == current.major + 1 && remote.minor > 0 {
        return true;
    }
    remote.major == current.major && remote.minor > current.minor + 2
}

/// Classify a remote version against the local baseline. Version distance
/// always overrides whatever status the server reported about itself;
/// without a report the fallback is critical.
pub fn classify(
    current: Version,
    remote: Version,
    reported: Option<VersionStatus>,
) -> VersionStatus {
    if remote == Version::UNKNOWN || too_far(current, remote) {
        VersionStatus::Behind
    } else if remote == current {
        VersionStatus::Updated
    } else {
        reported.unwrap_or(VersionStatus::Critical)
    }
}
