use crate::error::ReleaseError;
use clap::ValueEnum;
use semver::Version;
use std::fmt;
use std::str::FromStr;

/// Which component of the version to increment
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum BumpKind {
    Major,
    Minor,
    Patch,
}

impl FromStr for BumpKind {
    type Err = ReleaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "major" => Ok(BumpKind::Major),
            "minor" => Ok(BumpKind::Minor),
            "patch" => Ok(BumpKind::Patch),
            _ => Err(ReleaseError::InvalidBumpKind(s.to_string())),
        }
    }
}

impl fmt::Display for BumpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BumpKind::Major => "major",
            BumpKind::Minor => "minor",
            BumpKind::Patch => "patch",
        })
    }
}

/// Computes the next version. Lower-order components reset to zero and any
/// pre-release or build metadata is dropped.
pub fn bump(version: &Version, kind: BumpKind) -> Result<Version, ReleaseError> {
    let next = match kind {
        BumpKind::Major => version.major.checked_add(1).map(|major| Version::new(major, 0, 0)),
        BumpKind::Minor => version.minor.checked_add(1).map(|minor| Version::new(version.major, minor, 0)),
        BumpKind::Patch => version
            .patch
            .checked_add(1)
            .map(|patch| Version::new(version.major, version.minor, patch)),
    };
    next.ok_or_else(|| ReleaseError::VersionOverflow { version: version.clone(), kind: kind.to_string() })
}

/// Tag name for a released version, e.g. `v1.2.3`
pub fn tag_name(version: &Version) -> String {
    format!("v{version}")
}
