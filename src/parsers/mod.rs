use crate::error::{ReleaseError, Result};
use crate::git::SourceControl;
use log::{debug, info, warn};
use regex::Regex;
use semver::Version;
use std::path::{Path, PathBuf};

pub mod package_json_parser;
pub mod swift_package_parser;
pub mod toml_parser;

use package_json_parser::PackageJsonParser;
use swift_package_parser::SwiftPackageParser;
use toml_parser::TomlParser;

/// Glob handed to the tag listing
pub const VERSION_TAG_GLOB: &str = "v*.*.*";

/// Anything able to report the package's current version
pub trait VersionSource {
    fn current_version(&self) -> Result<Version>;
}

/// A manifest format whose version declaration can be read and rewritten in place.
///
/// `version_match_regex` must capture three groups: the text leading up to
/// the version, the dotted `major.minor.patch` itself, and the closing quote.
pub trait ManifestParser {
    fn get_current_version(path: impl AsRef<Path>) -> Result<Version> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let version_regex = Self::version_match_regex()?;

        if let Some(captures) = version_regex.captures(contents.as_str()) {
            if let Some(declared) = captures.get(2) {
                debug!("Found current version {} in '{}'", declared.as_str(), path.display());
                if let Some(version) = parse_numeric_version(declared.as_str()) {
                    return Ok(version);
                }
                warn!("Version '{}' in '{}' is out of range", declared.as_str(), path.display());
            }
        }

        Err(ReleaseError::VersionNotFound { path: path.to_path_buf() })
    }

    /// Rewrites the first version declaration. Returns `false` and leaves the
    /// file untouched when there is nothing to rewrite.
    fn update_version(path: impl AsRef<Path>, version: &Version) -> Result<bool> {
        let path = path.as_ref();
        info!("Updating '{}' to version {}", path.display(), version);
        let contents = std::fs::read_to_string(path)?;
        let version_regex = Self::version_match_regex()?;

        if !version_regex.is_match(contents.as_str()) {
            warn!("No version declaration in '{}', leaving it unchanged", path.display());
            return Ok(false);
        }

        let new_contents = version_regex
            .replace(contents.as_str(), Self::version_line_format(version))
            .to_string();
        std::fs::write(path, new_contents)?;
        Ok(true)
    }

    fn version_match_regex() -> Result<Regex>;
    fn filename_match_regex() -> Result<Regex>;

    fn version_line_format(version: &Version) -> String {
        format!("${{1}}{}.{}.{}${{3}}", version.major, version.minor, version.patch)
    }
}

/// Supported manifest formats, picked from the manifest's file name
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ManifestKind {
    SwiftPackage,
    Cargo,
    PackageJson,
}

impl ManifestKind {
    /// Unknown file names fall back to the Swift package format.
    pub fn detect(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_string_lossy();
        if TomlParser::filename_match_regex()?.is_match(&path) {
            Ok(ManifestKind::Cargo)
        } else if PackageJsonParser::filename_match_regex()?.is_match(&path) {
            Ok(ManifestKind::PackageJson)
        } else {
            Ok(ManifestKind::SwiftPackage)
        }
    }

    pub fn get_current_version(self, path: &Path) -> Result<Version> {
        match self {
            ManifestKind::SwiftPackage => SwiftPackageParser::get_current_version(path),
            ManifestKind::Cargo => TomlParser::get_current_version(path),
            ManifestKind::PackageJson => PackageJsonParser::get_current_version(path),
        }
    }

    pub fn update_version(self, path: &Path, version: &Version) -> Result<bool> {
        match self {
            ManifestKind::SwiftPackage => SwiftPackageParser::update_version(path, version),
            ManifestKind::Cargo => TomlParser::update_version(path, version),
            ManifestKind::PackageJson => PackageJsonParser::update_version(path, version),
        }
    }
}

/// Reads the version declared in a manifest file
pub struct ManifestVersionSource {
    path: PathBuf,
    kind: ManifestKind,
}

impl ManifestVersionSource {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let kind = ManifestKind::detect(&path)?;
        debug!("Using {:?} manifest at '{}'", kind, path.display());
        Ok(Self { path, kind })
    }

    pub fn update_version(&self, version: &Version) -> Result<bool> {
        self.kind.update_version(&self.path, version)
    }
}

impl VersionSource for ManifestVersionSource {
    fn current_version(&self) -> Result<Version> {
        self.kind.get_current_version(&self.path)
    }
}

/// Derives the version from the highest `vX.Y.Z` tag in the repository
pub struct TagVersionSource<'a, S: SourceControl + ?Sized> {
    scm: &'a S,
}

impl<'a, S: SourceControl + ?Sized> TagVersionSource<'a, S> {
    pub fn new(scm: &'a S) -> Self {
        Self { scm }
    }
}

impl<S: SourceControl + ?Sized> VersionSource for TagVersionSource<'_, S> {
    fn current_version(&self) -> Result<Version> {
        let tags = match self.scm.list_tags(VERSION_TAG_GLOB) {
            Ok(tags) => tags,
            Err(err) => {
                warn!("Could not get version from git tags: {}", err);
                return Ok(Version::new(0, 0, 0));
            }
        };

        let latest = latest_tagged_version(&tags)?;
        match &latest {
            Some(version) => debug!("Latest tagged version: {}", version),
            None => info!("No version tags found, starting from 0.0.0"),
        }
        Ok(latest.unwrap_or_else(|| Version::new(0, 0, 0)))
    }
}

/// Highest version among tags shaped exactly like `vX.Y.Z`
pub fn latest_tagged_version<T: AsRef<str>>(tags: &[T]) -> Result<Option<Version>> {
    let tag_regex = Regex::new(r"^v(\d+\.\d+\.\d+)$")?;

    let mut latest: Option<Version> = None;
    for tag in tags {
        let Some(captures) = tag_regex.captures(tag.as_ref().trim()) else {
            debug!("Ignoring tag '{}'", tag.as_ref());
            continue;
        };
        let Some(version) = parse_numeric_version(&captures[1]) else {
            debug!("Ignoring tag '{}' with out of range components", tag.as_ref());
            continue;
        };
        if latest.as_ref().is_none_or(|current| version > *current) {
            latest = Some(version);
        }
    }

    Ok(latest)
}

/// Reads a dotted `major.minor.patch` as integers, so leading zeros are
/// accepted. `None` when it is not three components or one overflows `u64`.
fn parse_numeric_version(text: &str) -> Option<Version> {
    let mut components = text.split('.').map(|component| component.parse::<u64>().ok());
    match (components.next(), components.next(), components.next(), components.next()) {
        (Some(Some(major)), Some(Some(minor)), Some(Some(patch)), None) => Some(Version::new(major, minor, patch)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_tag_uses_numeric_order() {
        let tags = ["v1.2.0", "v1.10.0", "v2.0.0"];
        assert_eq!(latest_tagged_version(&tags).unwrap(), Some(Version::new(2, 0, 0)));

        let tags = ["v10.0.0", "v2.0.0", "v9.9.9"];
        assert_eq!(latest_tagged_version(&tags).unwrap(), Some(Version::new(10, 0, 0)));

        let tags = ["v1.9.0", "v1.10.0"];
        assert_eq!(latest_tagged_version(&tags).unwrap(), Some(Version::new(1, 10, 0)));
    }

    #[test]
    fn test_latest_tag_ignores_other_shapes() {
        let tags = ["release-3", "v3.0", "v4.0.0-rc.1", "v1.0.0", "1.5.0"];
        assert_eq!(latest_tagged_version(&tags).unwrap(), Some(Version::new(1, 0, 0)));
    }

    #[test]
    fn test_latest_tag_empty() {
        let tags: [&str; 0] = [];
        assert_eq!(latest_tagged_version(&tags).unwrap(), None);
        assert_eq!(latest_tagged_version(&[""]).unwrap(), None);
    }

    #[test]
    fn test_latest_tag_accepts_leading_zeros() {
        let tags = ["v1.02.3", "v1.1.9"];
        assert_eq!(latest_tagged_version(&tags).unwrap(), Some(Version::new(1, 2, 3)));
    }

    #[test]
    fn test_latest_tag_skips_out_of_range_components() {
        let tags = ["v18446744073709551616.0.0", "v0.4.0"];
        assert_eq!(latest_tagged_version(&tags).unwrap(), Some(Version::new(0, 4, 0)));
    }

    #[test]
    fn test_parse_numeric_version() {
        assert_eq!(parse_numeric_version("1.02.3"), Some(Version::new(1, 2, 3)));
        assert_eq!(parse_numeric_version("007.0.10"), Some(Version::new(7, 0, 10)));
        assert_eq!(parse_numeric_version("1.2"), None);
        assert_eq!(parse_numeric_version("1.2.3.4"), None);
        assert_eq!(parse_numeric_version("1.x.3"), None);
        assert_eq!(parse_numeric_version("99999999999999999999.0.0"), None);
    }

    #[test]
    fn test_detect_manifest_kind() {
        assert_eq!(ManifestKind::detect("/repo/Package.swift").unwrap(), ManifestKind::SwiftPackage);
        assert_eq!(ManifestKind::detect("/repo/Cargo.toml").unwrap(), ManifestKind::Cargo);
        assert_eq!(ManifestKind::detect("/repo/package.json").unwrap(), ManifestKind::PackageJson);
        assert_eq!(ManifestKind::detect("/repo/VERSION").unwrap(), ManifestKind::SwiftPackage);
    }

    #[test]
    fn test_version_line_format_keeps_surrounding_groups() {
        let formatted = SwiftPackageParser::version_line_format(&Version::new(1, 2, 3));
        assert_eq!(formatted, "${1}1.2.3${3}");
    }
}
