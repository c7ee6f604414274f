use crate::error::Result;
use crate::parsers::ManifestParser;
use regex::Regex;

/// `Package.swift` declaring its version in a `.package(... version: "X.Y.Z" ...)` call
pub struct SwiftPackageParser;

impl ManifestParser for SwiftPackageParser {
    fn version_match_regex() -> Result<Regex> {
        Ok(Regex::new(r#"(?s)(\.package\(.*?version:\s*["'])(\d+\.\d+\.\d+)(["'])"#)?)
    }

    fn filename_match_regex() -> Result<Regex> {
        Ok(Regex::new(r#"(?i)(^|[/\\])Package\.swift$"#)?)
    }
}
