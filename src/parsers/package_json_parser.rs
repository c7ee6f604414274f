use crate::error::Result;
use crate::parsers::ManifestParser;
use regex::Regex;

pub struct PackageJsonParser;

impl ManifestParser for PackageJsonParser {
    fn version_match_regex() -> Result<Regex> {
        Ok(Regex::new(r##"(?m)^(\s*"version"\s*:\s*")(\d+\.\d+\.\d+)(")"##)?)
    }

    fn filename_match_regex() -> Result<Regex> {
        Ok(Regex::new(r#"(?i)(^|[/\\])package\.json$"#)?)
    }
}
