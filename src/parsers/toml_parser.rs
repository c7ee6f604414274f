use crate::error::Result;
use crate::parsers::ManifestParser;
use regex::Regex;

pub struct TomlParser;
impl ManifestParser for TomlParser {
    fn version_match_regex() -> Result<Regex> {
        Ok(Regex::new(r##"(?m)^(version\s*=\s*")(\d+\.\d+\.\d+)(")"##)?)
    }

    fn filename_match_regex() -> Result<Regex> {
        Ok(Regex::new(r#"(?i)(^|[/\\])Cargo\.toml$"#)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use semver::Version;

    #[test]
    fn test_version_regex_matches_no_spaces() {
        let regex = TomlParser::version_match_regex().unwrap();
        let captures = regex.captures(r#"version="0.1.0""#).unwrap();
        assert_eq!(captures.get(2).unwrap().as_str(), "0.1.0");
    }

    #[test]
    fn test_version_regex_ignores_dependency_versions() {
        let regex = TomlParser::version_match_regex().unwrap();
        let content = r#"[package]
name = "test"
version = "1.0.0"

[dependencies]
serde = { version = "1.0" }
"#;
        let captures = regex.captures(content).unwrap();
        assert_eq!(captures.get(2).unwrap().as_str(), "1.0.0");
    }

    #[test]
    fn test_update_keeps_rest_of_line() {
        let regex = TomlParser::version_match_regex().unwrap();
        let format = TomlParser::version_line_format(&Version::new(1, 1, 0));
        let content = "version = \"1.0.9\" # released\n";
        assert_eq!(regex.replace(content, format.as_str()), "version = \"1.1.0\" # released\n");
    }

    #[test]
    fn test_filename_regex_no_false_positives() {
        let regex = TomlParser::filename_match_regex().unwrap();
        assert!(regex.is_match("/path/to/Cargo.toml"));
        assert!(!regex.is_match("/path/to/pyproject.toml"));
        assert!(!regex.is_match("/path/to/NotCargo.toml"));
    }
}
