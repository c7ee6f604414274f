use crate::config::{ProjectConfig, VersionSourceKind};
use crate::version::BumpKind;
use clap::Parser;

#[derive(Debug, Parser)]
#[command(author, version, about, bin_name = "rb")]
pub struct Arguments {
    /// Which part of the version to bump
    #[arg(value_enum, ignore_case = true)]
    pub part: BumpKind,
    /// Skip running the test suite
    #[arg(long)]
    pub skip_tests: bool,
    /// Skip tagging and creating the GitHub release
    #[arg(long = "skip-github", visible_alias = "skip-publish")]
    pub skip_publish: bool,
    /// Show what would be done without making any changes
    #[arg(long)]
    pub dry_run: bool,
    /// GitHub personal access token (defaults to GITHUB_TOKEN, then github.token in git config)
    #[arg(long)]
    pub token: Option<String>,
    /// Where the current version is read from
    #[arg(long, short, value_enum, ignore_case = true, default_value_t = VersionSourceKind::Manifest)]
    pub source: VersionSourceKind,
    #[arg(long, short, default_value = "./")]
    pub path: String,
    /// Manifest file, relative to --path
    #[arg(long, short, default_value = ProjectConfig::DEFAULT_MANIFEST)]
    pub manifest: String,
    #[arg(long, default_value = ProjectConfig::DEFAULT_REMOTE)]
    pub remote: String,
    /// Branch the GitHub release targets
    #[arg(long, default_value = ProjectConfig::DEFAULT_BRANCH)]
    pub branch: String,
    #[arg(long, default_value = ProjectConfig::DEFAULT_TEST_COMMAND)]
    pub test_command: String,
    #[arg(long, default_value = ProjectConfig::DEFAULT_API_ROOT)]
    pub api_url: String,
    #[arg(long, short)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let args = Arguments::parse_from(["rb", "patch"]);
        assert_eq!(args.part, BumpKind::Patch);
        assert_eq!(args.source, VersionSourceKind::Manifest);
        assert_eq!(args.path, "./");
        assert_eq!(args.manifest, "Package.swift");
        assert!(!args.skip_tests);
        assert!(!args.skip_publish);
        assert!(!args.dry_run);
        assert!(!args.verbose);
        assert!(args.token.is_none());
    }

    #[test]
    fn test_part_is_required() {
        assert!(Arguments::try_parse_from(["rb"]).is_err());
    }

    #[test]
    fn test_invalid_part_is_rejected() {
        assert!(Arguments::try_parse_from(["rb", "build"]).is_err());
    }

    #[test]
    fn test_parse_part_case_insensitive() {
        assert_eq!(Arguments::parse_from(["rb", "MAJOR"]).part, BumpKind::Major);
        assert_eq!(Arguments::parse_from(["rb", "Minor"]).part, BumpKind::Minor);
    }

    #[test]
    fn test_parse_flags() {
        let args = Arguments::parse_from([
            "rb",
            "minor",
            "--skip-tests",
            "--skip-github",
            "--dry-run",
            "--token",
            "xyz",
        ]);
        assert!(args.skip_tests);
        assert!(args.skip_publish);
        assert!(args.dry_run);
        assert_eq!(args.token.as_deref(), Some("xyz"));
    }

    #[test]
    fn test_skip_publish_alias() {
        let args = Arguments::parse_from(["rb", "patch", "--skip-publish"]);
        assert!(args.skip_publish);
    }

    #[test]
    fn test_parse_source_tags() {
        let args = Arguments::parse_from(["rb", "patch", "-s", "tags"]);
        assert_eq!(args.source, VersionSourceKind::Tags);

        let args = Arguments::parse_from(["rb", "patch", "--source", "TAGS"]);
        assert_eq!(args.source, VersionSourceKind::Tags);
    }

    #[test]
    fn test_parse_long_options() {
        let args = Arguments::parse_from([
            "rb",
            "major",
            "--path",
            "/test",
            "--manifest",
            "package.json",
            "--remote",
            "upstream",
            "--branch",
            "trunk",
            "--test-command",
            "npm test",
            "--verbose",
        ]);
        assert_eq!(args.path, "/test");
        assert_eq!(args.manifest, "package.json");
        assert_eq!(args.remote, "upstream");
        assert_eq!(args.branch, "trunk");
        assert_eq!(args.test_command, "npm test");
        assert!(args.verbose);
    }
}
