use crate::arguments::Arguments;
use crate::version::BumpKind;
use clap::ValueEnum;
use std::path::PathBuf;

/// Where the current version comes from
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Default)]
pub enum VersionSourceKind {
    /// The version declared in the manifest file, which is rewritten on release
    #[default]
    Manifest,
    /// The highest `vX.Y.Z` tag; the manifest is never touched
    Tags,
}

/// What this invocation was asked to do
#[derive(Debug, Clone)]
pub struct RunConfiguration {
    pub bump: BumpKind,
    pub skip_tests: bool,
    pub skip_publish: bool,
    pub dry_run: bool,
    pub token: Option<String>,
}

/// Where the project lives and how it is released
#[derive(Debug, Clone)]
pub struct ProjectConfig {
    pub root: PathBuf,
    pub manifest_path: PathBuf,
    pub version_source: VersionSourceKind,
    pub remote: String,
    /// Branch the release record targets
    pub mainline_branch: String,
    pub api_root: String,
    pub test_command: Vec<String>,
}

impl ProjectConfig {
    pub const DEFAULT_MANIFEST: &'static str = "Package.swift";
    pub const DEFAULT_REMOTE: &'static str = "origin";
    pub const DEFAULT_BRANCH: &'static str = "main";
    pub const DEFAULT_API_ROOT: &'static str = "https://api.github.com";
    pub const DEFAULT_TEST_COMMAND: &'static str = "swift test -v";

    /// Defaults for a project rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            manifest_path: root.join(Self::DEFAULT_MANIFEST),
            root,
            version_source: VersionSourceKind::default(),
            remote: Self::DEFAULT_REMOTE.to_string(),
            mainline_branch: Self::DEFAULT_BRANCH.to_string(),
            api_root: Self::DEFAULT_API_ROOT.to_string(),
            test_command: split_command(Self::DEFAULT_TEST_COMMAND),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReleaseConfig {
    pub run: RunConfiguration,
    pub project: ProjectConfig,
}

impl From<&Arguments> for ReleaseConfig {
    fn from(args: &Arguments) -> Self {
        let root = PathBuf::from(&args.path);
        let manifest = PathBuf::from(&args.manifest);
        let manifest_path = if manifest.is_absolute() { manifest } else { root.join(manifest) };

        ReleaseConfig {
            run: RunConfiguration {
                bump: args.part,
                skip_tests: args.skip_tests,
                skip_publish: args.skip_publish,
                dry_run: args.dry_run,
                token: args.token.clone(),
            },
            project: ProjectConfig {
                root,
                manifest_path,
                version_source: args.source,
                remote: args.remote.clone(),
                mainline_branch: args.branch.clone(),
                api_root: args.api_url.trim_end_matches('/').to_string(),
                test_command: split_command(&args.test_command),
            },
        }
    }
}

fn split_command(command: &str) -> Vec<String> {
    command.split_whitespace().map(str::to_string).collect()
}
