use std::path::PathBuf;
use thiserror::Error;

/// Every way a release run can fail. None of these are retried.
#[derive(Debug, Error)]
pub enum ReleaseError {
    #[error("No version declaration found in '{}'", .path.display())]
    VersionNotFound { path: PathBuf },

    #[error("Invalid part to bump: '{0}'. Choose 'major', 'minor', or 'patch'")]
    InvalidBumpKind(String),

    #[error("Cannot bump the {kind} component of {version}: it is already at its maximum")]
    VersionOverflow { version: semver::Version, kind: String },

    #[error("Tests failed: '{command}' exited with {}", .code.map_or_else(|| "a signal".to_string(), |c| format!("code {c}")))]
    TestFailure { command: String, code: Option<i32> },

    #[error("Failed to start '{command}'")]
    CommandSpawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("No test command configured")]
    EmptyTestCommand,

    #[error("Git operation '{operation}' failed (code {code}): {message}")]
    SourceControl {
        operation: String,
        code: i32,
        message: String,
    },

    #[error("Remote '{remote}' is not configured")]
    RemoteNotConfigured { remote: String },

    #[error("Unsupported remote URL format: {url}")]
    UnsupportedRemoteFormat { url: String },

    #[error("GitHub token not provided. Pass --token, set GITHUB_TOKEN or configure github.token in git config")]
    MissingCredential,

    #[error("Failed to create GitHub release (HTTP {status}): {body}")]
    Publish { status: u16, body: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Regex(#[from] regex::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, ReleaseError>;

impl ReleaseError {
    /// Maps a libgit2 failure of the named operation
    pub fn git(operation: impl Into<String>) -> impl FnOnce(git2::Error) -> Self {
        let operation = operation.into();
        move |err| ReleaseError::SourceControl {
            operation,
            code: err.raw_code(),
            message: err.message().to_string(),
        }
    }
}
