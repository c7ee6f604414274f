//! Token lookup for the release API.
//!
//! Providers are asked in order and the first one producing a non-blank
//! token wins.

use crate::error::{ReleaseError, Result};
use log::debug;
use std::path::PathBuf;

pub const TOKEN_ENV_VAR: &str = "GITHUB_TOKEN";
pub const TOKEN_GIT_CONFIG_KEY: &str = "github.token";

pub trait CredentialProvider {
    fn name(&self) -> &str;
    /// The token, or `None` to let the next provider try
    fn provide(&self) -> Option<String>;
}

/// A token passed on the command line
pub struct ExplicitCredential(pub Option<String>);

impl CredentialProvider for ExplicitCredential {
    fn name(&self) -> &str {
        "--token"
    }

    fn provide(&self) -> Option<String> {
        self.0.clone()
    }
}

pub struct EnvCredential {
    pub var: String,
}

impl CredentialProvider for EnvCredential {
    fn name(&self) -> &str {
        &self.var
    }

    fn provide(&self) -> Option<String> {
        std::env::var(&self.var).ok()
    }
}

/// Reads a key from the repository's git config, which falls back to the
/// global and system config files.
pub struct GitConfigCredential {
    pub repository: PathBuf,
    pub key: String,
}

impl CredentialProvider for GitConfigCredential {
    fn name(&self) -> &str {
        &self.key
    }

    fn provide(&self) -> Option<String> {
        let config = match git2::Repository::discover(&self.repository) {
            Ok(repository) => repository.config(),
            Err(_) => git2::Config::open_default(),
        };
        config.and_then(|config| config.get_string(&self.key)).ok()
    }
}

#[derive(Default)]
pub struct CredentialChain {
    providers: Vec<Box<dyn CredentialProvider>>,
}

impl CredentialChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// `--token`, then `GITHUB_TOKEN`, then `github.token` from git config
    pub fn standard(token: Option<String>, repository: impl Into<PathBuf>) -> Self {
        Self::new()
            .with(ExplicitCredential(token))
            .with(EnvCredential { var: TOKEN_ENV_VAR.to_string() })
            .with(GitConfigCredential { repository: repository.into(), key: TOKEN_GIT_CONFIG_KEY.to_string() })
    }

    pub fn with(mut self, provider: impl CredentialProvider + 'static) -> Self {
        self.providers.push(Box::new(provider));
        self
    }

    pub fn resolve(&self) -> Result<String> {
        for provider in &self.providers {
            match provider.provide() {
                Some(token) if !token.trim().is_empty() => {
                    debug!("Using token from {}", provider.name());
                    return Ok(token.trim().to_string());
                }
                _ => debug!("No token from {}", provider.name()),
            }
        }
        Err(ReleaseError::MissingCredential)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Option<&'static str>);

    impl CredentialProvider for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        fn provide(&self) -> Option<String> {
            self.0.map(str::to_string)
        }
    }

    #[test]
    fn test_first_provider_wins() {
        let chain = CredentialChain::new().with(Fixed(Some("first"))).with(Fixed(Some("second")));
        assert_eq!(chain.resolve().unwrap(), "first");
    }

    #[test]
    fn test_declining_and_blank_providers_are_skipped() {
        let chain = CredentialChain::new()
            .with(ExplicitCredential(None))
            .with(Fixed(Some("   ")))
            .with(Fixed(Some("token\n")));
        assert_eq!(chain.resolve().unwrap(), "token");
    }

    #[test]
    fn test_empty_chain_is_missing_credential() {
        let err = CredentialChain::new().with(Fixed(None)).resolve().unwrap_err();
        assert!(matches!(err, ReleaseError::MissingCredential));
    }

    #[test]
    fn test_env_credential() {
        let var = "RELEASE_BUMP_TEST_ENV_CREDENTIAL";
        // SAFETY: the variable name is unique to this test
        unsafe { std::env::set_var(var, "from-env") };
        let chain = CredentialChain::new().with(ExplicitCredential(None)).with(EnvCredential { var: var.to_string() });
        assert_eq!(chain.resolve().unwrap(), "from-env");
        unsafe { std::env::remove_var(var) };

        assert!(EnvCredential { var: var.to_string() }.provide().is_none());
    }

    #[test]
    fn test_explicit_beats_env() {
        let var = "RELEASE_BUMP_TEST_EXPLICIT_FIRST";
        // SAFETY: the variable name is unique to this test
        unsafe { std::env::set_var(var, "from-env") };
        let chain = CredentialChain::new()
            .with(ExplicitCredential(Some("explicit".into())))
            .with(EnvCredential { var: var.to_string() });
        assert_eq!(chain.resolve().unwrap(), "explicit");
        unsafe { std::env::remove_var(var) };
    }

    #[test]
    fn test_git_config_credential() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let repo = git2::Repository::init(temp_dir.path()).unwrap();
        repo.config().unwrap().set_str("release-bump.testtoken", "from-git").unwrap();

        let provider = GitConfigCredential {
            repository: temp_dir.path().to_path_buf(),
            key: "release-bump.testtoken".to_string(),
        };
        assert_eq!(provider.provide().as_deref(), Some("from-git"));
    }
}
