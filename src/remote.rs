use crate::error::{ReleaseError, Result};
use regex::Regex;
use std::fmt;

/// Owner and name of a hosted repository, e.g. `octocat/hello-world`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryIdentity {
    pub owner: String,
    pub name: String,
}

impl RepositoryIdentity {
    /// Accepts `user@host:owner/name[.git]` and `https://host/owner/name[.git]`.
    pub fn from_remote_url(url: &str) -> Result<Self> {
        let unsupported = || ReleaseError::UnsupportedRemoteFormat { url: url.to_string() };

        let ssh_regex = Regex::new(r"^[^@/\s]+@[^:/\s]+:(?P<path>[^\s]+)$")?;
        let https_regex = Regex::new(r"^https?://(?:[^@/\s]+@)?[^/\s]+/(?P<path>[^\s]+)$")?;

        let trimmed = url.trim();
        let captures = ssh_regex
            .captures(trimmed)
            .or_else(|| https_regex.captures(trimmed))
            .ok_or_else(unsupported)?;

        let path = captures["path"].trim_end_matches('/');
        let path = path.strip_suffix(".git").unwrap_or(path);

        let mut segments = path.split('/');
        match (segments.next(), segments.next(), segments.next()) {
            (Some(owner), Some(name), None) if !owner.is_empty() && !name.is_empty() => Ok(Self {
                owner: owner.to_string(),
                name: name.to_string(),
            }),
            _ => Err(unsupported()),
        }
    }
}

impl fmt::Display for RepositoryIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(owner: &str, name: &str) -> RepositoryIdentity {
        RepositoryIdentity { owner: owner.to_string(), name: name.to_string() }
    }

    #[test]
    fn test_ssh_url() {
        let parsed = RepositoryIdentity::from_remote_url("git@github.com:owner/repo.git").unwrap();
        assert_eq!(parsed, identity("owner", "repo"));
    }

    #[test]
    fn test_https_url() {
        let parsed = RepositoryIdentity::from_remote_url("https://github.com/owner/repo").unwrap();
        assert_eq!(parsed, identity("owner", "repo"));
    }

    #[test]
    fn test_https_url_with_suffix_and_credentials() {
        let parsed = RepositoryIdentity::from_remote_url("https://bot@github.com/owner/repo.git").unwrap();
        assert_eq!(parsed, identity("owner", "repo"));

        let parsed = RepositoryIdentity::from_remote_url("https://github.com/owner/repo/").unwrap();
        assert_eq!(parsed, identity("owner", "repo"));
    }

    #[test]
    fn test_other_hosts() {
        let parsed = RepositoryIdentity::from_remote_url("git@git.example.org:team/tool.git").unwrap();
        assert_eq!(parsed, identity("team", "tool"));
    }

    #[test]
    fn test_only_trailing_suffix_is_stripped() {
        let parsed = RepositoryIdentity::from_remote_url("git@github.com:owner/my.github.io.git").unwrap();
        assert_eq!(parsed, identity("owner", "my.github.io"));
    }

    #[test]
    fn test_unsupported_shapes() {
        for url in [
            "",
            "/srv/git/repo.git",
            "file:///srv/git/repo.git",
            "ssh://git@github.com/owner/repo.git",
            "git@github.com:repo.git",
            "https://github.com/owner",
            "https://github.com/group/sub/repo.git",
            "git@github.com:owner//repo",
        ] {
            let err = RepositoryIdentity::from_remote_url(url).unwrap_err();
            assert!(
                matches!(&err, ReleaseError::UnsupportedRemoteFormat { url: u } if u == url),
                "expected unsupported format for '{url}', got {err:?}"
            );
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(identity("owner", "repo").to_string(), "owner/repo");
    }
}
