use crate::credentials::CredentialChain;
use crate::error::{ReleaseError, Result};
use crate::git::SourceControl;
use crate::remote::RepositoryIdentity;
use crate::version::tag_name;
use log::{debug, info, warn};
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, AUTHORIZATION, USER_AGENT};
use semver::Version;
use serde::Serialize;

const GITHUB_ACCEPT: &str = "application/vnd.github.v3+json";

/// Body of `POST /repos/{owner}/{repo}/releases`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleaseRequest {
    pub tag_name: String,
    pub target_commitish: String,
    pub name: String,
    pub body: String,
    pub draft: bool,
    pub prerelease: bool,
}

impl ReleaseRequest {
    pub fn new(version: &Version, target_branch: &str) -> Self {
        Self {
            tag_name: tag_name(version),
            target_commitish: target_branch.to_string(),
            name: format!("Version {version}"),
            body: format!("Release version {version}"),
            draft: false,
            prerelease: false,
        }
    }
}

/// Creates release records through the GitHub REST API
pub struct ReleasePublisher {
    client: reqwest::Client,
    api_root: String,
    target_branch: String,
    credentials: CredentialChain,
}

impl ReleasePublisher {
    pub fn new(api_root: impl Into<String>, target_branch: impl Into<String>, credentials: CredentialChain) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_root: api_root.into(),
            target_branch: target_branch.into(),
            credentials,
        }
    }

    /// Publishes `version` for the repository behind the current remote.
    pub async fn publish<S: SourceControl + ?Sized>(&self, scm: &S, version: &Version) -> Result<RepositoryIdentity> {
        let token = self.credentials.resolve()?;
        let identity = RepositoryIdentity::from_remote_url(&scm.current_remote_url()?)?;
        let request = ReleaseRequest::new(version, &self.target_branch);

        let url = format!("{}/repos/{}/{}/releases", self.api_root, identity.owner, identity.name);
        debug!("POST {} {:?}", url, request);

        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, format!("token {token}"))
            .header(ACCEPT, GITHUB_ACCEPT)
            .header(USER_AGENT, concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::CREATED {
            let body = match response.text().await {
                Ok(body) => body,
                Err(err) => {
                    warn!("Could not read the response body of the failed release request: {}", err);
                    String::new()
                }
            };
            return Err(ReleaseError::Publish { status: status.as_u16(), body });
        }

        info!("Created GitHub release {} for {}", request.tag_name, identity);
        Ok(identity)
    }
}
