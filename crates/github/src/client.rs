//! GitHub REST client authenticated as a GitHub App.
//!
//! Implements [`CredentialProvider`] (installation lookup, token minting and
//! revocation) and [`ChangedFileSource`] (pull-request file listing).

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pipeline::{
    ChangedFileSource, ChangedFilesError, CredentialError, CredentialProvider, FilePath,
    InstallationId, InstallationToken, OrganizationLogin, PullRequestNumber, RepositoryRef,
    SecretString, Timestamp,
};
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT},
    Method, StatusCode,
};
use serde::{de::DeserializeOwned, Deserialize};
use tracing::{debug, info, warn};

use crate::{auth::AppJwtSigner, errors::GitHubError};

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;

pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Page size for pull-request file listing (the API maximum).
pub const FILES_PER_PAGE: usize = 100;

/// GitHub serves at most 3000 files per pull request.
pub const MAX_FILE_PAGES: u32 = 30;

const API_VERSION: &str = "2022-11-28";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct InstallationResponse {
    id: u64,
}

#[derive(Debug, Deserialize)]
struct AccessTokenResponse {
    token: String,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct PullRequestFile {
    filename: String,
    #[serde(default)]
    previous_filename: Option<String>,
}

/// GitHub App client.
#[derive(Debug, Clone)]
pub struct GitHubAppClient {
    http: reqwest::Client,
    api_url: String,
    signer: AppJwtSigner,
}

impl GitHubAppClient {
    /// Creates a client for the API at `api_url` (no trailing slash needed).
    pub fn new(api_url: &str, signer: AppJwtSigner) -> Result<Self, GitHubError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert("X-GitHub-Api-Version", HeaderValue::from_static(API_VERSION));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("steward/", env!("CARGO_PKG_VERSION"))),
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            signer,
        })
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        bearer: &SecretString,
        query: &[(&str, String)],
    ) -> Result<reqwest::Response, GitHubError> {
        let url = format!("{}{}", self.api_url, path);
        debug!(%method, %url, "GitHub request");
        let response = self
            .http
            .request(method, &url)
            .header(AUTHORIZATION, format!("Bearer {}", bearer.expose()))
            .query(query)
            .send()
            .await?;
        check_status(response, path).await
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        bearer: &SecretString,
        query: &[(&str, String)],
    ) -> Result<T, GitHubError> {
        let response = self.send(method, path, bearer, query).await?;
        Ok(response.json().await?)
    }

    /// Finds the App installation on `owner`, trying the organisation
    /// endpoint first and the user endpoint second.
    pub async fn installation_id(
        &self,
        owner: &OrganizationLogin,
    ) -> Result<InstallationId, GitHubError> {
        let jwt = self.signer.sign()?;
        let org_path = format!("/orgs/{owner}/installation");
        let found = match self
            .send_json::<InstallationResponse>(Method::GET, &org_path, &jwt, &[])
            .await
        {
            Err(GitHubError::NotFound { .. }) => {
                debug!(%owner, "No organisation installation; trying user account");
                let user_path = format!("/users/{owner}/installation");
                self.send_json::<InstallationResponse>(Method::GET, &user_path, &jwt, &[])
                    .await?
            }
            other => other?,
        };
        Ok(InstallationId::new(found.id))
    }

    /// Mints a token for installation `id`.
    pub async fn create_installation_token(
        &self,
        id: InstallationId,
    ) -> Result<InstallationToken, GitHubError> {
        let jwt = self.signer.sign()?;
        let path = format!("/app/installations/{id}/access_tokens");
        let response: AccessTokenResponse =
            self.send_json(Method::POST, &path, &jwt, &[]).await?;
        Ok(InstallationToken {
            token: SecretString::new(response.token),
            expires_at: Timestamp::from_utc(response.expires_at),
        })
    }

    /// Invalidates `token` before it expires.
    pub async fn revoke_installation_token(
        &self,
        token: &InstallationToken,
    ) -> Result<(), GitHubError> {
        self.send(Method::DELETE, "/installation/token", &token.token, &[])
            .await?;
        Ok(())
    }

    /// Lists every path a pull request touches. Renamed files contribute both
    /// their old and new path.
    pub async fn list_pull_request_files(
        &self,
        repository: &RepositoryRef,
        number: PullRequestNumber,
        token: &InstallationToken,
    ) -> Result<Vec<FilePath>, GitHubError> {
        let path = format!(
            "/repos/{}/{}/pulls/{number}/files",
            repository.owner, repository.name
        );
        let mut files = Vec::new();

        for page in 1..=MAX_FILE_PAGES {
            let query = [
                ("per_page", FILES_PER_PAGE.to_string()),
                ("page", page.to_string()),
            ];
            let batch: Vec<PullRequestFile> = self
                .send_json(Method::GET, &path, &token.token, &query)
                .await?;
            let last = batch.len() < FILES_PER_PAGE;

            for file in batch {
                files.extend(FilePath::new(file.filename));
                if let Some(previous) = file.previous_filename {
                    files.extend(FilePath::new(previous));
                }
            }
            if last {
                break;
            }
        }

        Ok(files)
    }
}

/// Maps unsuccessful statuses to [`GitHubError`].
async fn check_status(
    response: reqwest::Response,
    resource: &str,
) -> Result<reqwest::Response, GitHubError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let header_u64 = |name: &str| {
        response
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
    };
    let retry_after = header_u64("retry-after");
    let exhausted = header_u64("x-ratelimit-remaining") == Some(0);
    let reset = header_u64("x-ratelimit-reset");

    match status {
        StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS
            if retry_after.is_some() || exhausted =>
        {
            let seconds = retry_after
                .or_else(|| {
                    let now = u64::try_from(Utc::now().timestamp()).unwrap_or(0);
                    reset.map(|r| r.saturating_sub(now))
                })
                .unwrap_or(60);
            Err(GitHubError::RateLimited {
                retry_after: Duration::from_secs(seconds),
            })
        }
        StatusCode::UNAUTHORIZED => Err(GitHubError::AuthenticationFailed {
            message: response.text().await.unwrap_or_default(),
        }),
        StatusCode::FORBIDDEN => Err(GitHubError::Forbidden {
            message: response.text().await.unwrap_or_default(),
        }),
        StatusCode::NOT_FOUND => Err(GitHubError::NotFound {
            resource: resource.to_string(),
        }),
        s if s.is_server_error() => Err(GitHubError::ServerError {
            status: s.as_u16(),
            message: response.text().await.unwrap_or_default(),
        }),
        s => Err(GitHubError::ApiError {
            status: s.as_u16(),
            message: response.text().await.unwrap_or_default(),
        }),
    }
}

#[async_trait]
impl CredentialProvider for GitHubAppClient {
    async fn installation_token(
        &self,
        owner: &OrganizationLogin,
    ) -> Result<InstallationToken, CredentialError> {
        let exchange = |e: GitHubError| CredentialError::Exchange {
            owner: owner.clone(),
            message: e.to_string(),
        };

        // A 404 means "not installed" only for the installation lookup.
        let id = self.installation_id(owner).await.map_err(|e| match e {
            GitHubError::NotFound { .. } => CredentialError::NotInstalled {
                owner: owner.clone(),
            },
            other => exchange(other),
        })?;
        let token = self
            .create_installation_token(id)
            .await
            .map_err(exchange)?;
        info!(%owner, installation_id = %id, expires_at = %token.expires_at, "Minted installation token");
        Ok(token)
    }

    async fn revoke(&self, token: &InstallationToken) -> Result<(), CredentialError> {
        self.revoke_installation_token(token)
            .await
            .map_err(|e| CredentialError::Revocation {
                message: e.to_string(),
            })?;
        debug!("Revoked installation token");
        Ok(())
    }
}

#[async_trait]
impl ChangedFileSource for GitHubAppClient {
    async fn pull_request_files(
        &self,
        repository: &RepositoryRef,
        number: PullRequestNumber,
    ) -> Result<Vec<FilePath>, ChangedFilesError> {
        let failed = |message: String| ChangedFilesError {
            repository: repository.id().to_string(),
            pull_request: number,
            message,
        };

        let token = self
            .installation_token(&repository.owner)
            .await
            .map_err(|e| failed(e.to_string()))?;
        let listed = self
            .list_pull_request_files(repository, number, &token)
            .await;
        if let Err(e) = self.revoke(&token).await {
            warn!(error = %e, "Installation token revocation failed");
        }

        listed.map_err(|e| failed(e.to_string()))
    }
}
