use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, StatusCode};

/// Supplies the raw document text for a source. `Ok(None)` means the
/// document is not available right now; callers skip the source for the
/// cycle rather than treating it as an error.
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    async fn fetch_document(&self, source_id: &str) -> Result<Option<String>, FetchError>;
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("http transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected status {status} from {url}")]
    Status { status: StatusCode, url: String },
}

const GITHUB_API_BASE: &str = "https://api.github.com";
const RAW_MEDIA_TYPE: &str = "application/vnd.github.raw+json";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetches a repository's README through the source-control API. Public
/// boards need no token; a token raises the rate limit.
pub struct GithubReadmeFetcher {
    client: reqwest::Client,
    token: Option<String>,
}

impl GithubReadmeFetcher {
    pub fn new(token: Option<String>) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("postwatch/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, token })
    }
}

#[async_trait]
impl DocumentFetcher for GithubReadmeFetcher {
    async fn fetch_document(&self, source_id: &str) -> Result<Option<String>, FetchError> {
        let url = format!("{GITHUB_API_BASE}/repos/{source_id}/readme");
        let mut request = self
            .client
            .get(&url)
            .header(header::ACCEPT, RAW_MEDIA_TYPE);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(FetchError::Status {
                status: response.status(),
                url,
            });
        }

        Ok(Some(response.text().await?))
    }
}
