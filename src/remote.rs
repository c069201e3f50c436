use crate::error::{RepoLikesError, Result};
use crate::types::{LikeResponse, RemoteRepository, RepositoryId};
use async_trait::async_trait;
use reqwest::{Client, Method, Response};
use std::time::Duration;
use tracing::debug;
use url::Url;

pub const DEFAULT_API_URL: &str = "http://localhost:3333";
const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Operations the list controller needs from the repository service
#[async_trait]
pub trait RepositoryApi: Send + Sync {
    async fn list_repositories(&self) -> Result<Vec<RemoteRepository>>;

    /// Register one like and return the new authoritative count
    async fn like_repository(&self, id: &RepositoryId) -> Result<LikeResponse>;
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub token: Option<String>,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            token: None,
            timeout: Duration::from_secs(30),
        }
    }
}

pub struct HttpRepositoryClient {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl HttpRepositoryClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let mut base_url = Url::parse(&config.base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(RepoLikesError::InvalidBaseUrl(config.base_url));
        }
        // Keep any path prefix when joining endpoint segments
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .build()?;

        Ok(HttpRepositoryClient {
            client,
            base_url,
            token: config.token,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| RepoLikesError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn make_request(&self, method: Method, url: Url) -> Result<Response> {
        debug!(%method, %url, "Sending request");

        let mut request = self
            .client
            .request(method, url.clone())
            .header("Accept", "application/json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;

        match response.status() {
            status if status.is_success() => Ok(response),
            reqwest::StatusCode::NOT_FOUND => {
                Err(RepoLikesError::NotFound(format!("Resource not found: {}", url)))
            }
            status => {
                let error_text = response.text().await.unwrap_or_default();
                Err(RepoLikesError::ApiError(format!(
                    "API request failed with status {}: {}",
                    status, error_text
                )))
            }
        }
    }
}

#[async_trait]
impl RepositoryApi for HttpRepositoryClient {
    async fn list_repositories(&self) -> Result<Vec<RemoteRepository>> {
        let url = self.endpoint(&["repositories"])?;
        let response = self.make_request(Method::GET, url).await?;
        let repositories: Vec<RemoteRepository> = response.json().await?;
        debug!(count = repositories.len(), "Fetched repositories");
        Ok(repositories)
    }

    async fn like_repository(&self, id: &RepositoryId) -> Result<LikeResponse> {
        let url = self.endpoint(&["repositories", id.as_str(), "like"])?;
        let response = self.make_request(Method::POST, url).await?;
        let like: LikeResponse = response.json().await?;
        debug!(%id, likes = like.likes, "Like registered");
        Ok(like)
    }
}
