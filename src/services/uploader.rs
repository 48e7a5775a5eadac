use crate::error::{NotebookImageError, Result};
use crate::types::UploaderConfig;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

/// Stores one base64 payload at a remote path and returns a URL it can be fetched from.
#[async_trait]
pub trait ImageUploader: Send + Sync {
    async fn upload(&self, payload: &str, destination: &str) -> Result<String>;
}

#[derive(Debug, Serialize)]
struct UploadRequest<'a> {
    message: String,
    content: &'a str,
    branch: &'a str,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    content: Option<UploadedContent>,
}

#[derive(Debug, Deserialize)]
struct UploadedContent {
    download_url: Option<String>,
}

/// Commits images through the GitHub contents API.
pub struct GitHubUploader {
    client: reqwest::Client,
    config: UploaderConfig,
}

impl GitHubUploader {
    pub fn new(config: UploaderConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("nb-images/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Self::with_client(config, client)
    }

    pub fn with_client(config: UploaderConfig, client: reqwest::Client) -> Result<Self> {
        Url::parse(&config.api_base)?;
        Ok(Self { client, config })
    }

    /// Read the API token from `var`. Missing or blank is a configuration error.
    pub fn token_from_env(var: &str) -> Result<String> {
        match std::env::var(var) {
            Ok(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
            _ => Err(NotebookImageError::MissingCredential {
                var: var.to_string(),
            }),
        }
    }

    pub fn contents_url(&self, destination: &str) -> Result<Url> {
        let url = format!(
            "{}/repos/{}/{}/contents/{}",
            self.config.api_base.trim_end_matches('/'),
            self.config.owner,
            self.config.repo,
            destination.trim_start_matches('/')
        );
        Ok(Url::parse(&url)?)
    }

    fn parse_download_url(body: &str) -> Result<String> {
        let response: UploadResponse = serde_json::from_str(body)?;
        response
            .content
            .and_then(|c| c.download_url)
            .ok_or_else(|| NotebookImageError::MalformedResponse {
                reason: "response has no content.download_url".to_string(),
            })
    }
}

#[async_trait]
impl ImageUploader for GitHubUploader {
    async fn upload(&self, payload: &str, destination: &str) -> Result<String> {
        let url = self.contents_url(destination)?;
        debug!("PUT {}", url);

        let body = UploadRequest {
            message: format!("Upload image: {}", destination),
            content: payload,
            branch: &self.config.branch,
        };

        let response = self
            .client
            .put(url)
            .header("Authorization", format!("token {}", self.config.token))
            .header("Accept", "application/vnd.github.v3+json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if status != StatusCode::CREATED {
            return Err(NotebookImageError::UploadRejected {
                status: status.as_u16(),
                body: text,
            });
        }

        let download_url = Self::parse_download_url(&text)?;
        info!("Uploaded {} -> {}", destination, download_url);
        Ok(download_url)
    }
}
