use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::debug;

use crate::errors::{FetchError, FetchResult};

/// Source of raw service directory documents
#[async_trait]
pub trait ServiceDirectoryClient: Send + Sync {
    /// GET `url` and return the body of a 200 response
    async fn fetch(&self, url: &str) -> FetchResult<Vec<u8>>;
}

/// [`ServiceDirectoryClient`] backed by reqwest.
///
/// One request per call, no retries and no timeout beyond the client's own.
#[derive(Debug, Clone, Default)]
pub struct HttpServiceDirectoryClient {
    client: Client,
}

impl HttpServiceDirectoryClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ServiceDirectoryClient for HttpServiceDirectoryClient {
    async fn fetch(&self, url: &str) -> FetchResult<Vec<u8>> {
        debug!("Fetching service directory: {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })?;

        if response.status() != StatusCode::OK {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|source| FetchError::Io {
            url: url.to_string(),
            source,
        })?;

        debug!("Fetched {} bytes from {}", body.len(), url);
        Ok(body.to_vec())
    }
}
