use crate::error::FetchError;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

const MAX_RESPONSE_SIZE: usize = 10 * 1024 * 1024;

/// Anything able to GET a catalog URL and hand back the body.
///
/// The pipeline only talks to the network through this trait, so tests can
/// swap in an in-memory catalog.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .user_agent("Mozilla/5.0 (compatible; subcrawl/0.1)")
            .pool_max_idle_per_host(10)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpClient {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpError(status.as_u16()));
        }

        if let Some(content_type) = response.headers().get("content-type") {
            let content_type_str = content_type.to_str().unwrap_or("");
            if !content_type_str.contains("json") {
                return Err(FetchError::InvalidContentType(content_type_str.to_string()));
            }
        }

        if let Some(content_length) = response.content_length()
            && content_length > MAX_RESPONSE_SIZE as u64
        {
            return Err(FetchError::TooLarge(content_length));
        }

        let body = response.text().await?;
        if body.len() > MAX_RESPONSE_SIZE {
            return Err(FetchError::TooLarge(body.len() as u64));
        }

        Ok(body)
    }
}
