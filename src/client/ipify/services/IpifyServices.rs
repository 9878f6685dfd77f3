use async_trait::async_trait;

use crate::client::error::ApiError;
use crate::client::ipify::models::IpifyModels::IpLookupResponse;

/// Resolves the caller's externally visible network address.
#[async_trait]
pub trait OriginResolver: Send + Sync {
    async fn resolve(&self) -> Result<String, ApiError>;
}

pub struct IpifyResolver {
    client: reqwest::Client,
    url: String,
}

impl IpifyResolver {
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), url)
    }

    pub fn with_client(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self { client, url: url.into() }
    }
}

#[async_trait]
impl OriginResolver for IpifyResolver {
    async fn resolve(&self) -> Result<String, ApiError> {
        let res = self.client.get(&self.url).send().await?;

        if !res.status().is_success() {
            return Err(ApiError::Status(res.status()));
        }

        let bytes = res.bytes().await?;
        let parsed: IpLookupResponse = serde_json::from_slice(&bytes)?;
        Ok(parsed.ip.trim().to_string())
    }
}
