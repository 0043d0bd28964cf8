use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use super::api::{
    DecryptRequest, DecryptResponse, EncryptRequest, EncryptResponse, ErrorResponse,
    GenerateKeysResponse,
};
use super::CryptoGateway;
use crate::error::GatewayError;
use crate::settings::GatewaySettings;

/// reqwest-backed client for the crypto service.
#[derive(Clone)]
pub struct HttpGateway {
    client: reqwest::Client,
    base_url: String,
}

impl HttpGateway {
    pub fn new(config: &GatewaySettings) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| GatewayError::BackendUnavailable(format!("http client: {e}")))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "gateway request");
        let res = self.client.post(url).json(body).send().await?;
        let status = res.status();
        if status.is_success() {
            return Ok(res.json::<R>().await?);
        }
        let text = res.text().await.unwrap_or_default();
        match serde_json::from_str::<ErrorResponse>(&text) {
            Ok(err) => Err(anyhow!("{path} failed with status {status}: {}", err.error)),
            Err(_) => Err(anyhow!("{path} failed with status {status}")),
        }
    }
}

#[async_trait]
impl CryptoGateway for HttpGateway {
    async fn generate_keys(&self) -> Result<GenerateKeysResponse, GatewayError> {
        self.post("/generate_keys", &serde_json::json!({}))
            .await
            .map_err(|e| GatewayError::BackendUnavailable(format!("{e:#}")))
    }

    async fn encrypt(&self, request: &EncryptRequest) -> Result<EncryptResponse, GatewayError> {
        self.post("/encrypt", request)
            .await
            .map_err(|e| GatewayError::EncryptionFailed(format!("{e:#}")))
    }

    async fn decrypt(&self, request: &DecryptRequest) -> Result<DecryptResponse, GatewayError> {
        self.post("/decrypt", request)
            .await
            .map_err(|e| GatewayError::DecryptionFailed(format!("{e:#}")))
    }
}
