//! HTTP client for the marketplace backend writes.

use reqwest::multipart;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Serialize;

use async_trait::async_trait;

use crate::config::WizardConfig;
use crate::error::ApiError;

use super::{
    CompanyCreated, CompanyPayload, GigCreated, GigPayload, JobCreated, JobPayload,
    MarketplaceApi,
};

/// Marketplace backend client. A company with a logo attachment goes out as
/// multipart; everything else is plain JSON.
pub struct HttpMarketplace {
    client: reqwest::Client,
    base_url: String,
    token: Option<SecretString>,
}

impl HttpMarketplace {
    pub fn new(config: &WizardConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            token: config.api_token.clone(),
        }
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self.client.post(format!("{}/{path}", self.base_url));
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token.expose_secret());
        }
        builder
    }

    async fn send<R: DeserializeOwned>(
        &self,
        endpoint: &str,
        builder: reqwest::RequestBuilder,
    ) -> Result<R, ApiError> {
        let response = builder.send().await.map_err(|e| ApiError::Network {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                message,
            });
        }

        response.json().await.map_err(|e| ApiError::Network {
            endpoint: endpoint.to_string(),
            reason: format!("unreadable response body: {e}"),
        })
    }

    async fn post_json<P: Serialize, R: DeserializeOwned>(
        &self,
        endpoint: &str,
        path: &str,
        payload: &P,
    ) -> Result<R, ApiError> {
        self.send(endpoint, self.post(path).json(payload)).await
    }
}

#[async_trait]
impl MarketplaceApi for HttpMarketplace {
    async fn create_company(
        &self,
        payload: &CompanyPayload,
    ) -> Result<CompanyCreated, ApiError> {
        let endpoint = "create-company";
        match &payload.logo_upload {
            None => self.post_json(endpoint, "companies", payload).await,
            Some(upload) => {
                let json = serde_json::to_string(payload).map_err(|e| ApiError::Network {
                    endpoint: endpoint.to_string(),
                    reason: format!("payload encoding: {e}"),
                })?;
                let form = multipart::Form::new()
                    .text("payload", json)
                    .part(
                        "logo",
                        multipart::Part::bytes(upload.bytes.clone())
                            .file_name(upload.file_name.clone()),
                    );
                self.send(endpoint, self.post("companies").multipart(form)).await
            }
        }
    }

    async fn create_job(&self, payload: &JobPayload) -> Result<JobCreated, ApiError> {
        self.post_json("create-job", "jobs", payload).await
    }

    async fn create_gig(&self, payload: &GigPayload) -> Result<GigCreated, ApiError> {
        self.post_json("create-gig", "gigs", payload).await
    }
}
