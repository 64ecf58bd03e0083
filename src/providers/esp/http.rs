//! HTTP send provider implementation.
//!
//! Talks to a hosted ESP over its REST batch API: one POST per admitted
//! batch carrying the lead payloads and the advisory per-account
//! allocations. Authentication is a bearer token; responses are typed JSON.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE, RETRY_AFTER};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use super::{AccountUsage, BatchReceipt, EspError, Result, SendProvider};
use crate::domain::{AccountId, Lead};
use crate::services::Allocation;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Request body for the batch upload endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BatchUploadRequest<'a> {
    allocations: Vec<AllocationPayload<'a>>,
    leads: Vec<LeadPayload<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AllocationPayload<'a> {
    account_id: &'a str,
    account_email: &'a str,
    count: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LeadPayload<'a> {
    lead_id: &'a str,
    email: &'a str,
}

/// Response body from the batch upload endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BatchUploadResponse {
    uploaded: u32,
    skipped: Option<u32>,
    per_account: Option<Vec<PerAccountResponse>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PerAccountResponse {
    account_id: String,
    sent: u32,
}

/// Send provider backed by a hosted ESP's REST API.
pub struct HttpEspProvider {
    name: String,
    client: reqwest::Client,
    base_url: Url,
    api_key: String,
}

impl HttpEspProvider {
    /// Creates a provider against a validated base endpoint.
    pub fn new(
        name: impl Into<String>,
        base_url: &str,
        api_key: impl Into<String>,
    ) -> Result<Self> {
        Self::with_timeout(name, base_url, api_key, DEFAULT_TIMEOUT)
    }

    /// Creates a provider from persisted settings.
    pub fn from_settings(settings: &crate::config::EspSettings) -> Result<Self> {
        Self::with_timeout(
            settings.name.clone(),
            &settings.base_url,
            settings.api_key.clone(),
            Duration::from_secs(settings.timeout_secs),
        )
    }

    /// Creates a provider with a caller-supplied request timeout.
    pub fn with_timeout(
        name: impl Into<String>,
        base_url: &str,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| EspError::InvalidRequest(format!("invalid base url: {}", e)))?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EspError::Internal(format!("http client: {}", e)))?;

        Ok(Self {
            name: name.into(),
            client,
            base_url,
            api_key: api_key.into(),
        })
    }

    fn auth_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.api_key))
                .map_err(|e| EspError::Internal(format!("invalid header: {}", e)))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    fn batch_url(&self) -> Result<Url> {
        self.base_url
            .join("v1/batches")
            .map_err(|e| EspError::Internal(format!("invalid endpoint: {}", e)))
    }
}

#[async_trait]
impl SendProvider for HttpEspProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send_batch(&self, allocations: &[Allocation], leads: &[Lead]) -> Result<BatchReceipt> {
        let body = BatchUploadRequest {
            allocations: allocations
                .iter()
                .map(|a| AllocationPayload {
                    account_id: &a.account_id.0,
                    account_email: &a.account_email,
                    count: a.count,
                })
                .collect(),
            leads: leads
                .iter()
                .map(|l| LeadPayload {
                    lead_id: &l.id.0,
                    email: &l.email,
                })
                .collect(),
        };

        debug!(
            provider = %self.name,
            leads = leads.len(),
            accounts = allocations.len(),
            "uploading batch"
        );

        let response = self
            .client
            .post(self.batch_url()?)
            .headers(self.auth_headers()?)
            .json(&body)
            .send()
            .await
            .map_err(|e| EspError::Connection(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok());
            let detail = response.text().await.unwrap_or_default();

            return Err(
                if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                    EspError::Authentication(format!("{}: {}", status, detail))
                } else if status == StatusCode::TOO_MANY_REQUESTS {
                    EspError::RateLimited {
                        retry_after_secs: retry_after,
                    }
                } else if status.is_client_error() {
                    EspError::InvalidRequest(format!("{}: {}", status, detail))
                } else {
                    EspError::Provider(format!("{}: {}", status, detail))
                },
            );
        }

        let parsed: BatchUploadResponse = response
            .json()
            .await
            .map_err(|e| EspError::Internal(format!("parse batch response: {}", e)))?;

        Ok(BatchReceipt {
            uploaded: parsed.uploaded,
            skipped: parsed.skipped.unwrap_or(0),
            per_account: parsed.per_account.map(|entries| {
                entries
                    .into_iter()
                    .map(|e| AccountUsage {
                        account_id: AccountId(e.account_id),
                        sent: e.sent,
                    })
                    .collect()
            }),
        })
    }
}
