use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

use super::{LedgerClient, LedgerRecord};
use crate::error::LedgerError;

/// Talks to the ledger relay over HTTP. The relay owns the wallet, builds the
/// memo transaction and answers with its signature.
#[derive(Clone)]
pub struct HttpLedgerClient {
    client: Client,
    base_url: String,
}

#[derive(Deserialize)]
struct SubmitResponse {
    signature: String,
}

impl HttpLedgerClient {
    /// Fails only if the HTTP client cannot be built (e.g. no TLS backend).
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout) // Network-level cap; the pool enforces its own too
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl LedgerClient for HttpLedgerClient {
    async fn submit(&self, record: &LedgerRecord) -> Result<String, LedgerError> {
        let response = self
            .client
            .post(format!("{}/records", self.base_url))
            .json(record)
            .send()
            .await
            .map_err(|e| LedgerError::Unavailable(e.to_string()))?;

        let status = response.status();
        if status.is_client_error() && status != StatusCode::TOO_MANY_REQUESTS {
            let body = response.text().await.unwrap_or_default();
            return Err(LedgerError::Rejected(format!("{}: {}", status, body)));
        }
        if !status.is_success() {
            return Err(LedgerError::Unavailable(format!("relay returned {}", status)));
        }

        let parsed: SubmitResponse = response
            .json()
            .await
            .map_err(|e| LedgerError::Unavailable(format!("unreadable relay response: {}", e)))?;
        Ok(parsed.signature)
    }
}
