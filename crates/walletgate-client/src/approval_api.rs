//! HTTP client for the wallet-authorization service.
//!
//! Implements [`ApprovalApi`] over JSON/HTTP with bearer authentication:
//! - `POST {base}/approvals` creates a pending approval
//! - `POST {base}/transactions/queue/approvals` exchanges an approval token for a queue id
//! - `GET {base}/transactions/queue/{queue_id}` reads a queued transaction's status
//!
//! Successful bodies may be wrapped as `{"data": ...}` or returned bare.
//! Error bodies are reduced to the most specific message they carry.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use walletgate_types::errors::WalletGateError;
use walletgate_types::traits::ApprovalApi;
use walletgate_types::{
    ApprovalHandle, ApprovalRequest, QueueApproval, QueueId, TransactionStatusRecord,
    WalletGateConfig,
};

/// `reqwest`-backed approval service client.
pub struct HttpApprovalApi {
    client: Client,
    api_base: Url,
}

// -- Wire types --

/// Body of the create-tx-queue-approval request.
#[derive(Debug, Serialize)]
struct TxQueueApprovalBody<'a> {
    approval_token: &'a str,
}

/// Success body, enveloped or bare.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Envelope<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> Envelope<T> {
    fn into_inner(self) -> T {
        match self {
            Envelope::Wrapped { data } => data,
            Envelope::Bare(inner) => inner,
        }
    }
}

/// Error body returned by the service.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<ErrorDetail>,
    #[serde(default)]
    message: Option<String>,
}

/// `error` may be an object with a message or a plain string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorDetail {
    Nested { message: String },
    Text(String),
}

/// Pick the most specific message from an error response.
///
/// Order: `error.message`, `error` (string), top-level `message`, raw body,
/// then the HTTP reason phrase.
fn provider_message(status: reqwest::StatusCode, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        match parsed.error {
            Some(ErrorDetail::Nested { message }) if !message.is_empty() => return message,
            Some(ErrorDetail::Text(text)) if !text.is_empty() => return text,
            _ => {}
        }
        if let Some(message) = parsed.message.filter(|m| !m.is_empty()) {
            return message;
        }
    }

    let trimmed = body.trim();
    if !trimmed.is_empty() {
        return trimmed.to_string();
    }
    format!(
        "HTTP {}",
        status
            .canonical_reason()
            .map(|r| format!("{} {r}", status.as_u16()))
            .unwrap_or_else(|| status.as_u16().to_string())
    )
}

impl HttpApprovalApi {
    /// Create a client for `api_base` with the given timeouts.
    pub fn new(
        api_base: &str,
        connect_timeout: Duration,
        read_timeout: Duration,
    ) -> Result<Self, WalletGateError> {
        let api_base = Url::parse(api_base)
            .map_err(|e| WalletGateError::Config(format!("invalid api base '{api_base}': {e}")))?;
        if api_base.cannot_be_a_base() {
            return Err(WalletGateError::Config(format!(
                "api base '{api_base}' cannot carry a path"
            )));
        }

        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(read_timeout)
            .build()
            .map_err(|e| WalletGateError::Internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, api_base })
    }

    /// Create a client from the `api_base_url` and `http` sections of the config.
    pub fn from_config(config: &WalletGateConfig) -> Result<Self, WalletGateError> {
        Self::new(
            &config.api_base_url,
            Duration::from_secs(config.http.connect_timeout_secs),
            Duration::from_secs(config.http.read_timeout_secs),
        )
    }

    /// Append path segments to the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.api_base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Send a request and decode a (possibly enveloped) JSON body.
    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        access_token: &str,
    ) -> Result<T, WalletGateError> {
        let response = request
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| WalletGateError::provider(None, format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = provider_message(status, &body);
            tracing::debug!(status = status.as_u16(), %message, "approval service returned an error");
            return Err(WalletGateError::provider(Some(status.as_u16()), message));
        }

        let body = response.text().await.map_err(|e| {
            WalletGateError::provider(Some(status.as_u16()), format!("failed to read response: {e}"))
        })?;
        let envelope: Envelope<T> = serde_json::from_str(&body).map_err(|e| {
            WalletGateError::provider(
                Some(status.as_u16()),
                format!("failed to parse response: {e}"),
            )
        })?;
        Ok(envelope.into_inner())
    }
}

#[async_trait]
impl ApprovalApi for HttpApprovalApi {
    async fn create_approval(
        &self,
        access_token: &str,
        request: &ApprovalRequest,
    ) -> Result<ApprovalHandle, WalletGateError> {
        let url = self.endpoint(&["approvals"]);
        tracing::debug!(%url, chain = %request.chain, "creating approval");
        self.send(self.client.post(url).json(request), access_token)
            .await
    }

    async fn create_tx_queue_approval(
        &self,
        access_token: &str,
        approval_token: &str,
    ) -> Result<QueueApproval, WalletGateError> {
        let url = self.endpoint(&["transactions", "queue", "approvals"]);
        self.send(
            self.client
                .post(url)
                .json(&TxQueueApprovalBody { approval_token }),
            access_token,
        )
        .await
    }

    async fn get_tx_queue_status(
        &self,
        access_token: &str,
        queue_id: &QueueId,
    ) -> Result<TransactionStatusRecord, WalletGateError> {
        let url = self.endpoint(&["transactions", "queue", queue_id.as_str()]);
        self.send(self.client.get(url), access_token).await
    }
}
