/// Configuration types for walletgate, parsed from `walletgate.yaml`.
///
/// ```yaml
/// network: testnet
/// api_base_url: https://api.wallet.example/v3
/// app_origin: https://app.example
/// callback_path: /oauth/callback
/// loading_url: https://app.example/loading
/// approval_timeout_secs: 600
/// status_poll_interval_ms: 1000
/// signal_poll_interval_ms: 250
/// settle_delay_secs: 15
/// failure_statuses: [FAILED, REJECTED]
/// http:
///   connect_timeout_secs: 10
///   read_timeout_secs: 30
/// ```
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::model::{NetworkMode, StatusPolicy, TxStatus};

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletGateConfig {
    /// `"testnet"` selects the test network; anything else selects mainnet.
    #[serde(default = "default_network")]
    pub network: String,
    /// Base URL of the approval service API.
    pub api_base_url: String,
    /// Origin of the calling application; the callback URL is derived from it.
    pub app_origin: String,
    /// Path appended to `app_origin` to form the callback URL.
    #[serde(default = "default_callback_path")]
    pub callback_path: String,
    /// Placeholder page the approval surface shows before the approval URL is known.
    #[serde(default = "default_loading_url")]
    pub loading_url: String,
    /// Upper bound on the wait for the approval surface. Absent means unbounded.
    #[serde(default)]
    pub approval_timeout_secs: Option<u64>,
    /// Interval between transaction status reads.
    #[serde(default = "default_status_poll_interval_ms")]
    pub status_poll_interval_ms: u64,
    /// Interval between signaling channel re-reads.
    #[serde(default = "default_signal_poll_interval_ms")]
    pub signal_poll_interval_ms: u64,
    /// Delay after finality before the receipt is returned.
    #[serde(default = "default_settle_delay_secs")]
    pub settle_delay_secs: u64,
    /// Statuses that end a status wait with a failure. Empty by default.
    #[serde(default)]
    pub failure_statuses: Vec<TxStatus>,
    /// HTTP client settings.
    #[serde(default)]
    pub http: HttpConfig,
}

/// HTTP client timeouts for the approval service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub connect_timeout_secs: u64,
    pub read_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 10,
            read_timeout_secs: 30,
        }
    }
}

fn default_network() -> String {
    "mainnet".to_string()
}

fn default_callback_path() -> String {
    "/oauth/callback".to_string()
}

fn default_loading_url() -> String {
    "about:blank".to_string()
}

fn default_status_poll_interval_ms() -> u64 {
    1000
}

fn default_signal_poll_interval_ms() -> u64 {
    250
}

fn default_settle_delay_secs() -> u64 {
    15
}

impl WalletGateConfig {
    /// Minimal config with every optional field at its default.
    pub fn new(api_base_url: impl Into<String>, app_origin: impl Into<String>) -> Self {
        Self {
            network: default_network(),
            api_base_url: api_base_url.into(),
            app_origin: app_origin.into(),
            callback_path: default_callback_path(),
            loading_url: default_loading_url(),
            approval_timeout_secs: None,
            status_poll_interval_ms: default_status_poll_interval_ms(),
            signal_poll_interval_ms: default_signal_poll_interval_ms(),
            settle_delay_secs: default_settle_delay_secs(),
            failure_statuses: Vec::new(),
            http: HttpConfig::default(),
        }
    }

    pub fn network_mode(&self) -> NetworkMode {
        NetworkMode::from_mode(&self.network)
    }

    /// `{app_origin}{callback_path}` with exactly one slash at the join.
    pub fn callback_url(&self) -> String {
        let origin = self.app_origin.trim_end_matches('/');
        let path = self.callback_path.trim_start_matches('/');
        format!("{origin}/{path}")
    }

    pub fn approval_timeout(&self) -> Option<Duration> {
        self.approval_timeout_secs.map(Duration::from_secs)
    }

    pub fn status_poll_interval(&self) -> Duration {
        Duration::from_millis(self.status_poll_interval_ms)
    }

    pub fn signal_poll_interval(&self) -> Duration {
        Duration::from_millis(self.signal_poll_interval_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_secs(self.settle_delay_secs)
    }

    /// Policy for the broadcast stage: accept `BROADCASTED`/`SUCCESS`.
    pub fn broadcast_policy(&self) -> StatusPolicy {
        StatusPolicy::default().failing_on(self.failure_statuses.clone())
    }

    /// Policy for the finality stage: accept `SUCCESS` only.
    pub fn finality_policy(&self) -> StatusPolicy {
        StatusPolicy::finality().failing_on(self.failure_statuses.clone())
    }
}
