/// Config file loader with validation.
///
/// Reads `walletgate.yaml`, applies field defaults, and rejects configs that
/// would make the handshake misbehave at runtime (zero intervals, relative
/// URLs, a failure set that overlaps the acceptance statuses).
use std::collections::HashSet;
use std::path::Path;

use url::Url;

use crate::config::WalletGateConfig;
use crate::errors::WalletGateError;
use crate::model::TxStatus;

/// Loads and validates [`WalletGateConfig`].
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load and validate a config file.
    pub fn load(path: &Path) -> Result<WalletGateConfig, WalletGateError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            WalletGateError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        let config: WalletGateConfig = serde_yaml::from_str(&content).map_err(|e| {
            WalletGateError::Config(format!("failed to parse {}: {e}", path.display()))
        })?;
        Self::validate(&config)?;
        tracing::info!(path = %path.display(), network = %config.network, "loaded walletgate config");
        Ok(config)
    }

    /// Parse and validate inline YAML.
    pub fn parse(content: &str) -> Result<WalletGateConfig, WalletGateError> {
        let config: WalletGateConfig = serde_yaml::from_str(content)
            .map_err(|e| WalletGateError::Config(format!("failed to parse config: {e}")))?;
        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate the config for internal consistency.
    ///
    /// Checks:
    /// - `api_base_url` and `app_origin` are absolute http(s) URLs
    /// - poll intervals are positive
    /// - `approval_timeout_secs`, when present, is positive
    /// - `failure_statuses` has no duplicates and never names `BROADCASTED` or `SUCCESS`
    /// - HTTP timeouts are positive
    pub fn validate(config: &WalletGateConfig) -> Result<(), WalletGateError> {
        validate_http_url("api_base_url", &config.api_base_url)?;
        validate_http_url("app_origin", &config.app_origin)?;

        if config.status_poll_interval_ms == 0 {
            return Err(WalletGateError::Config(
                "status_poll_interval_ms must be positive (got 0)".to_string(),
            ));
        }
        if config.signal_poll_interval_ms == 0 {
            return Err(WalletGateError::Config(
                "signal_poll_interval_ms must be positive (got 0)".to_string(),
            ));
        }
        if config.approval_timeout_secs == Some(0) {
            return Err(WalletGateError::Config(
                "approval_timeout_secs must be positive when set (got 0)".to_string(),
            ));
        }
        if config.http.connect_timeout_secs == 0 || config.http.read_timeout_secs == 0 {
            return Err(WalletGateError::Config(
                "http timeouts must be positive".to_string(),
            ));
        }

        let mut seen: HashSet<&TxStatus> = HashSet::new();
        for status in &config.failure_statuses {
            if matches!(status, TxStatus::Broadcasted | TxStatus::Success) {
                return Err(WalletGateError::Config(format!(
                    "failure_statuses must not contain acceptance status '{status}'"
                )));
            }
            if !seen.insert(status) {
                return Err(WalletGateError::Config(format!(
                    "duplicate status '{status}' in failure_statuses"
                )));
            }
        }

        Ok(())
    }
}

/// Validate that `value` parses as an absolute http or https URL.
fn validate_http_url(field: &str, value: &str) -> Result<(), WalletGateError> {
    let url = Url::parse(value)
        .map_err(|e| WalletGateError::Config(format!("invalid {field} '{value}': {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(WalletGateError::Config(format!(
            "invalid {field} '{value}': unsupported scheme '{other}' (expected 'http' or 'https')"
        ))),
    }
}
