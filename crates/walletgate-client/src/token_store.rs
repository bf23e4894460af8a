//! Bearer token sources.
//!
//! Token acquisition is someone else's job; these stores only hand back a
//! token that was put there earlier. An empty token counts as absent.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::RwLock;

use walletgate_types::errors::WalletGateError;
use walletgate_types::traits::TokenStore;

/// Token held in memory, settable at runtime.
#[derive(Default)]
pub struct InMemoryTokenStore {
    token: RwLock<Option<String>>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }

    pub async fn set_token(&self, token: impl Into<String>) {
        *self.token.write().await = Some(token.into());
    }

    pub async fn clear(&self) {
        *self.token.write().await = None;
    }
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn access_token(&self) -> Result<Option<String>, WalletGateError> {
        Ok(self.token.read().await.clone().filter(|t| !t.is_empty()))
    }
}

/// Credentials file layout: `{"access_token": "...", ...}`.
#[derive(Debug, Deserialize)]
struct Credentials {
    #[serde(default)]
    access_token: Option<String>,
}

/// Token read from a JSON credentials file on every call.
///
/// A missing file means "not signed in" rather than an error, so a caller
/// sees `NotAuthenticated` instead of an I/O failure.
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn access_token(&self) -> Result<Option<String>, WalletGateError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no credentials file");
                return Ok(None);
            }
            Err(e) => {
                return Err(WalletGateError::TokenStore(format!(
                    "failed to read {}: {e}",
                    self.path.display()
                )))
            }
        };

        let credentials: Credentials = serde_json::from_str(&content).map_err(|e| {
            WalletGateError::TokenStore(format!("failed to parse {}: {e}", self.path.display()))
        })?;
        Ok(credentials.access_token.filter(|t| !t.is_empty()))
    }
}
