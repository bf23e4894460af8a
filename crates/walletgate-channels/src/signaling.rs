//! Signaling channel implementations.
//!
//! The approval surface writes exactly one of `TX_QUEUE_ID` or `TX_ERROR`
//! once the human step concludes; the coordinator reads and clears both.
//! Clearing an empty slot never counts as a change.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::{watch, Mutex};

use walletgate_types::errors::WalletGateError;
use walletgate_types::model::SignalKey;
use walletgate_types::traits::SignalingChannel;

// ============================================================
// In-memory
// ============================================================

/// Process-wide signaling slots with change notifications.
///
/// Share one instance (behind `Arc`) between the coordinator and whatever
/// receives the approval surface's callback.
pub struct InMemorySignalingChannel {
    slots: Mutex<HashMap<SignalKey, String>>,
    version: watch::Sender<u64>,
}

impl InMemorySignalingChannel {
    pub fn new() -> Self {
        let (version, _) = watch::channel(0);
        Self {
            slots: Mutex::new(HashMap::new()),
            version,
        }
    }

    fn bump(&self) {
        self.version.send_modify(|v| *v = v.wrapping_add(1));
    }
}

impl Default for InMemorySignalingChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SignalingChannel for InMemorySignalingChannel {
    async fn get(&self, key: SignalKey) -> Result<Option<String>, WalletGateError> {
        Ok(self.slots.lock().await.get(&key).cloned())
    }

    async fn set(&self, key: SignalKey, value: &str) -> Result<(), WalletGateError> {
        self.slots.lock().await.insert(key, value.to_string());
        self.bump();
        Ok(())
    }

    async fn clear(&self, key: SignalKey) -> Result<(), WalletGateError> {
        let removed = self.slots.lock().await.remove(&key);
        if removed.is_some() {
            self.bump();
        }
        Ok(())
    }

    fn subscribe(&self) -> Option<watch::Receiver<u64>> {
        Some(self.version.subscribe())
    }
}

// ============================================================
// File-backed
// ============================================================

/// Signaling slots stored as a flat JSON object in a file.
///
/// Lets a separate process (a companion approval window, a deep-link
/// handler) report back by writing `{"TX_QUEUE_ID": "..."}`. Writes go to a
/// temporary sibling file and are renamed into place. There is no change
/// notification; the coordinator re-reads at its poll interval.
pub struct FileSignalingChannel {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileSignalingChannel {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    async fn read_map(&self) -> Result<serde_json::Map<String, serde_json::Value>, WalletGateError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(serde_json::Map::new())
            }
            Err(e) => {
                return Err(WalletGateError::Signaling(format!(
                    "failed to read {}: {e}",
                    self.path.display()
                )))
            }
        };
        if content.trim().is_empty() {
            return Ok(serde_json::Map::new());
        }
        serde_json::from_str(&content).map_err(|e| {
            WalletGateError::Signaling(format!("failed to parse {}: {e}", self.path.display()))
        })
    }

    async fn write_map(
        &self,
        map: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<(), WalletGateError> {
        let tmp = self.path.with_extension("tmp");
        let body = serde_json::to_vec_pretty(map)?;
        tokio::fs::write(&tmp, body).await.map_err(|e| {
            WalletGateError::Signaling(format!("failed to write {}: {e}", tmp.display()))
        })?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(|e| {
            WalletGateError::Signaling(format!(
                "failed to replace {}: {e}",
                self.path.display()
            ))
        })
    }
}

#[async_trait]
impl SignalingChannel for FileSignalingChannel {
    async fn get(&self, key: SignalKey) -> Result<Option<String>, WalletGateError> {
        let map = self.read_map().await?;
        Ok(match map.get(key.as_str()) {
            Some(serde_json::Value::String(s)) => Some(s.clone()),
            Some(serde_json::Value::Null) | None => None,
            Some(other) => Some(other.to_string()),
        })
    }

    async fn set(&self, key: SignalKey, value: &str) -> Result<(), WalletGateError> {
        let _guard = self.write_lock.lock().await;
        let mut map = self.read_map().await?;
        map.insert(
            key.as_str().to_string(),
            serde_json::Value::String(value.to_string()),
        );
        self.write_map(&map).await
    }

    async fn clear(&self, key: SignalKey) -> Result<(), WalletGateError> {
        let _guard = self.write_lock.lock().await;
        let mut map = self.read_map().await?;
        if map.remove(key.as_str()).is_none() {
            return Ok(());
        }
        self.write_map(&map).await
    }
}
