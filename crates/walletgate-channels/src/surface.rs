//! Approval surface backed by a companion process.
//!
//! On targets without a browser window to open, the approval page is shown by
//! a separate program (a webview shell, a deep-link launcher). The program is
//! started with the first URL as its last argument and receives every later
//! navigation as one line on stdin. Exiting the program closes the surface.

use std::collections::HashMap;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, Command};
use tokio::sync::Mutex;

use walletgate_types::errors::WalletGateError;
use walletgate_types::model::SurfaceHandle;
use walletgate_types::traits::ApprovalSurface;

/// Spawns one companion process per opened surface.
pub struct CompanionProcessSurface {
    program: String,
    args: Vec<String>,
    next_id: AtomicU64,
    children: Mutex<HashMap<u64, Child>>,
}

impl CompanionProcessSurface {
    /// `program` is run as `program args... <url>`.
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            next_id: AtomicU64::new(1),
            children: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl ApprovalSurface for CompanionProcessSurface {
    async fn open(&self, url: &str) -> Result<SurfaceHandle, WalletGateError> {
        let child = Command::new(&self.program)
            .args(&self.args)
            .arg(url)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                WalletGateError::SurfaceUnavailable(format!(
                    "failed to spawn '{}': {e}",
                    self.program
                ))
            })?;

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(surface = id, pid = ?child.id(), "opened companion surface");
        self.children.lock().await.insert(id, child);
        Ok(SurfaceHandle(id))
    }

    async fn navigate(&self, handle: SurfaceHandle, url: &str) -> Result<(), WalletGateError> {
        let mut children = self.children.lock().await;
        let child = children.get_mut(&handle.0).ok_or_else(|| {
            WalletGateError::SurfaceUnavailable(format!("surface {} is not open", handle.0))
        })?;

        if let Ok(Some(status)) = child.try_wait() {
            return Err(WalletGateError::SurfaceUnavailable(format!(
                "surface {} exited ({status}) before navigation",
                handle.0
            )));
        }

        let stdin = child.stdin.as_mut().ok_or_else(|| {
            WalletGateError::SurfaceUnavailable(format!("surface {} has no input", handle.0))
        })?;
        let line = format!("{url}\n");
        stdin
            .write_all(line.as_bytes())
            .await
            .map_err(|e| WalletGateError::SurfaceUnavailable(format!("navigation failed: {e}")))?;
        stdin
            .flush()
            .await
            .map_err(|e| WalletGateError::SurfaceUnavailable(format!("navigation failed: {e}")))
    }

    async fn is_closed(&self, handle: SurfaceHandle) -> bool {
        let mut children = self.children.lock().await;
        match children.get_mut(&handle.0) {
            Some(child) => !matches!(child.try_wait(), Ok(None)),
            None => true,
        }
    }

    async fn close(&self, handle: SurfaceHandle) -> Result<(), WalletGateError> {
        let child = self.children.lock().await.remove(&handle.0);
        if let Some(mut child) = child {
            if let Ok(None) = child.try_wait() {
                child.start_kill().map_err(|e| {
                    WalletGateError::SurfaceUnavailable(format!(
                        "failed to close surface {}: {e}",
                        handle.0
                    ))
                })?;
            }
            tracing::debug!(surface = handle.0, "closed companion surface");
        }
        Ok(())
    }
}
