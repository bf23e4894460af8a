//! Approval request coordination.
//!
//! Opens the approval surface on a loading placeholder first, so it exists
//! while the create-approval round trip is in flight, then points it at the
//! provider's approval page and waits for the surface to report back through
//! the signaling channel.
//!
//! The wait ends when `TX_QUEUE_ID` (approved) or `TX_ERROR` (denied) is
//! populated, when the surface is closed without either, when the optional
//! timeout elapses, or when the caller cancels. Both slots are cleared on
//! every outcome so a later, unrelated approval cannot read a stale value.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use walletgate_types::errors::WalletGateError;
use walletgate_types::model::*;
use walletgate_types::traits::*;
use walletgate_types::WalletGateConfig;

/// Reason written to the error slot when the user closes the surface.
pub const SURFACE_CLOSED_REASON: &str = "approval window closed";

/// Settings for [`ApprovalRequestCoordinator`].
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Network the approval is scoped to.
    pub network: NetworkMode,
    /// Where the provider sends the user after approval.
    pub callback_url: String,
    /// Placeholder shown before the approval URL is known.
    pub loading_url: String,
    /// Re-read interval for the signaling channel.
    pub signal_poll_interval: Duration,
    /// Upper bound on the wait. `None` waits until a signal, close, or cancel.
    pub approval_timeout: Option<Duration>,
}

impl CoordinatorConfig {
    pub fn from_config(config: &WalletGateConfig) -> Self {
        Self {
            network: config.network_mode(),
            callback_url: config.callback_url(),
            loading_url: config.loading_url.clone(),
            signal_poll_interval: config.signal_poll_interval(),
            approval_timeout: config.approval_timeout(),
        }
    }
}

/// What the approval surface reported.
enum Signal {
    Approved(QueueId),
    Denied(String),
}

/// Drives one approval from surface open to queue id.
pub struct ApprovalRequestCoordinator {
    api: Arc<dyn ApprovalApi>,
    surface: Arc<dyn ApprovalSurface>,
    signals: Arc<dyn SignalingChannel>,
    config: CoordinatorConfig,
}

impl ApprovalRequestCoordinator {
    pub fn new(
        api: Arc<dyn ApprovalApi>,
        surface: Arc<dyn ApprovalSurface>,
        signals: Arc<dyn SignalingChannel>,
        config: CoordinatorConfig,
    ) -> Self {
        Self {
            api,
            surface,
            signals,
            config,
        }
    }

    /// Request approval for a contract call and wait for its queue id.
    pub async fn request_approval(
        &self,
        access_token: &str,
        contract_address: &str,
        method_name: &str,
        method_params: &[String],
    ) -> Result<QueueId, WalletGateError> {
        self.request_approval_with_cancel(
            access_token,
            contract_address,
            method_name,
            method_params,
            &CancellationToken::new(),
        )
        .await
    }

    /// [`request_approval`](Self::request_approval) with a cancellation token
    /// observed while waiting for the surface.
    pub async fn request_approval_with_cancel(
        &self,
        access_token: &str,
        contract_address: &str,
        method_name: &str,
        method_params: &[String],
        cancel: &CancellationToken,
    ) -> Result<QueueId, WalletGateError> {
        let handle = self
            .surface
            .open(&self.config.loading_url)
            .await
            .map_err(|e| WalletGateError::SurfaceUnavailable(e.detail()))?;

        let request = ApprovalRequest::contract_call(
            self.config.network,
            self.config.callback_url.clone(),
            contract_address,
            method_name,
            method_params.to_vec(),
        );

        let approval = match self.api.create_approval(access_token, &request).await {
            Ok(approval) => approval,
            Err(e) => {
                tracing::error!(error = %e, method = %method_name, "create approval failed");
                self.close_surface(handle).await;
                return Err(WalletGateError::ApprovalCreationFailed(e.detail()));
            }
        };

        if let Err(e) = self.surface.navigate(handle, &approval.approval_url).await {
            self.close_surface(handle).await;
            return Err(WalletGateError::SurfaceUnavailable(e.detail()));
        }

        tracing::info!(
            approval_id = %approval.approval_id,
            chain = %request.chain,
            description = %request.description,
            "waiting for approval"
        );

        let wait = self.wait_for_signal(handle, cancel);
        let outcome = match self.config.approval_timeout {
            Some(limit) => match tokio::time::timeout(limit, wait).await {
                Ok(outcome) => outcome,
                Err(_) => Err(WalletGateError::Timeout(format!(
                    "no approval reported within {}s",
                    limit.as_secs()
                ))),
            },
            None => wait.await,
        };

        let cleared = self.clear_signals().await;
        self.close_surface(handle).await;

        match (outcome, cleared) {
            (Ok(queue_id), Ok(())) => {
                tracing::info!(queue_id = %queue_id, "approval granted");
                Ok(queue_id)
            }
            (Ok(_), Err(e)) => Err(e),
            (Err(e), cleared) => {
                if let Err(clear_err) = cleared {
                    tracing::warn!(error = %clear_err, "failed to clear signaling channel");
                }
                Err(e)
            }
        }
    }

    /// Clear both signaling slots. Safe to call repeatedly.
    pub async fn clear_signals(&self) -> Result<(), WalletGateError> {
        self.signals.clear(SignalKey::TxQueueId).await?;
        self.signals.clear(SignalKey::TxError).await
    }

    /// Suspend until the signaling channel or the surface settles the approval.
    async fn wait_for_signal(
        &self,
        handle: SurfaceHandle,
        cancel: &CancellationToken,
    ) -> Result<QueueId, WalletGateError> {
        let mut changes = self.signals.subscribe();

        loop {
            if let Some(signal) = self.read_signal().await? {
                return signal.into_result();
            }

            if self.surface.is_closed(handle).await {
                // The surface may have written its result just before closing.
                if let Some(signal) = self.read_signal().await? {
                    return signal.into_result();
                }
                tracing::warn!("approval surface closed without reporting a result");
                self.signals
                    .set(SignalKey::TxError, SURFACE_CLOSED_REASON)
                    .await?;
                continue;
            }

            tokio::select! {
                _ = cancel.cancelled() => {
                    return Err(WalletGateError::Cancelled("approval wait cancelled".to_string()));
                }
                _ = next_change(&mut changes, self.config.signal_poll_interval) => {}
            }
        }
    }

    /// The error slot wins when both are populated. Empty values count as absent.
    async fn read_signal(&self) -> Result<Option<Signal>, WalletGateError> {
        if let Some(reason) = self
            .signals
            .get(SignalKey::TxError)
            .await?
            .filter(|reason| !reason.is_empty())
        {
            return Ok(Some(Signal::Denied(reason)));
        }
        Ok(self
            .signals
            .get(SignalKey::TxQueueId)
            .await?
            .filter(|id| !id.is_empty())
            .map(|id| Signal::Approved(QueueId(id))))
    }

    async fn close_surface(&self, handle: SurfaceHandle) {
        if let Err(e) = self.surface.close(handle).await {
            tracing::debug!(error = %e, "failed to close approval surface");
        }
    }
}

impl Signal {
    fn into_result(self) -> Result<QueueId, WalletGateError> {
        match self {
            Signal::Approved(queue_id) => Ok(queue_id),
            Signal::Denied(reason) => {
                tracing::warn!(reason = %reason, "approval denied");
                Err(WalletGateError::ApprovalDenied(reason))
            }
        }
    }
}

/// Wait for a change notification or the fallback interval, whichever is first.
///
/// A dropped notification sender disables notifications for the rest of the wait.
async fn next_change(changes: &mut Option<watch::Receiver<u64>>, fallback: Duration) {
    let sender_gone = match changes.as_mut() {
        Some(rx) => tokio::select! {
            res = rx.changed() => res.is_err(),
            _ = tokio::time::sleep(fallback) => false,
        },
        None => {
            tokio::time::sleep(fallback).await;
            false
        }
    };
    if sender_gone {
        *changes = None;
    }
}
