//! Contract-call orchestration.
//!
//! Sequences one call end to end:
//! 1. Read the access token (missing → `NotAuthenticated`, before any HTTP call)
//! 2. Coordinator: approval surface → queue id
//! 3. Poller: wait for `BROADCASTED` or `SUCCESS`
//! 4. Poller: wait for `SUCCESS`
//! 5. Settle delay, to absorb provider-side propagation lag
//! 6. Normalize the final record into a [`TransactionReceipt`]
//!
//! Every failure is logged once here and returned unchanged, so the caller
//! sees the most specific variant and message available.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use walletgate_types::errors::WalletGateError;
use walletgate_types::model::*;
use walletgate_types::traits::*;
use walletgate_types::WalletGateConfig;

use crate::coordinator::{ApprovalRequestCoordinator, CoordinatorConfig};
use crate::poller::TransactionStatusPoller;

/// All collaborators the orchestrator needs.
///
/// Grouping these keeps every dependency explicit and injectable for testing.
pub struct OrchestratorDeps {
    /// Remote approval service.
    pub api: Arc<dyn ApprovalApi>,
    /// Source of the bearer token.
    pub tokens: Arc<dyn TokenStore>,
    /// Slots the approval surface reports into.
    pub signals: Arc<dyn SignalingChannel>,
    /// Where the user approves.
    pub surface: Arc<dyn ApprovalSurface>,
}

/// The public façade of the handshake.
pub struct TransactionOrchestrator {
    api: Arc<dyn ApprovalApi>,
    tokens: Arc<dyn TokenStore>,
    coordinator: ApprovalRequestCoordinator,
    poller: TransactionStatusPoller,
    broadcast_policy: StatusPolicy,
    finality_policy: StatusPolicy,
    settle_delay: Duration,
}

impl TransactionOrchestrator {
    /// Create an orchestrator with all dependencies injected.
    pub fn new(deps: OrchestratorDeps, config: &WalletGateConfig) -> Self {
        let coordinator = ApprovalRequestCoordinator::new(
            deps.api.clone(),
            deps.surface,
            deps.signals,
            CoordinatorConfig::from_config(config),
        );
        let poller = TransactionStatusPoller::new(deps.api.clone(), config.status_poll_interval());

        Self {
            api: deps.api,
            tokens: deps.tokens,
            coordinator,
            poller,
            broadcast_policy: config.broadcast_policy(),
            finality_policy: config.finality_policy(),
            settle_delay: config.settle_delay(),
        }
    }

    /// Call a contract method through the approval handshake.
    pub async fn call_contract(
        &self,
        contract_address: &str,
        method_name: &str,
        method_params: &[String],
    ) -> Result<TransactionReceipt, WalletGateError> {
        self.call_contract_with_cancel(
            contract_address,
            method_name,
            method_params,
            &CancellationToken::new(),
        )
        .await
    }

    /// [`call_contract`](Self::call_contract) with a token observed at every
    /// suspension point.
    pub async fn call_contract_with_cancel(
        &self,
        contract_address: &str,
        method_name: &str,
        method_params: &[String],
        cancel: &CancellationToken,
    ) -> Result<TransactionReceipt, WalletGateError> {
        match self
            .run(contract_address, method_name, method_params, cancel)
            .await
        {
            Ok(receipt) => Ok(receipt),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    contract = %contract_address,
                    method = %method_name,
                    "contract call failed"
                );
                Err(e)
            }
        }
    }

    /// Exchange an approval token for a queue id.
    ///
    /// Used by whatever receives the provider's callback before it writes the
    /// queue id into the signaling channel.
    pub async fn create_tx_queue_approval(
        &self,
        access_token: &str,
        approval_token: &str,
    ) -> Result<QueueApproval, WalletGateError> {
        self.api
            .create_tx_queue_approval(access_token, approval_token)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "create tx queue approval failed"))
    }

    async fn run(
        &self,
        contract_address: &str,
        method_name: &str,
        method_params: &[String],
        cancel: &CancellationToken,
    ) -> Result<TransactionReceipt, WalletGateError> {
        let access_token = self
            .tokens
            .access_token()
            .await?
            .ok_or(WalletGateError::NotAuthenticated)?;

        let queue_id = self
            .coordinator
            .request_approval_with_cancel(
                &access_token,
                contract_address,
                method_name,
                method_params,
                cancel,
            )
            .await?;

        let broadcast = self
            .poller
            .wait_for_status_with_cancel(&access_token, &queue_id, &self.broadcast_policy, cancel)
            .await?;
        tracing::info!(queue_id = %queue_id, status = %broadcast.status, "transaction broadcast");

        let finalized = self
            .poller
            .wait_for_status_with_cancel(&access_token, &queue_id, &self.finality_policy, cancel)
            .await?;
        tracing::info!(
            queue_id = %queue_id,
            tx_hash = ?finalized.tx_hash,
            settle_secs = self.settle_delay.as_secs(),
            "transaction finalized, settling"
        );

        tokio::select! {
            _ = cancel.cancelled() => {
                return Err(WalletGateError::Cancelled(format!(
                    "settle delay for queue {queue_id} cancelled"
                )));
            }
            _ = tokio::time::sleep(self.settle_delay) => {}
        }

        Ok(TransactionReceipt::from(finalized))
    }
}
