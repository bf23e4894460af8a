/// Trait contracts for the external collaborators of the approval handshake.
///
/// The core crate codes against these interfaces only. Concrete adapters live
/// in `walletgate-client` (HTTP service, token store) and `walletgate-channels`
/// (signaling channel, approval surface); tests supply their own mocks.
use async_trait::async_trait;
use tokio::sync::watch;

use crate::errors::WalletGateError;
use crate::model::*;

// ============================================================
// Approval Service
// ============================================================

/// Remote wallet-authorization service.
#[async_trait]
pub trait ApprovalApi: Send + Sync {
    /// Create a pending approval and return the page the user must visit.
    async fn create_approval(
        &self,
        access_token: &str,
        request: &ApprovalRequest,
    ) -> Result<ApprovalHandle, WalletGateError>;

    /// Exchange an approval token (issued to the approval surface) for a queue id.
    async fn create_tx_queue_approval(
        &self,
        access_token: &str,
        approval_token: &str,
    ) -> Result<QueueApproval, WalletGateError>;

    /// Read the current status of a queued transaction.
    async fn get_tx_queue_status(
        &self,
        access_token: &str,
        queue_id: &QueueId,
    ) -> Result<TransactionStatusRecord, WalletGateError>;
}

// ============================================================
// Token Store
// ============================================================

/// Read-only access to a previously stored bearer token.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Returns `Ok(None)` when no token has been stored.
    async fn access_token(&self) -> Result<Option<String>, WalletGateError>;
}

// ============================================================
// Signaling Channel
// ============================================================

/// Small shared key-value store the approval surface writes its outcome into.
///
/// Implementations must make `clear` idempotent: clearing an empty slot is a
/// no-op.
#[async_trait]
pub trait SignalingChannel: Send + Sync {
    /// Read a slot without consuming it.
    async fn get(&self, key: SignalKey) -> Result<Option<String>, WalletGateError>;

    /// Write a slot, replacing any previous value.
    async fn set(&self, key: SignalKey, value: &str) -> Result<(), WalletGateError>;

    /// Empty a slot.
    async fn clear(&self, key: SignalKey) -> Result<(), WalletGateError>;

    /// Change notifications, if the backing store can produce them.
    ///
    /// The receiver's value is a version counter bumped on every write. Stores
    /// that return `None` are observed by periodic re-reads instead.
    fn subscribe(&self) -> Option<watch::Receiver<u64>> {
        None
    }
}

// ============================================================
// Approval Surface
// ============================================================

/// External, user-facing execution context (window, tab, companion process).
#[async_trait]
pub trait ApprovalSurface: Send + Sync {
    /// Open a new surface showing `url`.
    async fn open(&self, url: &str) -> Result<SurfaceHandle, WalletGateError>;

    /// Send an already-open surface to `url`.
    async fn navigate(&self, handle: SurfaceHandle, url: &str) -> Result<(), WalletGateError>;

    /// Whether the user has closed the surface. Unknown handles count as closed.
    async fn is_closed(&self, handle: SurfaceHandle) -> bool;

    /// Close the surface. Closing an already-closed surface is a no-op.
    async fn close(&self, handle: SurfaceHandle) -> Result<(), WalletGateError>;
}
