//! Data model for the approval handshake.
//!
//! Requests sent to the approval service, the handle it returns, the status
//! records read back while polling, and the receipt handed to callers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Maximum length of an approval description, in characters.
pub const MAX_DESCRIPTION_CHARS: usize = 128;

/// Marker appended to a truncated description.
pub const ELLIPSIS: &str = "...";

/// Operation type sent with every contract-call approval.
pub const CONTRACT_CALL: &str = "CONTRACT_CALL";

// ============================================================
// Network
// ============================================================

/// Two-valued network mode the approval request is scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkMode {
    /// Public test network.
    Testnet,
    /// Production network.
    #[default]
    Mainnet,
}

impl NetworkMode {
    /// `"testnet"` selects the test network; every other value selects mainnet.
    pub fn from_mode(mode: &str) -> Self {
        if mode == "testnet" {
            NetworkMode::Testnet
        } else {
            NetworkMode::Mainnet
        }
    }

    /// Chain identifier understood by the approval service.
    pub fn chain_id(&self) -> &'static str {
        match self {
            NetworkMode::Testnet => "BKC_TESTNET",
            NetworkMode::Mainnet => "BKC_MAINNET",
        }
    }
}

// ============================================================
// Approval Request
// ============================================================

/// Contract call carried inside an approval request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractCall {
    /// Target contract address.
    pub contract_address: String,
    /// Method to invoke on the contract.
    pub contract_method_name: String,
    /// Method arguments, string-encoded, in call order.
    pub contract_method_params: Vec<String>,
}

/// Body of the create-approval request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalRequest {
    /// Network identifier (`BKC_TESTNET` / `BKC_MAINNET`).
    pub chain: String,
    /// Operation type, always [`CONTRACT_CALL`] for contract calls.
    #[serde(rename = "type")]
    pub approval_type: String,
    /// Human-readable summary, at most [`MAX_DESCRIPTION_CHARS`] characters.
    pub description: String,
    /// Where the provider sends the user after the approval step.
    pub callback_url: String,
    /// The contract call being approved.
    pub tx: ContractCall,
}

impl ApprovalRequest {
    /// Build a contract-call approval request with a generated description.
    pub fn contract_call(
        network: NetworkMode,
        callback_url: impl Into<String>,
        contract_address: impl Into<String>,
        method_name: impl Into<String>,
        method_params: Vec<String>,
    ) -> Self {
        let method_name = method_name.into();
        let description = describe_call(&method_name, &method_params);
        Self {
            chain: network.chain_id().to_string(),
            approval_type: CONTRACT_CALL.to_string(),
            description,
            callback_url: callback_url.into(),
            tx: ContractCall {
                contract_address: contract_address.into(),
                contract_method_name: method_name,
                contract_method_params: method_params,
            },
        }
    }
}

/// `send {method}({params})`, bounded by [`truncate_description`].
pub fn describe_call(method_name: &str, method_params: &[String]) -> String {
    truncate_description(&format!(
        "send {}({})",
        method_name,
        method_params.join(",")
    ))
}

/// Bound a description to [`MAX_DESCRIPTION_CHARS`] characters.
///
/// Longer input keeps its first 125 characters followed by [`ELLIPSIS`], so
/// the result is exactly 128 characters. Shorter input is returned unchanged.
pub fn truncate_description(description: &str) -> String {
    if description.chars().count() <= MAX_DESCRIPTION_CHARS {
        return description.to_string();
    }
    let keep = MAX_DESCRIPTION_CHARS - ELLIPSIS.chars().count();
    let mut truncated: String = description.chars().take(keep).collect();
    truncated.push_str(ELLIPSIS);
    truncated
}

/// Returned by create-approval: where to send the user, and the provider's id
/// for the pending approval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalHandle {
    /// Provider-hosted page where the user approves or rejects.
    #[serde(alias = "approve_url")]
    pub approval_url: String,
    /// Provider reference for the pending approval.
    #[serde(default, alias = "id")]
    pub approval_id: String,
}

/// Returned by create-tx-queue-approval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueApproval {
    /// Correlation identifier of the queued transaction.
    pub queue_id: QueueId,
}

// ============================================================
// Queue Status
// ============================================================

/// Correlation identifier linking an approval to its queued transaction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueueId(pub String);

impl QueueId {
    /// Borrow the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QueueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for QueueId {
    fn from(value: &str) -> Self {
        QueueId(value.to_string())
    }
}

impl From<String> for QueueId {
    fn from(value: String) -> Self {
        QueueId(value)
    }
}

/// Status of a queued transaction as reported by the provider.
///
/// Only `Broadcasted` and `Success` carry meaning on their own; every other
/// value is classified by a [`StatusPolicy`]. Parsing ignores case; values
/// outside the known vocabulary are kept upper-cased in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TxStatus {
    Queued,
    Pending,
    Broadcasted,
    Success,
    Failed,
    Rejected,
    Cancelled,
    Other(String),
}

impl TxStatus {
    /// Wire representation of the status.
    pub fn as_str(&self) -> &str {
        match self {
            TxStatus::Queued => "QUEUED",
            TxStatus::Pending => "PENDING",
            TxStatus::Broadcasted => "BROADCASTED",
            TxStatus::Success => "SUCCESS",
            TxStatus::Failed => "FAILED",
            TxStatus::Rejected => "REJECTED",
            TxStatus::Cancelled => "CANCELLED",
            TxStatus::Other(s) => s,
        }
    }
}

impl From<String> for TxStatus {
    fn from(value: String) -> Self {
        let upper = value.to_ascii_uppercase();
        match upper.as_str() {
            "QUEUED" => TxStatus::Queued,
            "PENDING" => TxStatus::Pending,
            "BROADCASTED" => TxStatus::Broadcasted,
            "SUCCESS" => TxStatus::Success,
            "FAILED" => TxStatus::Failed,
            "REJECTED" => TxStatus::Rejected,
            "CANCELLED" => TxStatus::Cancelled,
            _ => TxStatus::Other(upper),
        }
    }
}

impl From<TxStatus> for String {
    fn from(value: TxStatus) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for TxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One read of the transaction-queue status endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionStatusRecord {
    /// Correlation identifier the record belongs to.
    #[serde(alias = "id")]
    pub queue_id: QueueId,
    /// Current status.
    pub status: TxStatus,
    /// Transaction hash, once the provider has one.
    #[serde(default, alias = "txHash", alias = "transaction_hash")]
    pub tx_hash: Option<String>,
    /// Remaining provider fields, preserved as-is.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl TransactionStatusRecord {
    /// Create a record with no hash and no extra fields.
    pub fn new(queue_id: QueueId, status: TxStatus) -> Self {
        Self {
            queue_id,
            status,
            tx_hash: None,
            extra: serde_json::Map::new(),
        }
    }

    /// Attach a transaction hash.
    pub fn with_hash(mut self, tx_hash: impl Into<String>) -> Self {
        self.tx_hash = Some(tx_hash.into());
        self
    }
}

// ============================================================
// Status Policy
// ============================================================

/// How a poll result is classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    /// The wait resolves with this record.
    Accepted,
    /// The wait fails with this record.
    Failed,
    /// Keep polling.
    Pending,
}

/// Explicit partition of statuses into accepted, failed, and (implicitly) pending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusPolicy {
    /// Statuses that end the wait successfully.
    pub accept: Vec<TxStatus>,
    /// Statuses that end the wait with [`crate::WalletGateError::TransactionFailed`].
    pub fail: Vec<TxStatus>,
}

impl Default for StatusPolicy {
    /// Accept `BROADCASTED` or `SUCCESS`; treat nothing as a failure.
    fn default() -> Self {
        Self {
            accept: vec![TxStatus::Broadcasted, TxStatus::Success],
            fail: Vec::new(),
        }
    }
}

impl StatusPolicy {
    /// Accept only `SUCCESS`.
    pub fn finality() -> Self {
        Self {
            accept: vec![TxStatus::Success],
            fail: Vec::new(),
        }
    }

    /// Accept the given statuses with an empty failure set.
    pub fn accepting(accept: Vec<TxStatus>) -> Self {
        Self {
            accept,
            fail: Vec::new(),
        }
    }

    /// Replace the failure set.
    pub fn failing_on(mut self, fail: Vec<TxStatus>) -> Self {
        self.fail = fail;
        self
    }

    /// Acceptance is checked before failure.
    pub fn classify(&self, status: &TxStatus) -> StatusClass {
        if self.accept.contains(status) {
            StatusClass::Accepted
        } else if self.fail.contains(status) {
            StatusClass::Failed
        } else {
            StatusClass::Pending
        }
    }
}

// ============================================================
// Receipt
// ============================================================

/// Normalized result of a completed contract call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub queue_id: QueueId,
    pub status: TxStatus,
    pub transaction_hash: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl From<TransactionStatusRecord> for TransactionReceipt {
    fn from(record: TransactionStatusRecord) -> Self {
        Self {
            queue_id: record.queue_id,
            status: record.status,
            transaction_hash: record.tx_hash,
            extra: record.extra,
        }
    }
}

// ============================================================
// Signaling
// ============================================================

/// Named slots of the signaling channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalKey {
    /// Written by the approval surface with the queue id on approval.
    TxQueueId,
    /// Written by the approval surface with a reason on failure or rejection.
    TxError,
}

impl SignalKey {
    /// Key name used in the backing store.
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalKey::TxQueueId => "TX_QUEUE_ID",
            SignalKey::TxError => "TX_ERROR",
        }
    }
}

impl fmt::Display for SignalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque handle to an opened approval surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceHandle(pub u64);
