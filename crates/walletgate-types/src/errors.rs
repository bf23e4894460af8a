/// Unified error type for the walletgate approval handshake.
///
/// Every crate in the workspace propagates this type. The first five variants
/// are the failures a `call_contract` caller can observe from the handshake
/// itself; the rest come from the collaborators underneath it.
#[derive(Debug, thiserror::Error)]
pub enum WalletGateError {
    /// No access token is available in the token store.
    #[error("not authenticated: no access token available")]
    NotAuthenticated,

    /// The external approval surface could not be opened or driven.
    #[error("approval surface unavailable: {0}")]
    SurfaceUnavailable(String),

    /// The remote create-approval call failed.
    #[error("approval creation failed: {0}")]
    ApprovalCreationFailed(String),

    /// The approval surface reported an error through the signaling channel.
    #[error("approval denied: {0}")]
    ApprovalDenied(String),

    /// A status poll observed a status from the caller's failure set.
    #[error("transaction failed: queue {} reported {}", .0.queue_id, .0.status)]
    TransactionFailed(Box<crate::model::TransactionStatusRecord>),

    /// The approval service returned an error or could not be reached.
    #[error("provider error: {message}")]
    Provider {
        /// HTTP status code, when the service answered at all.
        status: Option<u16>,
        /// Most specific message available from the response body.
        message: String,
    },

    /// Error reading or writing the signaling channel.
    #[error("signaling error: {0}")]
    Signaling(String),

    /// Error reading the token store.
    #[error("token store error: {0}")]
    TokenStore(String),

    /// A bounded wait elapsed before a result arrived.
    #[error("timeout: {0}")]
    Timeout(String),

    /// The wait was cancelled through its cancellation token.
    #[error("cancelled: {0}")]
    Cancelled(String),

    /// Error from configuration loading or validation.
    #[error("config error: {0}")]
    Config(String),

    /// Serialization or deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Generic internal error for unexpected conditions.
    #[error("internal error: {0}")]
    Internal(String),
}

impl WalletGateError {
    /// Build a provider error from an HTTP status and message.
    pub fn provider(status: Option<u16>, message: impl Into<String>) -> Self {
        WalletGateError::Provider {
            status,
            message: message.into(),
        }
    }

    /// The most specific human-readable message carried by this error,
    /// without the variant prefix added by `Display`.
    pub fn detail(&self) -> String {
        match self {
            WalletGateError::NotAuthenticated => "no access token available".to_string(),
            WalletGateError::SurfaceUnavailable(m)
            | WalletGateError::ApprovalCreationFailed(m)
            | WalletGateError::ApprovalDenied(m)
            | WalletGateError::Signaling(m)
            | WalletGateError::TokenStore(m)
            | WalletGateError::Timeout(m)
            | WalletGateError::Cancelled(m)
            | WalletGateError::Config(m)
            | WalletGateError::Serialization(m)
            | WalletGateError::Internal(m) => m.clone(),
            WalletGateError::Provider { message, .. } => message.clone(),
            WalletGateError::TransactionFailed(record) => {
                format!("queue {} reported {}", record.queue_id, record.status)
            }
        }
    }
}

impl From<serde_json::Error> for WalletGateError {
    fn from(err: serde_json::Error) -> Self {
        WalletGateError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for WalletGateError {
    fn from(err: serde_yaml::Error) -> Self {
        WalletGateError::Serialization(err.to_string())
    }
}
