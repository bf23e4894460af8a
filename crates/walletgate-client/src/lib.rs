//! Adapters for the remote side of the walletgate handshake.
//!
//! - **Approval API**: `reqwest` client for the wallet-authorization service
//! - **Token store**: in-memory and file-backed bearer token sources
pub mod approval_api;
pub mod token_store;

pub use approval_api::HttpApprovalApi;
pub use token_store::{FileTokenStore, InMemoryTokenStore};
