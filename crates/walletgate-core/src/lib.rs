//! Core of the walletgate approval handshake.
//!
//! One contract call runs strictly in sequence:
//! - **Coordinator**: opens the approval surface, creates the approval, waits
//!   for the surface to report a queue id through the signaling channel
//! - **Poller**: reads the queue status until it lands in an accepted or failed set
//! - **Orchestrator**: token lookup → coordinator → broadcast wait → finality
//!   wait → settle delay → receipt
pub mod coordinator;
pub mod orchestrator;
pub mod poller;

#[cfg(test)]
pub(crate) mod test_support;

pub use coordinator::{ApprovalRequestCoordinator, CoordinatorConfig};
pub use orchestrator::{OrchestratorDeps, TransactionOrchestrator};
pub use poller::TransactionStatusPoller;
pub use tokio_util::sync::CancellationToken;
