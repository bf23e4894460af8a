//! Local adapters for the cross-context side of the walletgate handshake.
//!
//! - **Signaling**: shared key-value slots the approval surface reports into
//!   (in-memory with change notifications, or a JSON file shared with another process)
//! - **Surface**: approval surface backed by a spawned companion process
pub mod signaling;
pub mod surface;

pub use signaling::{FileSignalingChannel, InMemorySignalingChannel};
pub use surface::CompanionProcessSurface;
