//! Shared types, traits, and errors for the walletgate approval handshake.
//!
//! This crate is the foundation that all other walletgate crates depend on.
//! It contains:
//! - **Trait contracts** (`traits`) for the external collaborators: approval
//!   service, token store, signaling channel, and approval surface
//! - **Data model** (`model`) for approval requests, queue status records, and receipts
//! - **Error type** (`errors`) shared across crate boundaries
//! - **Config** (`config`, `config_loader`) parsed from YAML and validated on load
pub mod config;
pub mod config_loader;
pub mod errors;
pub mod model;
pub mod traits;

// Re-export commonly used types at the crate root for convenience.
pub use config::WalletGateConfig;
pub use config_loader::ConfigLoader;
pub use errors::WalletGateError;
pub use model::*;
pub use traits::*;
