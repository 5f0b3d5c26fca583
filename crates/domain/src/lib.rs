//! # Weavelink Domain
//!
//! Domain types shared by the session and batch engines.
//!
//! This crate contains:
//! - The error type and `Result` alias
//! - Credentials and their token-request bodies
//! - Timeout, proxy and client configuration
//! - Batch item types and beacon helpers
//!
//! ## Architecture
//! - No dependencies on other weavelink crates
//! - No I/O

pub mod batch;
pub mod beacon;
pub mod config;
pub mod constants;
pub mod credentials;
pub mod errors;

// Re-export commonly used items
pub use batch::{BatchKind, ObjectItem, ReferenceItem};
pub use config::{
    BatchSettings, ClientConfig, PooledTimeout, ProxyConfig, ProxySetting, TimeoutConfig,
    TimeoutSetting,
};
pub use credentials::{Credential, GrantType, TokenRequest};
pub use errors::*;
