//! # Weavelink Infrastructure
//!
//! Infrastructure implementations of core ports and the client facades.
//!
//! This crate contains:
//! - HTTP transports (`reqwest` pooled and blocking)
//! - The async [`Client`] and the [`blocking::Client`]
//! - Schema and data object helpers
//! - Configuration loading and tracing setup
//!
//! ## Architecture
//! - Implements [`weavelink_core::Transport`]
//! - Contains all "impure" code (I/O, environment, files)

pub mod blocking;
pub mod client;
pub mod config;
pub mod data;
pub mod errors;
pub mod http;
pub mod observability;
pub mod schema;

// Re-export commonly used items
pub use client::{Client, ClientBuilder};
pub use data::DataObject;
pub use http::{BlockingTransport, PooledTransport};
pub use schema::Schema;
