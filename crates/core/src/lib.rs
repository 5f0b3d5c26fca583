//! # Weavelink Core
//!
//! Session and batch engines, independent of any HTTP library.
//!
//! This crate contains:
//! - The [`Transport`] port and its request/response types
//! - The session manager (OpenID discovery, token refresh, headers)
//! - The batch engine (buffers, controller, executor)
//!
//! ## Architecture Principles
//! - Depends only on `weavelink-common` and `weavelink-domain`
//! - All HTTP goes through [`Transport`]; adapters live in `weavelink-infra`

pub mod batch;
pub mod ports;
pub mod session;

#[cfg(test)]
pub(crate) mod test_support;

pub use batch::{
    Batch, BatchCallback, BatchConfig, BatchConfigPatch, BatchController, BatchResults,
    BatchStrategy, DeleteOutput, ObjectBatch, ReferenceBatch,
};
pub use ports::{HttpRequest, HttpResponse, Method, RequestBody, Transport, TransportError};
pub use session::{OpenIdConfiguration, SessionManager, SessionManagerBuilder, SessionPhase};
