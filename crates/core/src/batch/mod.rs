//! Batch ingestion engine
//!
//! [`Batch`] buffers object upserts and cross-references and sends them in
//! bulk. A [`BatchController`] decides when to flush: manually, at a fixed
//! size, or dynamically from the rolling per-item latency of recent sends.

pub mod buffer;
pub mod config;
pub mod controller;
pub mod executor;

pub use buffer::{ObjectBatch, ReferenceBatch};
pub use config::{BatchCallback, BatchConfig, BatchConfigPatch, BatchStrategy};
pub use controller::BatchController;
pub use executor::{Batch, BatchResults, DeleteOutput};
