//! HTTP transports
//!
//! Two adapters of the [`weavelink_core::Transport`] port:
//! [`PooledTransport`] drives an async `reqwest::Client` with the pooled
//! timeout representation, [`BlockingTransport`] drives a
//! `reqwest::blocking::Client` with the simple one.

pub mod blocking;
pub mod pooled;

pub use blocking::{BlockingTransport, BlockingTransportBuilder};
pub use pooled::{PooledTransport, PooledTransportBuilder};

fn method(method: weavelink_core::Method) -> reqwest::Method {
    use weavelink_core::Method as M;
    match method {
        M::Get => reqwest::Method::GET,
        M::Post => reqwest::Method::POST,
        M::Put => reqwest::Method::PUT,
        M::Patch => reqwest::Method::PATCH,
        M::Delete => reqwest::Method::DELETE,
        M::Head => reqwest::Method::HEAD,
    }
}
