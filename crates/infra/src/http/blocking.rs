use async_trait::async_trait;
use reqwest::blocking::Client as BlockingClient;
use reqwest::Proxy;
use tracing::debug;
use weavelink_core::{HttpRequest, HttpResponse, RequestBody, Transport, TransportError};
use weavelink_domain::{ProxyConfig, Result, TimeoutConfig};

use crate::errors::conversions::client_build_error;
use crate::errors::IntoTransportError;

/// Transport backed by `reqwest::blocking`, used by the blocking client.
///
/// Calls run on tokio's blocking pool so the shared async session code can
/// drive them. The client must be built and dropped outside of an async
/// context.
#[derive(Clone)]
pub struct BlockingTransport {
    client: BlockingClient,
}

impl BlockingTransport {
    pub fn builder() -> BlockingTransportBuilder {
        BlockingTransportBuilder::default()
    }
}

#[async_trait]
impl Transport for BlockingTransport {
    async fn execute(&self, request: HttpRequest) -> std::result::Result<HttpResponse, TransportError> {
        let client = self.client.clone();
        tokio::task::spawn_blocking(move || send(&client, request))
            .await
            .map_err(|e| TransportError::Other(format!("blocking request task failed: {e}")))?
    }
}

fn send(client: &BlockingClient, request: HttpRequest) -> std::result::Result<HttpResponse, TransportError> {
    let (_, read) = request.timeout.simple();
    let mut builder = client.request(super::method(request.method), &request.url).timeout(read);
    for (name, value) in &request.headers {
        builder = builder.header(name, value);
    }
    builder = match request.body {
        RequestBody::Empty => builder,
        RequestBody::Json(value) => builder.json(&value),
        RequestBody::Form(fields) => builder.form(&fields),
    };

    debug!(method = %request.method, url = %request.url, "sending blocking HTTP request");
    let response = builder.send().map_err(IntoTransportError::into_transport_error)?;
    let status = response.status().as_u16();
    let body = response.text().map_err(IntoTransportError::into_transport_error)?;
    Ok(HttpResponse::new(status, body))
}

/// Builder for [`BlockingTransport`].
#[derive(Debug, Default)]
pub struct BlockingTransportBuilder {
    timeout: TimeoutConfig,
    proxy: ProxyConfig,
}

impl BlockingTransportBuilder {
    /// Sets the connect timeout; read timeouts are applied per request.
    pub fn timeout(mut self, timeout: TimeoutConfig) -> Self {
        self.timeout = timeout;
        self
    }

    /// Per-scheme proxies.
    pub fn proxy(mut self, proxy: ProxyConfig) -> Self {
        self.proxy = proxy;
        self
    }

    pub fn build(self) -> Result<BlockingTransport> {
        let (connect, _) = self.timeout.simple();
        let mut builder = BlockingClient::builder().connect_timeout(connect);

        if self.proxy.is_empty() {
            builder = builder.no_proxy();
        }
        if let Some(url) = self.proxy.http() {
            builder = builder.proxy(Proxy::http(url).map_err(|e| client_build_error(&e))?);
        }
        if let Some(url) = self.proxy.https() {
            builder = builder.proxy(Proxy::https(url).map_err(|e| client_build_error(&e))?);
        }

        let client = builder.build().map_err(|e| client_build_error(&e))?;
        Ok(BlockingTransport { client })
    }
}
