use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client as ReqwestClient, Proxy};
use tracing::debug;
use weavelink_core::{HttpRequest, HttpResponse, RequestBody, Transport, TransportError};
use weavelink_domain::{ProxyConfig, Result, TimeoutConfig};

use crate::errors::conversions::client_build_error;
use crate::errors::IntoTransportError;

/// Connection-pooling transport for the async client.
///
/// The connect timeout is fixed when the client is built; every request is
/// bounded by its own `connect + read` budget.
#[derive(Clone)]
pub struct PooledTransport {
    client: ReqwestClient,
}

impl PooledTransport {
    /// Start building a new pooled transport.
    pub fn builder() -> PooledTransportBuilder {
        PooledTransportBuilder::default()
    }

    /// Convenience constructor with default configuration.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }
}

#[async_trait]
impl Transport for PooledTransport {
    async fn execute(&self, request: HttpRequest) -> std::result::Result<HttpResponse, TransportError> {
        let timeout = request.timeout.pooled();
        let mut builder = self
            .client
            .request(super::method(request.method), &request.url)
            .timeout(timeout.total);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Form(fields) => builder.form(&fields),
        };

        debug!(method = %request.method, url = %request.url, "sending HTTP request");
        let response = builder.send().await.map_err(IntoTransportError::into_transport_error)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(IntoTransportError::into_transport_error)?;
        debug!(method = %request.method, url = %request.url, status, "received HTTP response");

        Ok(HttpResponse::new(status, body))
    }
}

/// Builder for [`PooledTransport`].
#[derive(Debug, Default)]
pub struct PooledTransportBuilder {
    timeout: TimeoutConfig,
    proxy: ProxyConfig,
    pool_max_idle_per_host: Option<usize>,
    user_agent: Option<String>,
}

impl PooledTransportBuilder {
    pub fn timeout(mut self, timeout: TimeoutConfig) -> Self {
        self.timeout = timeout;
        self
    }

    /// A single proxy is used for every scheme, preferring the https one.
    pub fn proxy(mut self, proxy: ProxyConfig) -> Self {
        self.proxy = proxy;
        self
    }

    pub fn pool_max_idle_per_host(mut self, max: usize) -> Self {
        self.pool_max_idle_per_host = Some(max);
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    pub fn build(self) -> Result<PooledTransport> {
        let mut builder = ReqwestClient::builder()
            .connect_timeout(self.timeout.pooled().connect)
            .pool_idle_timeout(Duration::from_secs(90));

        builder = match self.proxy.pooled() {
            Some(url) => builder.proxy(Proxy::all(url).map_err(|e| client_build_error(&e))?),
            None => builder.no_proxy(),
        };

        if let Some(max) = self.pool_max_idle_per_host {
            builder = builder.pool_max_idle_per_host(max);
        }

        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }

        let client = builder.build().map_err(|e| client_build_error(&e))?;
        Ok(PooledTransport { client })
    }
}
