//! Async client facade
//!
//! [`Client`] wires a [`PooledTransport`] into a [`SessionManager`], runs
//! OpenID discovery on build and hands out the schema, data object and batch
//! helpers bound to that session.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::{info, instrument};
use weavelink_common::time::Clock;
use weavelink_core::{Batch, BatchConfig, OpenIdConfiguration, SessionManager, Transport};
use weavelink_domain::constants::{LIVE_PATH, META_PATH, READY_PATH};
use weavelink_domain::{
    BatchSettings, ClientConfig, Credential, ProxyConfig, ProxySetting, Result, TimeoutConfig,
    WeaveError,
};

use crate::data::DataObject;
use crate::http::PooledTransport;
use crate::schema::Schema;

/// Builder for [`Client`] and [`crate::blocking::Client`].
pub struct ClientBuilder {
    url: String,
    credential: Option<Credential>,
    timeout: TimeoutConfig,
    proxy: Option<ProxySetting>,
    trust_env: bool,
    additional_headers: BTreeMap<String, String>,
    batch: BatchSettings,
    clock: Option<Arc<dyn Clock>>,
    transport: Option<Arc<dyn Transport>>,
}

impl ClientBuilder {
    pub fn new(url: impl Into<String>) -> Self {
        Self::from_config(ClientConfig::new(url))
    }

    pub fn from_config(config: ClientConfig) -> Self {
        Self {
            url: config.url,
            credential: config.credentials,
            timeout: config.timeout,
            proxy: config.proxy,
            trust_env: config.trust_env,
            additional_headers: config.additional_headers,
            batch: config.batch,
            clock: None,
            transport: None,
        }
    }

    #[must_use]
    pub fn credential(mut self, credential: Credential) -> Self {
        self.credential = Some(credential);
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: TimeoutConfig) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn proxy(mut self, proxy: ProxySetting) -> Self {
        self.proxy = Some(proxy);
        self
    }

    /// Read `HTTP(S)_PROXY` when no explicit proxy is set.
    #[must_use]
    pub fn trust_env(mut self, trust_env: bool) -> Self {
        self.trust_env = trust_env;
        self
    }

    /// Header sent with every request, e.g. an inference API key.
    #[must_use]
    pub fn additional_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.additional_headers.insert(name.into(), value.into());
        self
    }

    /// Defaults for batches created by [`Client::batch`].
    #[must_use]
    pub fn batch_settings(mut self, settings: BatchSettings) -> Self {
        self.batch = settings;
        self
    }

    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Replaces the default transport.
    #[must_use]
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub(crate) fn has_transport(&self) -> bool {
        self.transport.is_some()
    }

    pub(crate) fn resolved_proxy(&self) -> ProxyConfig {
        ProxyConfig::resolve(self.proxy.as_ref(), self.trust_env)
    }

    pub(crate) fn timeout_config(&self) -> TimeoutConfig {
        self.timeout
    }

    /// Builds the client and runs OpenID discovery.
    ///
    /// # Errors
    /// - [`WeaveError::InvalidInput`] for an invalid URL or batch settings
    /// - [`WeaveError::Config`] when the HTTP client cannot be built
    /// - any error of [`SessionManager::initialize`]
    pub async fn build(self) -> Result<Client> {
        let proxy = self.resolved_proxy();
        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(
                PooledTransport::builder().timeout(self.timeout).proxy(proxy.clone()).build()?,
            ),
        };
        let batch_config = BatchConfig::from_settings(&self.batch)?;

        let mut session = SessionManager::builder(self.url, transport)
            .credential(self.credential)
            .timeout(self.timeout)
            .proxy(proxy)
            .additional_headers(self.additional_headers);
        if let Some(clock) = self.clock {
            session = session.clock(clock);
        }
        let session = Arc::new(session.build()?);
        session.initialize().await?;
        info!(url = %session.base_url(), "client connected");

        Ok(Client { session, batch_config })
    }
}

/// Async client.
#[derive(Debug, Clone)]
pub struct Client {
    session: Arc<SessionManager>,
    batch_config: BatchConfig,
}

impl Client {
    pub fn builder(url: impl Into<String>) -> ClientBuilder {
        ClientBuilder::new(url)
    }

    /// # Errors
    /// Any error of [`ClientBuilder::build`].
    pub async fn from_config(config: ClientConfig) -> Result<Self> {
        ClientBuilder::from_config(config).build().await
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    /// Whether the server reports itself ready. Unreachable servers are not
    /// ready.
    ///
    /// # Errors
    /// Errors other than connection failures, e.g. authentication.
    pub async fn is_ready(&self) -> Result<bool> {
        self.probe(READY_PATH).await
    }

    /// Whether the server reports itself live.
    ///
    /// # Errors
    /// Errors other than connection failures, e.g. authentication.
    pub async fn is_live(&self) -> Result<bool> {
        self.probe(LIVE_PATH).await
    }

    #[instrument(skip(self))]
    async fn probe(&self, path: &str) -> Result<bool> {
        match self.session.get(path, &[]).await {
            Ok(response) => Ok(response.status == 200),
            Err(WeaveError::Connection(_) | WeaveError::Timeout(_)) => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Server version and module metadata.
    ///
    /// # Errors
    /// Returns [`WeaveError::UnsuccessfulStatus`] for statuses other than 200.
    pub async fn get_meta(&self) -> Result<Value> {
        let response = self.session.get(META_PATH, &[]).await?;
        if response.status != 200 {
            return Err(WeaveError::UnsuccessfulStatus {
                context: "Meta endpoint".to_string(),
                status: response.status,
                body: response.body,
            });
        }
        Ok(response.json()?)
    }

    /// The server's OpenID configuration, `None` when authentication is
    /// disabled.
    ///
    /// # Errors
    /// Any error of [`SessionManager::open_id_configuration`].
    pub async fn get_open_id_configuration(&self) -> Result<Option<OpenIdConfiguration>> {
        self.session.open_id_configuration().await
    }

    pub fn schema(&self) -> Schema {
        Schema::new(self.session.clone())
    }

    pub fn data_object(&self) -> DataObject {
        DataObject::new(self.session.clone())
    }

    /// A new batch using the client's batch settings.
    pub fn batch(&self) -> Batch {
        Batch::new(self.session.clone(), self.batch_config.clone())
    }

    pub fn set_timeout(&self, timeout: TimeoutConfig) {
        self.session.set_timeout(timeout);
    }

    /// Closes the session. Later calls fail with a configuration error.
    pub async fn close(&self) {
        self.session.close().await;
    }
}
