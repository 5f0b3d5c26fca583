//! Blocking client facade
//!
//! Drives the same session and batch engines as the async [`crate::Client`]
//! on a private current-thread runtime, with a [`BlockingTransport`] doing
//! the HTTP. Every call blocks the caller. Must not be used from inside an
//! async runtime.

use std::sync::Arc;

use serde_json::Value;
use tokio::runtime::{Builder as RuntimeBuilder, Runtime};
use uuid::Uuid;
use weavelink_core::{BatchConfigPatch, BatchResults, DeleteOutput, OpenIdConfiguration, SessionManager};
use weavelink_domain::{ClientConfig, ObjectItem, ReferenceItem, Result, TimeoutConfig, WeaveError};

use crate::client::{Client as AsyncClient, ClientBuilder as AsyncClientBuilder};
use crate::http::BlockingTransport;

/// Builder for the blocking [`Client`].
pub struct ClientBuilder {
    inner: AsyncClientBuilder,
}

impl ClientBuilder {
    pub fn new(url: impl Into<String>) -> Self {
        Self { inner: AsyncClientBuilder::new(url) }
    }

    pub fn from_config(config: ClientConfig) -> Self {
        Self { inner: AsyncClientBuilder::from_config(config) }
    }

    /// Adjusts the shared builder options (credential, timeout, proxy, ...).
    #[must_use]
    pub fn configure<F>(mut self, f: F) -> Self
    where
        F: FnOnce(AsyncClientBuilder) -> AsyncClientBuilder,
    {
        self.inner = f(self.inner);
        self
    }

    /// # Errors
    /// - [`WeaveError::Config`] when the runtime or HTTP client cannot be built
    /// - any error of the async build
    pub fn build(self) -> Result<Client> {
        let runtime = RuntimeBuilder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| WeaveError::Config(format!("Failed to start runtime: {e}")))?;

        let mut inner = self.inner;
        if !inner.has_transport() {
            let transport = BlockingTransport::builder()
                .timeout(inner.timeout_config())
                .proxy(inner.resolved_proxy())
                .build()?;
            inner = inner.transport(Arc::new(transport));
        }

        let client = runtime.block_on(inner.build())?;
        Ok(Client { runtime: Arc::new(runtime), inner: client })
    }
}

/// Blocking client.
pub struct Client {
    runtime: Arc<Runtime>,
    inner: AsyncClient,
}

impl Client {
    pub fn builder(url: impl Into<String>) -> ClientBuilder {
        ClientBuilder::new(url)
    }

    /// # Errors
    /// Any error of [`ClientBuilder::build`].
    pub fn from_config(config: ClientConfig) -> Result<Self> {
        ClientBuilder::from_config(config).build()
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        self.inner.session()
    }

    /// # Errors
    /// See [`AsyncClient::is_ready`].
    pub fn is_ready(&self) -> Result<bool> {
        self.runtime.block_on(self.inner.is_ready())
    }

    /// # Errors
    /// See [`AsyncClient::is_live`].
    pub fn is_live(&self) -> Result<bool> {
        self.runtime.block_on(self.inner.is_live())
    }

    /// # Errors
    /// See [`AsyncClient::get_meta`].
    pub fn get_meta(&self) -> Result<Value> {
        self.runtime.block_on(self.inner.get_meta())
    }

    /// # Errors
    /// See [`AsyncClient::get_open_id_configuration`].
    pub fn get_open_id_configuration(&self) -> Result<Option<OpenIdConfiguration>> {
        self.runtime.block_on(self.inner.get_open_id_configuration())
    }

    pub fn schema(&self) -> Schema {
        Schema { runtime: self.runtime.clone(), inner: self.inner.schema() }
    }

    pub fn data_object(&self) -> DataObject {
        DataObject { runtime: self.runtime.clone(), inner: self.inner.data_object() }
    }

    pub fn batch(&self) -> Batch {
        Batch { runtime: self.runtime.clone(), inner: self.inner.batch() }
    }

    pub fn set_timeout(&self, timeout: TimeoutConfig) {
        self.inner.set_timeout(timeout);
    }

    pub fn close(&self) {
        self.runtime.block_on(self.inner.close());
    }
}

/// Blocking [`crate::schema::Schema`].
pub struct Schema {
    runtime: Arc<Runtime>,
    inner: crate::schema::Schema,
}

impl Schema {
    /// # Errors
    /// See [`crate::schema::Schema::get`].
    pub fn get(&self, class_name: Option<&str>) -> Result<Value> {
        self.runtime.block_on(self.inner.get(class_name))
    }

    /// # Errors
    /// See [`crate::schema::Schema::create`].
    pub fn create(&self, schema: &Value) -> Result<()> {
        self.runtime.block_on(self.inner.create(schema))
    }

    /// # Errors
    /// See [`crate::schema::Schema::create_classes`].
    pub fn create_classes(&self, classes: &[Value]) -> Result<()> {
        self.runtime.block_on(self.inner.create_classes(classes))
    }

    /// # Errors
    /// See [`crate::schema::Schema::create_class`].
    pub fn create_class(&self, class: &Value) -> Result<()> {
        self.runtime.block_on(self.inner.create_class(class))
    }

    /// # Errors
    /// See [`crate::schema::Schema::delete_class`].
    pub fn delete_class(&self, class_name: &str) -> Result<()> {
        self.runtime.block_on(self.inner.delete_class(class_name))
    }

    /// # Errors
    /// See [`crate::schema::Schema::delete_all`].
    pub fn delete_all(&self) -> Result<()> {
        self.runtime.block_on(self.inner.delete_all())
    }

    /// # Errors
    /// See [`crate::schema::Schema::contains`].
    pub fn contains(&self, class_name: Option<&str>) -> Result<bool> {
        self.runtime.block_on(self.inner.contains(class_name))
    }
}

/// Blocking [`crate::data::DataObject`].
pub struct DataObject {
    runtime: Arc<Runtime>,
    inner: crate::data::DataObject,
}

impl DataObject {
    /// # Errors
    /// See [`crate::data::DataObject::get_by_id`].
    pub fn get_by_id(&self, id: &str, additional: &[&str]) -> Result<Option<Value>> {
        self.runtime.block_on(self.inner.get_by_id(id, additional))
    }

    /// # Errors
    /// See [`crate::data::DataObject::get`].
    pub fn get(&self, limit: Option<u32>, offset: Option<u32>, additional: &[&str]) -> Result<Value> {
        self.runtime.block_on(self.inner.get(limit, offset, additional))
    }

    /// # Errors
    /// See [`crate::data::DataObject::exists`].
    pub fn exists(&self, id: &str) -> Result<bool> {
        self.runtime.block_on(self.inner.exists(id))
    }

    /// # Errors
    /// See [`crate::data::DataObject::delete`].
    pub fn delete(&self, id: &str) -> Result<()> {
        self.runtime.block_on(self.inner.delete(id))
    }
}

/// Blocking [`weavelink_core::Batch`].
pub struct Batch {
    runtime: Arc<Runtime>,
    inner: weavelink_core::Batch,
}

impl Batch {
    /// # Errors
    /// See [`weavelink_core::Batch::configure`].
    pub fn configure(&mut self, patch: &BatchConfigPatch) -> Result<()> {
        self.runtime.block_on(self.inner.configure(patch))
    }

    /// # Errors
    /// See [`weavelink_core::Batch::add_object`].
    pub fn add_object(
        &mut self,
        class_name: &str,
        properties: &Value,
        id: Option<&str>,
        vector: Option<Vec<f32>>,
    ) -> Result<Uuid> {
        self.runtime.block_on(self.inner.add_object(class_name, properties, id, vector))
    }

    /// # Errors
    /// See [`weavelink_core::Batch::add_reference`].
    pub fn add_reference(
        &mut self,
        from_class: &str,
        from_id: &str,
        from_property: &str,
        to_class: Option<&str>,
        to_id: &str,
    ) -> Result<()> {
        self.runtime.block_on(self.inner.add_reference(from_class, from_id, from_property, to_class, to_id))
    }

    /// # Errors
    /// See [`weavelink_core::Batch::flush`].
    pub fn flush(&mut self) -> Result<BatchResults> {
        self.runtime.block_on(self.inner.flush())
    }

    /// # Errors
    /// See [`weavelink_core::Batch::create_objects`].
    pub fn create_objects(&mut self) -> Result<Vec<Value>> {
        self.runtime.block_on(self.inner.create_objects())
    }

    /// # Errors
    /// See [`weavelink_core::Batch::create_references`].
    pub fn create_references(&mut self) -> Result<Vec<Value>> {
        self.runtime.block_on(self.inner.create_references())
    }

    /// # Errors
    /// See [`weavelink_core::Batch::delete_objects`].
    pub fn delete_objects(
        &self,
        class_name: &str,
        where_filter: &Value,
        output: DeleteOutput,
        dry_run: bool,
    ) -> Result<Value> {
        self.runtime.block_on(self.inner.delete_objects(class_name, where_filter, output, dry_run))
    }

    pub fn shape(&self) -> (usize, usize) {
        self.inner.shape()
    }

    pub fn num_objects(&self) -> usize {
        self.inner.num_objects()
    }

    pub fn num_references(&self) -> usize {
        self.inner.num_references()
    }

    /// # Errors
    /// See [`weavelink_core::Batch::pop_object`].
    pub fn pop_object(&mut self, index: Option<usize>) -> Result<ObjectItem> {
        self.inner.pop_object(index)
    }

    /// # Errors
    /// See [`weavelink_core::Batch::pop_reference`].
    pub fn pop_reference(&mut self, index: Option<usize>) -> Result<ReferenceItem> {
        self.inner.pop_reference(index)
    }

    pub fn clear_objects(&mut self) {
        self.inner.clear_objects();
    }

    pub fn clear_references(&mut self) {
        self.inner.clear_references();
    }

    pub fn recommended_num_objects(&self) -> usize {
        self.inner.recommended_num_objects()
    }

    pub fn recommended_num_references(&self) -> usize {
        self.inner.recommended_num_references()
    }
}
