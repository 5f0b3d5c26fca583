//! Batch executor
//!
//! Sends buffered objects and references through the session, retrying on
//! read timeouts, feeding latency back into the controller and surfacing
//! per-item failures. All mutating operations take `&mut self`, so two sends
//! of one batch never overlap.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;
use weavelink_domain::errors::has_item_error;
use weavelink_domain::{BatchKind, ObjectItem, ReferenceItem, Result, WeaveError};

use super::buffer::{ObjectBatch, ReferenceBatch};
use super::config::{BatchConfig, BatchConfigPatch};
use super::controller::BatchController;
use crate::ports::HttpResponse;
use crate::session::SessionManager;

/// Per-item results of one flush.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchResults {
    pub objects: Vec<Value>,
    pub references: Vec<Value>,
}

/// Verbosity of a batch delete response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeleteOutput {
    #[default]
    Minimal,
    Verbose,
}

impl DeleteOutput {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Minimal => "minimal",
            Self::Verbose => "verbose",
        }
    }
}

/// Buffered bulk ingestion bound to one session.
#[derive(Debug)]
pub struct Batch {
    session: Arc<SessionManager>,
    controller: BatchController,
    objects: ObjectBatch,
    references: ReferenceBatch,
}

impl Batch {
    pub fn new(session: Arc<SessionManager>, config: BatchConfig) -> Self {
        Self {
            session,
            controller: BatchController::new(config),
            objects: ObjectBatch::new(),
            references: ReferenceBatch::new(),
        }
    }

    pub fn config(&self) -> &BatchConfig {
        self.controller.config()
    }

    /// Applies `patch` and, for a non-manual strategy, flushes right away if
    /// the buffers are already over the threshold.
    ///
    /// # Errors
    /// Returns [`WeaveError::InvalidInput`] for an invalid patch, or any
    /// error of the triggered flush.
    pub async fn configure(&mut self, patch: &BatchConfigPatch) -> Result<()> {
        self.controller.configure(patch)?;
        if !self.controller.config().strategy.is_manual() {
            self.auto_flush().await?;
        }
        Ok(())
    }

    /// Buffers one object and returns its id. May flush.
    ///
    /// # Errors
    /// Returns [`WeaveError::InvalidInput`] for an invalid object, or any
    /// error of the triggered flush.
    pub async fn add_object(
        &mut self,
        class_name: &str,
        properties: &Value,
        id: Option<&str>,
        vector: Option<Vec<f32>>,
    ) -> Result<Uuid> {
        let id = self.objects.add(class_name, properties, id, vector)?;
        self.auto_flush().await?;
        Ok(id)
    }

    /// Buffers one reference. May flush.
    ///
    /// # Errors
    /// Returns [`WeaveError::InvalidInput`] for an invalid reference, or any
    /// error of the triggered flush.
    pub async fn add_reference(
        &mut self,
        from_class: &str,
        from_id: &str,
        from_property: &str,
        to_class: Option<&str>,
        to_id: &str,
    ) -> Result<()> {
        self.references.add(from_class, from_id, from_property, to_class, to_id)?;
        self.auto_flush().await
    }

    async fn auto_flush(&mut self) -> Result<()> {
        if self.controller.should_auto_flush(self.objects.len(), self.references.len()) {
            debug!(objects = self.objects.len(), references = self.references.len(), "auto flush");
            self.flush().await?;
        }
        Ok(())
    }

    /// Sends objects, then references. An object error stops the flush.
    ///
    /// # Errors
    /// Any error of [`Batch::create_objects`] or [`Batch::create_references`].
    pub async fn flush(&mut self) -> Result<BatchResults> {
        let objects = self.create_objects().await?;
        let references = self.create_references().await?;
        Ok(BatchResults { objects, references })
    }

    /// Sends all buffered objects.
    ///
    /// On a send failure, or a reply that is not a JSON list, the objects
    /// are put back in the buffer. Per-item errors are raised as
    /// [`WeaveError::BatchObjectCreation`] unless `raise_on_item_error` is
    /// off; without an error the callback receives `(results, items)`.
    ///
    /// # Errors
    /// - [`WeaveError::BatchTimeout`] after exhausting timeout retries
    /// - [`WeaveError::Connection`] when the server cannot be reached
    /// - [`WeaveError::UnsuccessfulStatus`] for statuses other than 200
    /// - [`WeaveError::Serialization`] when a 200 reply cannot be parsed
    /// - [`WeaveError::BatchObjectCreation`] for per-item failures
    pub async fn create_objects(&mut self) -> Result<Vec<Value>> {
        if self.objects.is_empty() {
            return Ok(Vec::new());
        }
        let taken = std::mem::take(&mut self.objects);
        let prepared = taken.request_body().and_then(|body| Ok((body, taken.item_values()?)));
        let (body, items) = match prepared {
            Ok(prepared) => prepared,
            Err(err) => {
                self.objects.restore(taken);
                return Err(err);
            }
        };

        let response = match self.send(BatchKind::Objects, &body, taken.len()).await {
            Ok(response) => response,
            Err(err) => {
                self.objects.restore(taken);
                return Err(err);
            }
        };
        let results: Vec<Value> = match response.json() {
            Ok(results) => results,
            Err(err) => {
                self.objects.restore(taken);
                return Err(err.into());
            }
        };

        let config = self.controller.config();
        if config.raise_on_item_error && results.iter().any(has_item_error) {
            let err = WeaveError::BatchObjectCreation { results, items };
            warn!(error = %err, "batch reported object errors");
            return Err(err);
        }
        if let Some(callback) = &config.callback {
            callback(&results, &items);
        }
        Ok(results)
    }

    /// Sends all buffered references. References get no per-item checks.
    ///
    /// # Errors
    /// Same transport and status errors as [`Batch::create_objects`].
    pub async fn create_references(&mut self) -> Result<Vec<Value>> {
        if self.references.is_empty() {
            return Ok(Vec::new());
        }
        let taken = std::mem::take(&mut self.references);
        let body = match taken.request_body() {
            Ok(body) => body,
            Err(err) => {
                self.references.restore(taken);
                return Err(err);
            }
        };

        let parsed = match self.send(BatchKind::References, &body, taken.len()).await {
            Ok(response) => response.json().map_err(WeaveError::from),
            Err(err) => Err(err),
        };
        if parsed.is_err() {
            self.references.restore(taken);
        }
        parsed
    }

    /// POSTs one batch, retrying on timeouts, and records its latency.
    #[instrument(skip(self, body))]
    async fn send(&mut self, kind: BatchKind, body: &Value, item_count: usize) -> Result<HttpResponse> {
        let retries = self.controller.config().timeout_retries;
        let mut attempt: u32 = 0;

        loop {
            let started = Instant::now();
            match self.session.post(kind.path(), body).await {
                Ok(response) if response.status == 200 => {
                    let elapsed = started.elapsed().as_secs_f64();
                    let recommended = self.controller.record(kind, elapsed, item_count);
                    info!(elapsed_secs = elapsed, recommended, "batch sent");
                    return Ok(response);
                }
                Ok(response) => {
                    return Err(WeaveError::UnsuccessfulStatus {
                        context: format!("Create {kind} in batch"),
                        status: response.status,
                        body: response.body,
                    });
                }
                Err(WeaveError::Timeout(reason)) if attempt < retries => {
                    let delay = Duration::from_secs(2 * (u64::from(attempt) + 1));
                    warn!(
                        attempt = attempt + 1,
                        retries,
                        delay_secs = delay.as_secs(),
                        reason = %reason,
                        "batch request timed out, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(WeaveError::Timeout(_)) => {
                    return Err(WeaveError::BatchTimeout(format!(
                        "The '{kind}' creation was cancelled because it took longer than the \
                         configured timeout of {}s. Try reducing the batch size (currently \
                         {item_count}) to a lower value. Aim to, on average, complete batch \
                         request within less than 10s",
                        self.session.timeout().read().as_secs_f64()
                    )));
                }
                Err(WeaveError::Connection(reason)) => {
                    return Err(WeaveError::Connection(format!(
                        "Batch was not added to weaviate. {reason}"
                    )));
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Deletes every object of `class_name` matching `where_filter`.
    ///
    /// # Errors
    /// Returns [`WeaveError::InvalidInput`] for an empty class or a filter
    /// that is not an object, [`WeaveError::UnsuccessfulStatus`] for
    /// statuses other than 200.
    #[instrument(skip(self, where_filter))]
    pub async fn delete_objects(
        &self,
        class_name: &str,
        where_filter: &Value,
        output: DeleteOutput,
        dry_run: bool,
    ) -> Result<Value> {
        if class_name.trim().is_empty() {
            return Err(WeaveError::InvalidInput("'class_name' must be a non-empty string".to_string()));
        }
        if !where_filter.is_object() {
            return Err(WeaveError::InvalidInput(format!(
                "'where' filter must be a JSON object, given: {where_filter}"
            )));
        }

        let body = json!({
            "match": { "class": class_name, "where": where_filter },
            "output": output.as_str(),
            "dryRun": dry_run,
        });
        let response = self.session.delete(BatchKind::Objects.path(), Some(&body)).await?;
        if response.status != 200 {
            return Err(WeaveError::UnsuccessfulStatus {
                context: "Delete in batch".to_string(),
                status: response.status,
                body: response.body,
            });
        }
        Ok(response.json()?)
    }

    /// `(objects, references)` currently buffered.
    pub fn shape(&self) -> (usize, usize) {
        (self.objects.len(), self.references.len())
    }

    pub fn num_objects(&self) -> usize {
        self.objects.len()
    }

    pub fn num_references(&self) -> usize {
        self.references.len()
    }

    /// # Errors
    /// Returns [`WeaveError::IndexOutOfRange`] when there is no such item.
    pub fn pop_object(&mut self, index: Option<usize>) -> Result<ObjectItem> {
        self.objects.pop(index)
    }

    /// # Errors
    /// Returns [`WeaveError::IndexOutOfRange`] when there is no such item.
    pub fn pop_reference(&mut self, index: Option<usize>) -> Result<ReferenceItem> {
        self.references.pop(index)
    }

    pub fn clear_objects(&mut self) {
        self.objects.clear();
    }

    pub fn clear_references(&mut self) {
        self.references.clear();
    }

    pub fn objects(&self) -> &ObjectBatch {
        &self.objects
    }

    pub fn references(&self) -> &ReferenceBatch {
        &self.references
    }

    pub fn recommended_num_objects(&self) -> usize {
        self.controller.recommended_num_objects()
    }

    pub fn recommended_num_references(&self) -> usize {
        self.controller.recommended_num_references()
    }
}
