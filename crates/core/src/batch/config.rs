//! Batch configuration and partial reconfiguration

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use weavelink_domain::constants::{DEFAULT_ROLLING_WINDOW_SIZE, DEFAULT_TARGET_LATENCY_SECS};
use weavelink_domain::{BatchSettings, Result, WeaveError};

/// Called with `(results, items)` after an object batch was sent.
pub type BatchCallback = Arc<dyn Fn(&[Value], &[Value]) + Send + Sync>;

/// When a batch is flushed automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStrategy {
    /// Only explicit `flush`/`create_*` calls send data.
    Manual,
    /// Flush once objects plus references reach the size.
    Fixed(usize),
    /// Flush once either buffer reaches its latency-derived recommended
    /// count. The size seeds the recommendation.
    Dynamic(usize),
}

impl BatchStrategy {
    pub fn size(self) -> Option<usize> {
        match self {
            Self::Manual => None,
            Self::Fixed(size) | Self::Dynamic(size) => Some(size),
        }
    }

    pub fn is_dynamic(self) -> bool {
        matches!(self, Self::Dynamic(_))
    }

    pub fn is_manual(self) -> bool {
        matches!(self, Self::Manual)
    }
}

/// Complete configuration owned by one batch.
#[derive(Clone)]
pub struct BatchConfig {
    pub strategy: BatchStrategy,
    /// Desired duration of one batch request, in seconds.
    pub target_latency_secs: f64,
    pub timeout_retries: u32,
    pub rolling_window_size: usize,
    pub raise_on_item_error: bool,
    pub callback: Option<BatchCallback>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            strategy: BatchStrategy::Manual,
            target_latency_secs: DEFAULT_TARGET_LATENCY_SECS,
            timeout_retries: 0,
            rolling_window_size: DEFAULT_ROLLING_WINDOW_SIZE,
            raise_on_item_error: true,
            callback: None,
        }
    }
}

impl fmt::Debug for BatchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchConfig")
            .field("strategy", &self.strategy)
            .field("target_latency_secs", &self.target_latency_secs)
            .field("timeout_retries", &self.timeout_retries)
            .field("rolling_window_size", &self.rolling_window_size)
            .field("raise_on_item_error", &self.raise_on_item_error)
            .field("callback", &self.callback.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

impl BatchConfig {
    /// Builds a configuration from loaded settings.
    ///
    /// # Errors
    /// Returns [`WeaveError::InvalidInput`] for non-positive values.
    pub fn from_settings(settings: &BatchSettings) -> Result<Self> {
        let patch = BatchConfigPatch::new()
            .batch_size(settings.batch_size)
            .dynamic(settings.dynamic)
            .target_latency_secs(settings.target_latency_secs)
            .timeout_retries(settings.timeout_retries)
            .rolling_window_size(settings.rolling_window_size)
            .raise_on_item_error(settings.raise_on_item_error);
        Self::default().merged(&patch)
    }

    /// Applies the explicitly-set fields of `patch` to a copy of `self`.
    ///
    /// The size keeps its current value unless the patch sets it; the
    /// dynamic flag keeps the current strategy's unless the patch sets it.
    ///
    /// # Errors
    /// Returns [`WeaveError::InvalidInput`] for non-positive sizes,
    /// latencies or window sizes.
    pub fn merged(&self, patch: &BatchConfigPatch) -> Result<Self> {
        let size = patch.batch_size.unwrap_or_else(|| self.strategy.size());
        let dynamic = patch.dynamic.unwrap_or_else(|| self.strategy.is_dynamic());

        let strategy = match size {
            None => BatchStrategy::Manual,
            Some(0) => {
                return Err(WeaveError::InvalidInput(
                    "'batch_size' must be a positive integer, given: 0".to_string(),
                ));
            }
            Some(size) if dynamic => BatchStrategy::Dynamic(size),
            Some(size) => BatchStrategy::Fixed(size),
        };

        let target_latency_secs = patch.target_latency_secs.unwrap_or(self.target_latency_secs);
        if !target_latency_secs.is_finite() || target_latency_secs <= 0.0 {
            return Err(WeaveError::InvalidInput(format!(
                "'target_latency_secs' must be a positive number, given: {target_latency_secs}"
            )));
        }

        let rolling_window_size = patch.rolling_window_size.unwrap_or(self.rolling_window_size);
        if rolling_window_size == 0 {
            return Err(WeaveError::InvalidInput(
                "'rolling_window_size' must be a positive integer, given: 0".to_string(),
            ));
        }

        Ok(Self {
            strategy,
            target_latency_secs,
            timeout_retries: patch.timeout_retries.unwrap_or(self.timeout_retries),
            rolling_window_size,
            raise_on_item_error: patch.raise_on_item_error.unwrap_or(self.raise_on_item_error),
            callback: match &patch.callback {
                Some(callback) => callback.clone(),
                None => self.callback.clone(),
            },
        })
    }
}

/// Partial reconfiguration. Fields left unset keep their current value.
#[derive(Clone, Default)]
pub struct BatchConfigPatch {
    batch_size: Option<Option<usize>>,
    dynamic: Option<bool>,
    target_latency_secs: Option<f64>,
    timeout_retries: Option<u32>,
    rolling_window_size: Option<usize>,
    raise_on_item_error: Option<bool>,
    callback: Option<Option<BatchCallback>>,
}

impl BatchConfigPatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` switches the batch to manual mode.
    #[must_use]
    pub fn batch_size(mut self, size: Option<usize>) -> Self {
        self.batch_size = Some(size);
        self
    }

    #[must_use]
    pub fn dynamic(mut self, dynamic: bool) -> Self {
        self.dynamic = Some(dynamic);
        self
    }

    #[must_use]
    pub fn target_latency_secs(mut self, secs: f64) -> Self {
        self.target_latency_secs = Some(secs);
        self
    }

    #[must_use]
    pub fn timeout_retries(mut self, retries: u32) -> Self {
        self.timeout_retries = Some(retries);
        self
    }

    #[must_use]
    pub fn rolling_window_size(mut self, size: usize) -> Self {
        self.rolling_window_size = Some(size);
        self
    }

    #[must_use]
    pub fn raise_on_item_error(mut self, raise: bool) -> Self {
        self.raise_on_item_error = Some(raise);
        self
    }

    #[must_use]
    pub fn callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&[Value], &[Value]) + Send + Sync + 'static,
    {
        self.callback = Some(Some(Arc::new(callback)));
        self
    }

    /// Removes a previously configured callback.
    #[must_use]
    pub fn without_callback(mut self) -> Self {
        self.callback = Some(None);
        self
    }
}

impl fmt::Debug for BatchConfigPatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchConfigPatch")
            .field("batch_size", &self.batch_size)
            .field("dynamic", &self.dynamic)
            .field("target_latency_secs", &self.target_latency_secs)
            .field("timeout_retries", &self.timeout_retries)
            .field("rolling_window_size", &self.rolling_window_size)
            .field("raise_on_item_error", &self.raise_on_item_error)
            .field("callback", &self.callback.as_ref().map(|cb| cb.as_ref().map(|_| "<fn>")))
            .finish()
    }
}
