//! Batch strategy, rolling latency estimation and auto-flush decisions

use tracing::debug;
use weavelink_common::collections::RollingWindow;
use weavelink_domain::{BatchKind, Result};

use super::config::{BatchConfig, BatchConfigPatch, BatchStrategy};

/// Owns a [`BatchConfig`] and the per-item latency windows of both kinds.
#[derive(Debug)]
pub struct BatchController {
    config: BatchConfig,
    object_latencies: RollingWindow,
    reference_latencies: RollingWindow,
    recommended_objects: Option<usize>,
    recommended_references: Option<usize>,
}

impl BatchController {
    pub fn new(config: BatchConfig) -> Self {
        let mut controller = Self {
            object_latencies: RollingWindow::new(config.rolling_window_size),
            reference_latencies: RollingWindow::new(config.rolling_window_size),
            recommended_objects: None,
            recommended_references: None,
            config,
        };
        controller.seed_recommendations();
        controller
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Records one successful send of `item_count` items that took
    /// `elapsed_secs`, and returns the new recommended count for `kind`.
    ///
    /// Empty sends carry no latency information and are ignored.
    pub fn record(&mut self, kind: BatchKind, elapsed_secs: f64, item_count: usize) -> usize {
        if item_count == 0 {
            return self.recommended(kind);
        }
        #[allow(clippy::cast_precision_loss)]
        let per_item = elapsed_secs / item_count as f64;
        let target = self.config.target_latency_secs;

        let (window, recommended) = match kind {
            BatchKind::Objects => (&mut self.object_latencies, &mut self.recommended_objects),
            BatchKind::References => {
                (&mut self.reference_latencies, &mut self.recommended_references)
            }
        };
        window.push(per_item);
        if let Some(mean) = window.mean() {
            *recommended = Some(recommend(target, mean));
        }

        let count = self.recommended(kind);
        debug!(kind = %kind, elapsed_secs, item_count, recommended = count, "recorded batch latency");
        count
    }

    /// Whether buffers holding `objects` and `references` items must be
    /// flushed under the current strategy.
    pub fn should_auto_flush(&self, objects: usize, references: usize) -> bool {
        match self.config.strategy {
            BatchStrategy::Manual => false,
            BatchStrategy::Fixed(size) => objects + references >= size,
            BatchStrategy::Dynamic(_) => {
                objects >= self.recommended_num_objects()
                    || references >= self.recommended_num_references()
            }
        }
    }

    /// Merges `patch` into the configuration. On error nothing changes.
    ///
    /// # Errors
    /// Returns [`weavelink_domain::WeaveError::InvalidInput`] for
    /// non-positive sizes, latencies or window sizes.
    pub fn configure(&mut self, patch: &BatchConfigPatch) -> Result<()> {
        let config = self.config.merged(patch)?;
        if config.rolling_window_size != self.config.rolling_window_size {
            self.object_latencies.resize(config.rolling_window_size);
            self.reference_latencies.resize(config.rolling_window_size);
        }
        self.config = config;
        self.seed_recommendations();
        debug!(config = ?self.config, "batch reconfigured");
        Ok(())
    }

    /// Recommendations start at the dynamic size and are only seeded once;
    /// afterwards they follow measured latency.
    fn seed_recommendations(&mut self) {
        if let BatchStrategy::Dynamic(size) = self.config.strategy {
            self.recommended_objects.get_or_insert(size);
            self.recommended_references.get_or_insert(size);
        }
    }

    pub fn recommended(&self, kind: BatchKind) -> usize {
        match kind {
            BatchKind::Objects => self.recommended_num_objects(),
            BatchKind::References => self.recommended_num_references(),
        }
    }

    pub fn recommended_num_objects(&self) -> usize {
        self.recommended_objects.unwrap_or(1)
    }

    pub fn recommended_num_references(&self) -> usize {
        self.recommended_references.unwrap_or(1)
    }
}

/// `max(1, round(target / mean))`.
fn recommend(target_secs: f64, mean_per_item_secs: f64) -> usize {
    if mean_per_item_secs <= 0.0 {
        return usize::MAX;
    }
    let ratio = (target_secs / mean_per_item_secs).round();
    if ratio >= usize::MAX as f64 {
        return usize::MAX;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let count = ratio as usize;
    count.max(1)
}
