#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

//! A fixed-capacity window of recent `f64` samples with a running mean.
//!
//! [`RollingWindow`] keeps the newest `capacity` samples in insertion order.
//! Pushing into a full window evicts the oldest sample first. The window can
//! be resized in place; shrinking drops the oldest samples and keeps the
//! newest ones.
//!
//! # Complexity
//! - `push`, `len`, `is_empty`, `capacity` are **O(1)**.
//! - `mean` is **O(n)** in the number of stored samples, which is bounded by
//!   the capacity.

use std::collections::VecDeque;

/// Fixed-capacity FIFO of latency samples.
///
/// # Examples
///
/// ```rust
/// use weavelink_common::collections::RollingWindow;
///
/// let mut window = RollingWindow::new(3);
/// window.push(1.0);
/// window.push(2.0);
/// window.push(3.0);
/// window.push(4.0); // evicts `1.0`
///
/// assert_eq!(window.samples().collect::<Vec<_>>(), vec![2.0, 3.0, 4.0]);
/// assert_eq!(window.mean(), Some(3.0));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct RollingWindow {
    samples: VecDeque<f64>,
    capacity: usize,
}

impl RollingWindow {
    /// Creates an empty window holding at most `capacity` samples.
    ///
    /// A capacity of zero is clamped to `1`.
    #[inline]
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self { samples: VecDeque::with_capacity(capacity), capacity }
    }

    /// Appends a sample, evicting the oldest one when the window is full.
    ///
    /// Non-finite samples are ignored so a single bad measurement cannot
    /// poison the mean.
    #[inline]
    pub fn push(&mut self, sample: f64) {
        if !sample.is_finite() {
            return;
        }
        if self.samples.len() >= self.capacity {
            let _ = self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    /// Arithmetic mean of the stored samples, `None` when empty.
    #[must_use]
    pub fn mean(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        #[allow(clippy::cast_precision_loss)]
        let count = self.samples.len() as f64;
        Some(self.samples.iter().sum::<f64>() / count)
    }

    /// Changes the capacity, keeping the newest samples.
    pub fn resize(&mut self, capacity: usize) {
        let capacity = capacity.max(1);
        while self.samples.len() > capacity {
            let _ = self.samples.pop_front();
        }
        self.capacity = capacity;
    }

    /// Number of stored samples.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns `true` when no sample has been recorded.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Maximum number of samples kept.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drops every sample, leaving the capacity unchanged.
    #[inline]
    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// Samples from oldest to newest.
    pub fn samples(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().copied()
    }
}

impl Default for RollingWindow {
    /// Five samples, the default batch latency window.
    fn default() -> Self {
        Self::new(5)
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for collections::rolling_window.
    use super::RollingWindow;

    /// Validates `RollingWindow::push` eviction order.
    ///
    /// Assertions:
    /// - Confirms only the newest three samples survive.
    /// - Confirms the mean follows the surviving samples.
    #[test]
    fn push_evicts_oldest_sample() {
        let mut window = RollingWindow::new(3);
        for sample in [10.0, 1.0, 2.0, 3.0] {
            window.push(sample);
        }

        assert_eq!(window.samples().collect::<Vec<_>>(), vec![1.0, 2.0, 3.0]);
        assert_eq!(window.mean(), Some(2.0));
    }

    #[test]
    fn empty_window_has_no_mean() {
        let window = RollingWindow::new(4);
        assert!(window.is_empty());
        assert_eq!(window.mean(), None);
    }

    /// Validates `RollingWindow::resize` for shrinking and growing.
    ///
    /// Assertions:
    /// - Ensures shrinking keeps the newest samples.
    /// - Ensures growing keeps every sample and accepts more.
    #[test]
    fn resize_keeps_newest_samples() {
        let mut window = RollingWindow::new(4);
        for sample in [1.0, 2.0, 3.0, 4.0] {
            window.push(sample);
        }

        window.resize(2);
        assert_eq!(window.samples().collect::<Vec<_>>(), vec![3.0, 4.0]);
        assert_eq!(window.capacity(), 2);

        window.resize(3);
        window.push(5.0);
        assert_eq!(window.samples().collect::<Vec<_>>(), vec![3.0, 4.0, 5.0]);
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let mut window = RollingWindow::new(0);
        window.push(1.0);
        window.push(2.0);
        assert_eq!(window.capacity(), 1);
        assert_eq!(window.samples().collect::<Vec<_>>(), vec![2.0]);
    }

    #[test]
    fn non_finite_samples_are_ignored() {
        let mut window = RollingWindow::new(3);
        window.push(f64::NAN);
        window.push(f64::INFINITY);
        window.push(0.5);
        assert_eq!(window.len(), 1);
        assert_eq!(window.mean(), Some(0.5));
    }
}
