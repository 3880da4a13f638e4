//! Streaming mean/variance over a fixed set of features
//!
//! Each observation is a row of feature values. Statistics are updated in
//! O(width) per observation without rescanning history:
//!
//! - **Cumulative**: Welford's update while fewer than `window` rows have
//!   been seen (or forever, for an unbounded tracker).
//! - **Sliding window**: once the history holds `window` rows, each new row
//!   evicts the oldest and mean / sum of squared deviations are corrected for
//!   the row leaving and the row entering.
//!
//! Variance is the sample variance (`M2 / (n - 1)`, or `M2 / (W - 1)` once
//! windowed) and is undefined until two rows have been seen.
//!
//! Recorded values are `f32`; they are widened on entry and accumulated in
//! `f64`.

use std::collections::VecDeque;

/// Running statistics for a row of features
#[derive(Debug, Clone)]
pub struct RunningStats {
    width: usize,
    /// `None` for unbounded cumulative statistics
    window: Option<usize>,
    /// Most recent rows, oldest first (only kept in windowed mode)
    history: VecDeque<Vec<f64>>,
    count: u64,
    mean: Vec<f64>,
    m2: Vec<f64>,
}

impl RunningStats {
    /// Cumulative statistics over every observation
    pub fn unbounded(width: usize) -> Self {
        Self {
            width,
            window: None,
            history: VecDeque::new(),
            count: 0,
            mean: vec![0.0; width],
            m2: vec![0.0; width],
        }
    }

    /// Cumulative statistics that switch to a sliding window of `window`
    /// rows once that many have been seen
    ///
    /// # Panics
    ///
    /// Panics if `window < 2`.
    pub fn windowed(width: usize, window: usize) -> Self {
        assert!(window >= 2, "statistics window must hold at least two rows");
        Self {
            window: Some(window),
            history: VecDeque::with_capacity(window + 1),
            ..Self::unbounded(width)
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn window(&self) -> Option<usize> {
        self.window
    }

    /// Number of observations pushed so far
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Whether the sliding-window update is in effect
    pub fn is_windowed(&self) -> bool {
        self.window.is_some_and(|w| self.count > w as u64)
    }

    /// Rows currently retained for eviction
    pub fn history(&self) -> &VecDeque<Vec<f64>> {
        &self.history
    }

    /// Add one observation
    ///
    /// # Panics
    ///
    /// Panics if the row does not have exactly `width` values.
    pub fn push(&mut self, row: Vec<f64>) {
        assert_eq!(
            row.len(),
            self.width,
            "observation has {} features, expected {}",
            row.len(),
            self.width
        );
        self.count += 1;

        let Some(window) = self.window else {
            self.welford(&row);
            return;
        };

        if self.history.len() < window {
            self.welford(&row);
            self.history.push_back(row);
            return;
        }

        let oldest = self
            .history
            .pop_front()
            .expect("full history window is never empty");
        let w = window as f64;
        for (i, (&x, &x0)) in row.iter().zip(oldest.iter()).enumerate() {
            let old_mean = self.mean[i];
            self.mean[i] += (x - x0) / w;
            let mean = self.mean[i];
            self.m2[i] += (x - old_mean) * (x - mean) - (x0 - old_mean) * (x0 - mean);
        }
        self.history.push_back(row);
    }

    fn welford(&mut self, row: &[f64]) {
        let n = self.count as f64;
        for (i, &x) in row.iter().enumerate() {
            let delta = x - self.mean[i];
            self.mean[i] += delta / n;
            self.m2[i] += delta * (x - self.mean[i]);
        }
    }

    /// Number of rows the current statistics are computed over
    pub fn sample_size(&self) -> u64 {
        match self.window {
            Some(w) => self.count.min(w as u64),
            None => self.count,
        }
    }

    /// Mean of feature `index`, or `None` before the first observation
    pub fn mean(&self, index: usize) -> Option<f64> {
        (self.count > 0).then(|| self.mean[index])
    }

    /// Sample variance of feature `index`, or `None` before two observations
    pub fn variance(&self, index: usize) -> Option<f64> {
        let n = self.sample_size();
        (n >= 2).then(|| self.m2[index] / (n - 1) as f64)
    }

    /// Forget every observation
    pub fn reset(&mut self) {
        self.count = 0;
        self.history.clear();
        self.mean.iter_mut().for_each(|m| *m = 0.0);
        self.m2.iter_mut().for_each(|m| *m = 0.0);
    }
}
