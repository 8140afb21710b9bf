//! The three metric kinds

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonically increasing integer
#[derive(Debug, Default)]
pub struct Counter {
    value: AtomicU64,
}

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&self) {
        self.add(1);
    }

    pub fn add(&self, n: u64) {
        self.value.fetch_add(n, Ordering::Relaxed);
    }

    pub fn value(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }

    pub(crate) fn reset(&self) {
        self.value.store(0, Ordering::Relaxed);
    }
}

/// Fraction of observations flagged true
#[derive(Debug, Default)]
pub struct Rate {
    // (trues, total) updated together so readers never see a torn pair
    counts: Mutex<(u64, u64)>,
}

impl Rate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&self, flag: bool) {
        let mut counts = self.counts.lock();
        if flag {
            counts.0 += 1;
        }
        counts.1 += 1;
    }

    /// `(trues, total)`
    pub fn counts(&self) -> (u64, u64) {
        *self.counts.lock()
    }

    /// Exactly 0.0 when nothing has been observed
    pub fn value(&self) -> f64 {
        let (trues, total) = self.counts();
        if total == 0 {
            0.0
        } else {
            trues as f64 / total as f64
        }
    }

    pub(crate) fn reset(&self) {
        *self.counts.lock() = (0, 0);
    }
}

/// Unordered multiset of numeric samples
#[derive(Debug, Default)]
pub struct Trend {
    samples: Mutex<Vec<f64>>,
}

impl Trend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one sample. NaN and infinities are dropped.
    pub fn add(&self, value: f64) {
        if value.is_finite() {
            self.samples.lock().push(value);
        }
    }

    pub fn len(&self) -> usize {
        self.samples.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn samples(&self) -> Vec<f64> {
        self.samples.lock().clone()
    }

    pub(crate) fn reset(&self) {
        self.samples.lock().clear();
    }
}
