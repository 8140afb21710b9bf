//! Descriptive statistics over trend samples
//!
//! Percentiles use the nearest-rank method on ascending-sorted samples:
//! `rank = ceil(p / 100 * n)` clamped to `[1, n]`, and the percentile is the
//! sample at that rank. No interpolation happens, so every reported percentile
//! is an observed value.

use serde::{Deserialize, Serialize};

/// Nearest-rank percentile of `sorted`, which must be ascending.
///
/// Returns `None` for an empty slice.
pub fn percentile(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let n = sorted.len();
    let rank = (p / 100.0 * n as f64).ceil();
    let rank = if rank.is_nan() {
        1
    } else {
        (rank as usize).clamp(1, n)
    };
    Some(sorted[rank - 1])
}

/// Summary of a trend distribution
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendStats {
    pub count: u64,
    pub avg: f64,
    pub min: f64,
    pub max: f64,
    pub med: f64,
    pub p90: f64,
    pub p95: f64,
    pub p99: f64,
}

impl TrendStats {
    /// Stats of ascending-sorted samples, `None` when there are none
    pub fn from_sorted(sorted: &[f64]) -> Option<Self> {
        let first = *sorted.first()?;
        let last = *sorted.last()?;
        let sum: f64 = sorted.iter().sum();

        Some(Self {
            count: sorted.len() as u64,
            avg: sum / sorted.len() as f64,
            min: first,
            max: last,
            med: percentile(sorted, 50.0)?,
            p90: percentile(sorted, 90.0)?,
            p95: percentile(sorted, 95.0)?,
            p99: percentile(sorted, 99.0)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_to(n: u32) -> Vec<f64> {
        (1..=n).map(f64::from).collect()
    }

    #[test]
    fn test_nearest_rank_on_hundred_samples() {
        let samples = one_to(100);
        assert_eq!(percentile(&samples, 50.0), Some(50.0));
        assert_eq!(percentile(&samples, 95.0), Some(95.0));
        assert_eq!(percentile(&samples, 99.0), Some(99.0));
        assert_eq!(percentile(&samples, 100.0), Some(100.0));
    }

    #[test]
    fn test_nearest_rank_rounds_up() {
        // ceil(0.95 * 10) = 10
        let samples = one_to(10);
        assert_eq!(percentile(&samples, 95.0), Some(10.0));
        // ceil(0.5 * 5) = 3
        assert_eq!(percentile(&one_to(5), 50.0), Some(3.0));
    }

    #[test]
    fn test_rank_clamped() {
        let samples = vec![7.0];
        assert_eq!(percentile(&samples, 0.0), Some(7.0));
        assert_eq!(percentile(&samples, 150.0), Some(7.0));
        assert_eq!(percentile(&[], 95.0), None);
    }

    #[test]
    fn test_stats() {
        let stats = TrendStats::from_sorted(&one_to(100)).unwrap();
        assert_eq!(stats.count, 100);
        assert_eq!(stats.avg, 50.5);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 100.0);
        assert_eq!(stats.med, 50.0);
        assert_eq!(stats.p90, 90.0);
        assert!(TrendStats::from_sorted(&[]).is_none());
    }
}
