//! Bounded metric history.

use chrono::Utc;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Mutex;

/// One sampled value.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct MetricSnapshot {
    /// Unix seconds at sample time.
    pub timestamp: i64,
    pub value: f64,
}

/// Summary over the whole window.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct RollingStats {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
    pub current: f64,
}

/// A fixed-size rolling window of samples. Appends evict the oldest;
/// readers get consistent copies.
pub struct RollingMetrics {
    data: Mutex<VecDeque<MetricSnapshot>>,
    max_size: usize,
}

impl RollingMetrics {
    pub fn new(max_size: usize) -> Self {
        Self {
            data: Mutex::new(VecDeque::with_capacity(max_size)),
            max_size,
        }
    }

    pub fn add(&self, value: f64) {
        let mut data = self.data.lock().unwrap();
        if data.len() == self.max_size {
            data.pop_front();
        }
        data.push_back(MetricSnapshot {
            timestamp: Utc::now().timestamp(),
            value,
        });
    }

    pub fn snapshot(&self) -> Vec<MetricSnapshot> {
        self.data.lock().unwrap().iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.data.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> RollingStats {
        let data = self.data.lock().unwrap();
        if data.is_empty() {
            return RollingStats::default();
        }
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;
        for snap in data.iter() {
            min = min.min(snap.value);
            max = max.max(snap.value);
            sum += snap.value;
        }
        RollingStats {
            min,
            max,
            avg: sum / data.len() as f64,
            current: data.back().map(|s| s.value).unwrap_or(0.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_oldest_at_capacity() {
        let metrics = RollingMetrics::new(3);
        for v in [1.0, 2.0, 3.0, 4.0] {
            metrics.add(v);
        }
        let values: Vec<f64> = metrics.snapshot().iter().map(|s| s.value).collect();
        assert_eq!(values, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn stats_over_window() {
        let metrics = RollingMetrics::new(10);
        for v in [2.0, 4.0, 6.0] {
            metrics.add(v);
        }
        let stats = metrics.stats();
        assert_eq!(stats.min, 2.0);
        assert_eq!(stats.max, 6.0);
        assert_eq!(stats.avg, 4.0);
        assert_eq!(stats.current, 6.0);
    }

    #[test]
    fn empty_window_reports_zeros() {
        let metrics = RollingMetrics::new(10);
        let stats = metrics.stats();
        assert_eq!(stats.min, 0.0);
        assert_eq!(stats.current, 0.0);
    }
}
