//! Bounded history buffers feeding the live charts.

use std::collections::VecDeque;

use crate::types::{DaemonMetrics, ProcessFrame};

/// Samples kept per chart series; the oldest falls off first.
pub const CHART_CAPACITY: usize = 21;

pub fn push_capped<T>(dq: &mut VecDeque<T>, v: T, cap: usize) {
    if dq.len() == cap {
        dq.pop_front();
    }
    dq.push_back(v);
}

/// Fixed-capacity FIFO series of numeric samples. Memory stays bounded by
/// the capacity no matter how many samples have ever been pushed.
#[derive(Debug, Clone)]
pub struct MetricSeries {
    samples: VecDeque<f64>,
    cap: usize,
}

impl MetricSeries {
    pub fn new(cap: usize) -> Self {
        assert!(cap >= 1, "series capacity must be at least 1");
        Self {
            samples: VecDeque::with_capacity(cap),
            cap,
        }
    }

    /// Append a sample, evicting at most the single oldest one.
    pub fn push(&mut self, value: f64) {
        push_capped(&mut self.samples, value, self.cap);
    }

    /// Current samples, oldest first.
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().copied()
    }

    /// Most recent sample, or `None` before the first push.
    pub fn latest(&self) -> Option<f64> {
        self.samples.back().copied()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.cap
    }
}

/// Paired cpu/memory histories for one monitored process or daemon.
#[derive(Debug, Clone)]
pub struct StatsHistory {
    pub cpu: MetricSeries,
    pub memory: MetricSeries,
}

impl StatsHistory {
    pub fn new() -> Self {
        Self::with_capacity(CHART_CAPACITY)
    }

    pub fn with_capacity(cap: usize) -> Self {
        Self {
            cpu: MetricSeries::new(cap),
            memory: MetricSeries::new(cap),
        }
    }

    pub fn record_process(&mut self, frame: &ProcessFrame) {
        self.cpu.push(frame.stats.cpu_percent);
        self.memory.push(frame.stats.memory_usage.rss as f64);
    }

    // Absent readings chart as zero rather than gapping the series
    pub fn record_daemon(&mut self, frame: &DaemonMetrics) {
        self.cpu.push(frame.raw.cpu_percent.unwrap_or(0.0));
        self.memory.push(frame.raw.memory_usage.unwrap_or(0) as f64);
    }
}

impl Default for StatsHistory {
    fn default() -> Self {
        Self::new()
    }
}
