//! The process-wide counter bag.

use crate::rolling::{RollingMetrics, RollingStats};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Instant;
use sysinfo::{Pid, ProcessesToUpdate, System};

/// History length: 288 samples at the 5-minute cadence covers 24 hours.
pub const HISTORY_SIZE: usize = 288;

/// Response times keep a shorter window, the last thousand requests.
const RESPONSE_TIME_WINDOW: usize = 1000;

/// Point-in-time view served by the metrics endpoints.
#[derive(Debug, Serialize)]
pub struct MonitorSnapshot {
    pub uptime_secs: u64,
    pub request_count: u64,
    pub error_count: u64,
    pub response_time_ms: RollingStats,
    pub memory_mb: RollingStats,
    pub peak_memory_mb: f64,
    pub cpu_percent: RollingStats,
    pub peak_cpu_percent: f64,
}

/// Shared metrics state. One instance per process; every field has its own
/// synchronisation so writers never contend across concerns.
pub struct SystemMonitor {
    started: Instant,
    request_count: AtomicU64,
    error_count: AtomicU64,
    response_times: RollingMetrics,
    memory_history: RollingMetrics,
    cpu_history: RollingMetrics,
    peak_memory_mb: Mutex<f64>,
    peak_cpu_percent: Mutex<f64>,
    probe: Mutex<ProcessProbe>,
}

struct ProcessProbe {
    system: System,
    pid: Option<Pid>,
}

impl SystemMonitor {
    pub fn new() -> Self {
        let pid = sysinfo::get_current_pid().ok();
        Self {
            started: Instant::now(),
            request_count: AtomicU64::new(0),
            error_count: AtomicU64::new(0),
            response_times: RollingMetrics::new(RESPONSE_TIME_WINDOW),
            memory_history: RollingMetrics::new(HISTORY_SIZE),
            cpu_history: RollingMetrics::new(HISTORY_SIZE),
            peak_memory_mb: Mutex::new(0.0),
            peak_cpu_percent: Mutex::new(0.0),
            probe: Mutex::new(ProcessProbe {
                system: System::new(),
                pid,
            }),
        }
    }

    /// Count one finished request and its wall time.
    pub fn increment_request(&self, response_time_ms: f64) {
        self.request_count.fetch_add(1, Ordering::Relaxed);
        self.response_times.add(response_time_ms);
    }

    /// Count one funnelled error.
    pub fn increment_error(&self) {
        self.error_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Probe the process and append to the memory and CPU histories.
    /// Called by the periodic sampler.
    pub fn sample(&self) {
        let (memory_mb, cpu_percent) = {
            let mut probe = self.probe.lock().unwrap();
            let Some(pid) = probe.pid else { return };
            probe
                .system
                .refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
            match probe.system.process(pid) {
                Some(process) => (
                    process.memory() as f64 / 1024.0 / 1024.0,
                    process.cpu_usage() as f64,
                ),
                None => return,
            }
        };

        self.memory_history.add(memory_mb);
        self.cpu_history.add(cpu_percent);

        let mut peak_memory = self.peak_memory_mb.lock().unwrap();
        if memory_mb > *peak_memory {
            *peak_memory = memory_mb;
        }
        drop(peak_memory);

        let mut peak_cpu = self.peak_cpu_percent.lock().unwrap();
        if cpu_percent > *peak_cpu {
            *peak_cpu = cpu_percent;
        }
    }

    pub fn request_count(&self) -> u64 {
        self.request_count.load(Ordering::Relaxed)
    }

    pub fn error_count(&self) -> u64 {
        self.error_count.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> MonitorSnapshot {
        MonitorSnapshot {
            uptime_secs: self.started.elapsed().as_secs(),
            request_count: self.request_count(),
            error_count: self.error_count(),
            response_time_ms: self.response_times.stats(),
            memory_mb: self.memory_history.stats(),
            peak_memory_mb: *self.peak_memory_mb.lock().unwrap(),
            cpu_percent: self.cpu_history.stats(),
            peak_cpu_percent: *self.peak_cpu_percent.lock().unwrap(),
        }
    }

    /// Full memory history for the admin dashboard.
    pub fn memory_history(&self) -> Vec<crate::rolling::MetricSnapshot> {
        self.memory_history.snapshot()
    }

    /// Full CPU history for the admin dashboard.
    pub fn cpu_history(&self) -> Vec<crate::rolling::MetricSnapshot> {
        self.cpu_history.snapshot()
    }
}

impl Default for SystemMonitor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let monitor = SystemMonitor::new();
        monitor.increment_request(12.5);
        monitor.increment_request(7.5);
        monitor.increment_error();

        let snapshot = monitor.snapshot();
        assert_eq!(snapshot.request_count, 2);
        assert_eq!(snapshot.error_count, 1);
        assert_eq!(snapshot.response_time_ms.avg, 10.0);
    }

    #[test]
    fn sample_populates_history() {
        let monitor = SystemMonitor::new();
        monitor.sample();
        // The probe may legitimately fail in constrained environments;
        // when it works there is exactly one sample per call.
        assert!(monitor.memory_history().len() <= 1);
    }
}
