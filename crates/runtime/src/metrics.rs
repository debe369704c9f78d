//! Bring-up counters and latency instrumentation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

#[derive(Default)]
pub struct BringUpMetrics {
    local_attempts: AtomicU64,
    local_failures: AtomicU64,
    remote_attempts: AtomicU64,
    remote_failures: AtomicU64,
    timeouts: AtomicU64,
    fallbacks: AtomicU64,
    degraded_sessions: AtomicU64,
}

impl BringUpMetrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn inc_local_attempts(&self) {
        self.local_attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_local_failures(&self) {
        self.local_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_remote_attempts(&self) {
        self.remote_attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_remote_failures(&self) {
        self.remote_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_timeouts(&self) {
        self.timeouts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_fallbacks(&self) {
        self.fallbacks.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("avatar_runtime_fallback_count", 1);
    }

    pub fn inc_degraded_sessions(&self) {
        self.degraded_sessions.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("avatar_runtime_degraded_count", 1);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            local_attempts: self.local_attempts.load(Ordering::Relaxed),
            local_failures: self.local_failures.load(Ordering::Relaxed),
            remote_attempts: self.remote_attempts.load(Ordering::Relaxed),
            remote_failures: self.remote_failures.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            fallbacks: self.fallbacks.load(Ordering::Relaxed),
            degraded_sessions: self.degraded_sessions.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub local_attempts: u64,
    pub local_failures: u64,
    pub remote_attempts: u64,
    pub remote_failures: u64,
    pub timeouts: u64,
    pub fallbacks: u64,
    pub degraded_sessions: u64,
}

impl MetricsSnapshot {
    pub fn remote_success_rate(&self) -> f64 {
        if self.remote_attempts == 0 {
            return 1.0;
        }
        1.0 - (self.remote_failures as f64 / self.remote_attempts as f64)
    }
}

/// Records bring-up latency into the metrics facade on drop.
pub struct BringUpTimer {
    start: Instant,
}

impl BringUpTimer {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Drop for BringUpTimer {
    fn drop(&mut self) {
        let duration_ms = self.start.elapsed().as_secs_f64() * 1000.0;
        metrics::histogram!("avatar_runtime_bringup_latency", duration_ms);
    }
}
