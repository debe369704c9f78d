//! System capacity probing for adaptive profile selection.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use sysinfo::{CpuRefreshKind, MemoryRefreshKind, RefreshKind, System};
use tracing::debug;

const BYTES_PER_GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Source of live system counters.
pub trait SystemMetrics: Send + Sync {
    fn cpu_count(&self) -> usize;

    fn available_memory_gib(&self) -> f64;
}

/// Reads counters through `sysinfo`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SysinfoMetrics;

impl SystemMetrics for SysinfoMetrics {
    fn cpu_count(&self) -> usize {
        let mut sys = System::new_with_specifics(
            RefreshKind::new().with_cpu(CpuRefreshKind::new()),
        );
        sys.refresh_cpu();
        match sys.cpus().len() {
            0 => num_cpus::get(),
            n => n,
        }
    }

    fn available_memory_gib(&self) -> f64 {
        let mut sys = System::new_with_specifics(
            RefreshKind::new().with_memory(MemoryRefreshKind::everything()),
        );
        sys.refresh_memory();
        sys.available_memory() as f64 / BYTES_PER_GIB
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapacityTier {
    Low,
    Medium,
    High,
}

impl CapacityTier {
    pub fn from_resources(cpu_count: usize, available_memory_gib: f64) -> Self {
        if cpu_count >= 8 && available_memory_gib >= 8.0 {
            CapacityTier::High
        } else if cpu_count >= 4 && available_memory_gib >= 4.0 {
            CapacityTier::Medium
        } else {
            CapacityTier::Low
        }
    }
}

impl fmt::Display for CapacityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CapacityTier::Low => "low",
            CapacityTier::Medium => "medium",
            CapacityTier::High => "high",
        };
        f.write_str(label)
    }
}

/// Point-in-time reading of the system counters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResourceSnapshot {
    pub cpu_count: usize,
    pub available_memory_gib: f64,
    pub tier: CapacityTier,
}

#[derive(Clone)]
pub struct ResourceProbe {
    metrics: Arc<dyn SystemMetrics>,
}

impl ResourceProbe {
    pub fn new(metrics: Arc<dyn SystemMetrics>) -> Self {
        Self { metrics }
    }

    pub fn system() -> Self {
        Self::new(Arc::new(SysinfoMetrics))
    }

    pub fn snapshot(&self) -> ResourceSnapshot {
        let cpu_count = self.metrics.cpu_count();
        let available_memory_gib = self.metrics.available_memory_gib();
        let tier = CapacityTier::from_resources(cpu_count, available_memory_gib);
        debug!(
            cpu_count,
            available_memory_gib,
            %tier,
            "Probed system capacity"
        );
        ResourceSnapshot {
            cpu_count,
            available_memory_gib,
            tier,
        }
    }

    pub fn classify(&self) -> CapacityTier {
        self.snapshot().tier
    }
}

impl Default for ResourceProbe {
    fn default() -> Self {
        Self::system()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    struct FixedMetrics {
        cpus: usize,
        mem_gib: f64,
    }

    impl SystemMetrics for FixedMetrics {
        fn cpu_count(&self) -> usize {
            self.cpus
        }

        fn available_memory_gib(&self) -> f64 {
            self.mem_gib
        }
    }

    fn probe(cpus: usize, mem_gib: f64) -> ResourceProbe {
        ResourceProbe::new(Arc::new(FixedMetrics { cpus, mem_gib }))
    }

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(probe(8, 8.0).classify(), CapacityTier::High);
        assert_eq!(probe(7, 8.0).classify(), CapacityTier::Medium);
        assert_eq!(probe(4, 4.0).classify(), CapacityTier::Medium);
        assert_eq!(probe(3, 4.0).classify(), CapacityTier::Low);
    }

    #[test]
    fn test_memory_gates_tier() {
        assert_eq!(probe(16, 7.9).classify(), CapacityTier::Medium);
        assert_eq!(probe(16, 3.5).classify(), CapacityTier::Low);
    }

    #[test]
    fn test_snapshot_carries_readings() {
        let snapshot = probe(6, 12.5).snapshot();
        assert_eq!(snapshot.cpu_count, 6);
        assert_eq!(snapshot.available_memory_gib, 12.5);
        assert_eq!(snapshot.tier, CapacityTier::Medium);
    }

    #[test]
    fn test_sysinfo_metrics_reads_something() {
        let metrics = SysinfoMetrics;
        assert!(metrics.cpu_count() >= 1);
        assert!(metrics.available_memory_gib() >= 0.0);
    }
}
