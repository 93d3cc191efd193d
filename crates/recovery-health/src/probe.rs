use parking_lot::Mutex;
use serde::Serialize;
use std::fmt;
use sysinfo::{Disks, System};

/// Resource utilisation in percent (0-100).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ResourceUsage {
    pub memory_percent: f64,
    pub disk_percent: f64,
    pub cpu_percent: f64,
}

/// Source of resource utilisation samples.
pub trait ResourceProbe: Send + Sync {
    fn sample(&self) -> ResourceUsage;
}

/// Samples the host through `sysinfo`.
///
/// CPU usage is measured between two refreshes, so the first sample after
/// construction may read low.
pub struct SystemProbe {
    system: Mutex<System>,
}

impl SystemProbe {
    pub fn new() -> Self {
        let mut system = System::new();
        system.refresh_memory();
        system.refresh_cpu_usage();
        Self {
            system: Mutex::new(system),
        }
    }
}

impl Default for SystemProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SystemProbe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SystemProbe").finish_non_exhaustive()
    }
}

impl ResourceProbe for SystemProbe {
    fn sample(&self) -> ResourceUsage {
        let (memory_percent, cpu_percent) = {
            let mut system = self.system.lock();
            system.refresh_memory();
            system.refresh_cpu_usage();
            (
                percent(system.used_memory(), system.total_memory()),
                f64::from(system.global_cpu_usage()),
            )
        };

        let disks = Disks::new_with_refreshed_list();
        let (total, available) = disks.list().iter().fold((0u64, 0u64), |(total, available), disk| {
            (total + disk.total_space(), available + disk.available_space())
        });

        ResourceUsage {
            memory_percent,
            disk_percent: percent(total.saturating_sub(available), total),
            cpu_percent,
        }
    }
}

fn percent(used: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        used as f64 / total as f64 * 100.0
    }
}

/// Always reports the same usage. Useful in tests and on hosts where
/// sampling is not wanted.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticProbe {
    usage: ResourceUsage,
}

impl StaticProbe {
    pub fn new(memory_percent: f64, disk_percent: f64, cpu_percent: f64) -> Self {
        Self {
            usage: ResourceUsage {
                memory_percent,
                disk_percent,
                cpu_percent,
            },
        }
    }
}

impl ResourceProbe for StaticProbe {
    fn sample(&self) -> ResourceUsage {
        self.usage
    }
}
