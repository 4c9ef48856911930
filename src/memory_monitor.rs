//! Memory monitor (C12): process and system memory usage against configurable
//! warning/critical thresholds. Grounded on `utils/memory_monitor.py`. Built atop
//! `sysinfo`, refreshing only the current process and the global memory counters rather
//! than a full process-table scan, so the check stays cheap enough to call per request.

use std::collections::HashMap;
use sysinfo::{Pid, ProcessRefreshKind, RefreshKind, System};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

#[derive(Debug, Clone, Copy)]
pub struct ProcessMemory {
    pub rss_mb: f64,
    pub vms_mb: f64,
    pub percent_of_system: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct SystemMemory {
    pub total_mb: f64,
    pub available_mb: f64,
    pub used_mb: f64,
    pub percent: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct MemoryInfo {
    pub process: ProcessMemory,
    pub system: SystemMemory,
    /// `true` when the underlying OS facility could not report usage; all fields above
    /// are zeroed in that case, matching the corpus's graceful-degradation contract.
    pub monitoring_disabled: bool,
}

pub struct MemoryMonitor {
    warning_threshold_percent: f64,
    critical_threshold_percent: f64,
    system: std::sync::Mutex<System>,
    pid: Pid,
}

impl MemoryMonitor {
    pub fn new(warning_threshold_percent: f64, critical_threshold_percent: f64) -> Self {
        let system = System::new_with_specifics(
            RefreshKind::nothing().with_memory(sysinfo::MemoryRefreshKind::everything()),
        );
        Self {
            warning_threshold_percent,
            critical_threshold_percent,
            system: std::sync::Mutex::new(system),
            pid: sysinfo::get_current_pid().unwrap_or(Pid::from(0)),
        }
    }

    pub fn get_memory_info(&self) -> MemoryInfo {
        let mut system = self.system.lock().expect("memory monitor mutex poisoned");
        system.refresh_memory();
        system.refresh_processes_specifics(
            sysinfo::ProcessesToUpdate::Some(&[self.pid]),
            true,
            ProcessRefreshKind::nothing().with_memory(),
        );

        let total = system.total_memory();
        if total == 0 {
            return MemoryInfo {
                process: ProcessMemory { rss_mb: 0.0, vms_mb: 0.0, percent_of_system: 0.0 },
                system: SystemMemory { total_mb: 0.0, available_mb: 0.0, used_mb: 0.0, percent: 0.0 },
                monitoring_disabled: true,
            };
        }

        let used = system.used_memory();
        let available = system.available_memory();
        let system_percent = used as f64 / total as f64 * 100.0;

        let (rss_mb, vms_mb, process_percent) = match system.process(self.pid) {
            Some(p) => {
                let rss = p.memory() as f64 / BYTES_PER_MB;
                let vms = p.virtual_memory() as f64 / BYTES_PER_MB;
                let pct = if total > 0 { p.memory() as f64 / total as f64 * 100.0 } else { 0.0 };
                (rss, vms, pct)
            }
            None => (0.0, 0.0, 0.0),
        };

        MemoryInfo {
            process: ProcessMemory { rss_mb, vms_mb, percent_of_system: process_percent },
            system: SystemMemory {
                total_mb: total as f64 / BYTES_PER_MB,
                available_mb: available as f64 / BYTES_PER_MB,
                used_mb: used as f64 / BYTES_PER_MB,
                percent: system_percent,
            },
            monitoring_disabled: false,
        }
    }

    /// Returns `(needs_warning, message)`; an empty message means memory is healthy.
    pub fn check_memory_usage(&self) -> (bool, String) {
        let info = self.get_memory_info();
        if info.monitoring_disabled {
            return (false, String::new());
        }

        if info.system.percent >= self.critical_threshold_percent {
            return (
                true,
                format!(
                    "memory usage critical: system {:.1}%, process {:.1}MB",
                    info.system.percent, info.process.rss_mb
                ),
            );
        }
        if info.system.percent >= self.warning_threshold_percent {
            return (
                true,
                format!(
                    "memory usage high: system {:.1}%, process {:.1}MB",
                    info.system.percent, info.process.rss_mb
                ),
            );
        }
        (false, String::new())
    }

    /// Estimates memory use per named cache from entry counts and an average entry size,
    /// plus a `"total"` row and each cache's share of current process RSS.
    pub fn estimate_cache_memory(&self, cache_sizes: &HashMap<String, usize>, avg_entry_size_kb: f64) -> HashMap<String, f64> {
        let mut estimates = HashMap::new();
        let mut total_mb = 0.0;
        for (name, count) in cache_sizes {
            let size_mb = (*count as f64 * avg_entry_size_kb) / 1024.0;
            estimates.insert(name.clone(), size_mb);
            total_mb += size_mb;
        }
        estimates.insert("total".to_string(), total_mb);

        let process_mb = self.get_memory_info().process.rss_mb;
        let cache_percent = if process_mb > 0.0 { total_mb / process_mb * 100.0 } else { 0.0 };
        estimates.insert("cache_percent_of_process".to_string(), cache_percent);

        estimates
    }
}

pub fn format_memory_size(size_mb: f64) -> String {
    if size_mb < 1024.0 {
        format!("{size_mb:.1}MB")
    } else {
        format!("{:.1}GB", size_mb / 1024.0)
    }
}
