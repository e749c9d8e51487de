//! Resource usage of the bot process, sampled with `sysinfo`.

use std::sync::Mutex;

use disstat_client::ProcessUsage;
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

pub(crate) struct ProcessMetrics {
    system: Mutex<System>,
    pid: Option<Pid>,
}

impl ProcessMetrics {
    pub fn new() -> Self {
        let mut system = System::new();

        // CPU usage is a delta between two refreshes, the first one only sets the baseline
        system.refresh_cpu_usage();

        Self {
            system: Mutex::new(system),
            pid: sysinfo::get_current_pid().ok(),
        }
    }

    pub fn sample(&self) -> ProcessUsage {
        let Ok(mut system) = self.system.lock() else {
            return ProcessUsage::default();
        };

        system.refresh_memory();
        system.refresh_cpu_usage();

        let ram_usage = self.pid.and_then(|pid| {
            system.refresh_processes_specifics(
                ProcessesToUpdate::Some(&[pid]),
                true,
                ProcessRefreshKind::nothing().with_memory(),
            );

            system.process(pid).map(|process| process.memory())
        });

        // Resident memory of this process against the machine's total.
        ProcessUsage {
            ram_usage,
            total_ram: Some(system.total_memory()).filter(|total| *total > 0),
            cpu_usage: Some(system.global_cpu_usage()).filter(|usage| usage.is_finite()),
        }
    }
}
