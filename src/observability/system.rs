//! Periodic process metrics sampler.

use std::sync::Arc;
use std::time::Duration;

use sysinfo::{Pid, System};
use tokio::sync::broadcast;
use tokio::time;

use crate::lifecycle::ShutdownReason;
use crate::observability::metrics::{self, MetricsExporter};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SystemSample {
    pub resident_memory_bytes: u64,
    pub virtual_memory_bytes: u64,
    pub cpu_usage_percent: f32,
    pub uptime_secs: u64,
}

pub struct SystemSampler {
    interval: Duration,
    exporter: Arc<dyn MetricsExporter>,
}

impl SystemSampler {
    pub fn new(interval: Duration, exporter: Arc<dyn MetricsExporter>) -> Self {
        Self { interval, exporter }
    }

    /// Refresh and read the stats of `pid`. `None` if the process is gone.
    pub fn sample(system: &mut System, pid: Pid) -> Option<SystemSample> {
        if !system.refresh_process(pid) {
            return None;
        }

        system.process(pid).map(|process| SystemSample {
            resident_memory_bytes: process.memory(),
            virtual_memory_bytes: process.virtual_memory(),
            cpu_usage_percent: process.cpu_usage(),
            uptime_secs: process.run_time(),
        })
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<ShutdownReason>) {
        let pid = match sysinfo::get_current_pid() {
            Ok(pid) => pid,
            Err(e) => {
                tracing::warn!(error = e, "System metrics unavailable on this platform");
                return;
            }
        };

        tracing::debug!(interval = ?self.interval, "System sampler starting");

        let mut system = System::new();
        let mut ticker = time::interval(self.interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Some(sample) = Self::sample(&mut system, pid) {
                        metrics::record_system_sample(&sample);
                    }
                    self.exporter.run_upkeep();
                }
                _ = shutdown.recv() => {
                    tracing::debug!("System sampler received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}
