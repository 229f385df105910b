// Host readings via sysinfo plus Linux /proc and /sys readers

mod linux;
mod probe;

use crate::source::{DiskSectors, MemoryReading, MetricSource, NetBytes};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use sysinfo::{MemoryRefreshKind, Networks, System};
use tracing::instrument;

/// Where to read from and how long probes may take.
#[derive(Debug, Clone)]
pub struct SysinfoRepoConfig {
    pub proc_root: PathBuf,
    pub sys_root: PathBuf,
    pub probe_timeout: Duration,
    pub latency_target: String,
    pub latency_timeout: Duration,
}

impl Default for SysinfoRepoConfig {
    fn default() -> Self {
        Self {
            proc_root: PathBuf::from("/proc"),
            sys_root: PathBuf::from("/sys"),
            probe_timeout: Duration::from_millis(100),
            latency_target: "1.1.1.1".into(),
            latency_timeout: Duration::from_secs(1),
        }
    }
}

pub struct SysinfoRepo {
    sys: Arc<Mutex<System>>,
    networks: Arc<Mutex<Networks>>,
    config: SysinfoRepoConfig,
}

impl SysinfoRepo {
    pub fn new(config: SysinfoRepoConfig) -> Self {
        let mut sys = System::new();
        sys.refresh_memory_specifics(MemoryRefreshKind::nothing().with_ram());
        let networks = Networks::new_with_refreshed_list();
        Self {
            sys: Arc::new(Mutex::new(sys)),
            networks: Arc::new(Mutex::new(networks)),
            config,
        }
    }
}

#[async_trait]
impl MetricSource for SysinfoRepo {
    #[instrument(skip(self), fields(repo = "sysinfo", operation = "refresh"))]
    async fn refresh(&self) -> anyhow::Result<()> {
        let sys = self.sys.clone();
        let networks = self.networks.clone();
        tokio::task::spawn_blocking(move || {
            sys.lock()
                .map_err(|e| anyhow::anyhow!("sysinfo lock poisoned: {}", e))?
                .refresh_memory_specifics(MemoryRefreshKind::nothing().with_ram());
            networks
                .lock()
                .map_err(|e| anyhow::anyhow!("sysinfo networks lock poisoned: {}", e))?
                .refresh(true);
            Ok(())
        })
        .await
        .map_err(|e| anyhow::anyhow!("sysinfo task join: {}", e))?
    }

    async fn memory(&self) -> anyhow::Result<MemoryReading> {
        let sys = self
            .sys
            .lock()
            .map_err(|e| anyhow::anyhow!("sysinfo lock poisoned: {}", e))?;
        Ok(MemoryReading {
            total_bytes: sys.total_memory(),
            available_bytes: sys.available_memory(),
        })
    }

    async fn load_average(&self) -> anyhow::Result<f64> {
        let load = System::load_average().one;
        anyhow::ensure!(load.is_finite() && load >= 0.0, "invalid load average {}", load);
        Ok(load)
    }

    #[instrument(skip(self), fields(repo = "sysinfo", operation = "disk_sectors"))]
    async fn disk_sectors(&self) -> anyhow::Result<DiskSectors> {
        let proc_root = self.config.proc_root.clone();
        tokio::task::spawn_blocking(move || linux::read_diskstats(&proc_root))
            .await
            .map_err(|e| anyhow::anyhow!("diskstats task join: {}", e))?
    }

    async fn network_bytes(&self) -> anyhow::Result<NetBytes> {
        let networks = self
            .networks
            .lock()
            .map_err(|e| anyhow::anyhow!("sysinfo networks lock poisoned: {}", e))?;
        Ok(linux::sum_interface_bytes(networks.list().iter().map(
            |(name, data)| (name.as_str(), data.total_received(), data.total_transmitted()),
        )))
    }

    async fn cpu_temperature(&self) -> anyhow::Result<Option<i64>> {
        let sys_root = self.config.sys_root.clone();
        tokio::task::spawn_blocking(move || linux::read_cpu_temperature(&sys_root))
            .await
            .map_err(|e| anyhow::anyhow!("thermal task join: {}", e))?
    }

    async fn uptime_secs(&self) -> anyhow::Result<u64> {
        Ok(System::uptime())
    }

    async fn process_count(&self) -> anyhow::Result<u32> {
        let proc_root = self.config.proc_root.clone();
        tokio::task::spawn_blocking(move || linux::count_processes(&proc_root))
            .await
            .map_err(|e| anyhow::anyhow!("process count task join: {}", e))?
    }

    async fn port_open(&self, port: u16) -> bool {
        probe::port_open(port, self.config.probe_timeout).await
    }

    #[instrument(skip(self), fields(repo = "sysinfo", operation = "latency_ms"))]
    async fn latency_ms(&self) -> Option<u64> {
        probe::ping_latency_ms(&self.config.latency_target, self.config.latency_timeout).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_live_host() {
        let repo = SysinfoRepo::new(SysinfoRepoConfig::default());
        repo.refresh().await.unwrap();
        let memory = repo.memory().await.unwrap();
        assert!(memory.total_bytes > 0);
        assert!(memory.available_bytes <= memory.total_bytes);
        assert!(repo.load_average().await.unwrap() >= 0.0);
        assert!(repo.process_count().await.unwrap() > 0);
    }

    #[tokio::test]
    async fn missing_proc_root_is_a_reader_error() {
        let repo = SysinfoRepo::new(SysinfoRepoConfig {
            proc_root: PathBuf::from("/nonexistent-optilink-proc"),
            ..Default::default()
        });
        assert!(repo.disk_sectors().await.is_err());
        assert!(repo.process_count().await.is_err());
    }
}
