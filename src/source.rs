// Raw host readings consumed by the sampling loop.

use async_trait::async_trait;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryReading {
    pub total_bytes: u64,
    pub available_bytes: u64,
}

impl MemoryReading {
    pub fn used_bytes(&self) -> u64 {
        self.total_bytes.saturating_sub(self.available_bytes)
    }
}

/// Cumulative 512-byte sectors over all physical block devices.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiskSectors {
    pub read: u64,
    pub written: u64,
}

/// Cumulative bytes over all non-loopback interfaces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NetBytes {
    pub received: u64,
    pub transmitted: u64,
}

/// Host probes. `refresh` runs once at the start of every cycle; a failure there abandons
/// the cycle. Individual readers may fail on their own, and the sampler substitutes a
/// neutral value for that one metric.
#[async_trait]
pub trait MetricSource: Send + Sync {
    async fn refresh(&self) -> anyhow::Result<()>;

    async fn memory(&self) -> anyhow::Result<MemoryReading>;

    /// 1-minute load average.
    async fn load_average(&self) -> anyhow::Result<f64>;

    async fn disk_sectors(&self) -> anyhow::Result<DiskSectors>;

    async fn network_bytes(&self) -> anyhow::Result<NetBytes>;

    /// Whole degrees Celsius; `None` when no package/ACPI sensor exists.
    async fn cpu_temperature(&self) -> anyhow::Result<Option<i64>>;

    async fn uptime_secs(&self) -> anyhow::Result<u64>;

    async fn process_count(&self) -> anyhow::Result<u32>;

    /// Local TCP liveness. Never fails; unreachable is `false`.
    async fn port_open(&self, port: u16) -> bool;

    /// ICMP round trip in milliseconds; `None` on timeout or error.
    async fn latency_ms(&self) -> Option<u64>;
}
