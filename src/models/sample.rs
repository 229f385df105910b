// Per-cycle host sample and the derived health labels

use serde::{Serialize, Serializer};

/// Qualitative health verdict, ordered best to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum HealthVerdict {
    Excellent,
    Good,
    Attention,
    Critical,
}

impl HealthVerdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthVerdict::Excellent => "Excellent",
            HealthVerdict::Good => "Good",
            HealthVerdict::Attention => "Attention",
            HealthVerdict::Critical => "Critical",
        }
    }
}

impl std::fmt::Display for HealthVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Discrete system-state label; only the highest-priority matching condition is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SystemState {
    #[serde(rename = "Service Failure")]
    ServiceFailure,
    #[serde(rename = "CPU Overload")]
    CpuOverload,
    #[serde(rename = "Memory Full")]
    MemoryFull,
    #[serde(rename = "Sustained Load")]
    SustainedLoad,
    Stable,
}

impl SystemState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SystemState::ServiceFailure => "Service Failure",
            SystemState::CpuOverload => "CPU Overload",
            SystemState::MemoryFull => "Memory Full",
            SystemState::SustainedLoad => "Sustained Load",
            SystemState::Stable => "Stable",
        }
    }
}

impl std::fmt::Display for SystemState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One sampling cycle's derived metrics (wire format for the `stats` channel).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Sample {
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
    pub memory_percent: f64,
    /// 1-minute load average.
    pub cpu_load: f64,
    pub ram_used_gb: f64,
    pub uptime: String,
    pub boot_time: String,
    /// KB/s
    pub net_in: f64,
    /// KB/s
    pub net_out: f64,
    pub total_in: String,
    pub total_out: String,
    /// MB/s
    pub disk_read_mb: f64,
    /// MB/s
    pub disk_write_mb: f64,
    #[serde(serialize_with = "temperature_or_unknown")]
    pub cpu_temp: Option<i64>,
    #[serde(rename = "ping", serialize_with = "latency_or_error")]
    pub latency_ms: Option<u64>,
    pub ssh_up: bool,
    pub web_up: bool,
    pub process_count: u32,
    pub health_score: u8,
    pub health_verdict: HealthVerdict,
    pub system_state: SystemState,
}

fn temperature_or_unknown<S: Serializer>(v: &Option<i64>, s: S) -> Result<S::Ok, S::Error> {
    match v {
        Some(t) => s.serialize_i64(*t),
        None => s.serialize_str("unknown"),
    }
}

fn latency_or_error<S: Serializer>(v: &Option<u64>, s: S) -> Result<S::Ok, S::Error> {
    match v {
        Some(ms) => s.serialize_u64(*ms),
        None => s.serialize_str("error"),
    }
}
