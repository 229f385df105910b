use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub publishing: PublishingConfig,
    #[serde(default)]
    pub monitoring: MonitoringConfig,
    #[serde(default)]
    pub watchdog: WatchdogConfig,
    #[serde(default)]
    pub backup: BackupConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    pub host: String,
    /// Dashboard assets served for any path the API does not claim.
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
}

fn default_port() -> u16 {
    5000
}

fn default_static_dir() -> String {
    "wwwroot".into()
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
    pub max_pool_size: u32,
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
}

fn default_retention_days() -> u32 {
    7
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PublishingConfig {
    /// Messages kept per dashboard subscriber before it starts lagging.
    pub broadcast_capacity: usize,
}

impl Default for PublishingConfig {
    fn default() -> Self {
        Self {
            broadcast_capacity: 64,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    pub sample_interval_ms: u64,
    /// Values returned by GET /api/stats/history.
    pub history_limit: u32,
    pub ssh_port: u16,
    /// Port probed for web liveness; the server's own port when unset.
    pub web_port: Option<u16>,
    pub probe_timeout_ms: u64,
    pub latency_target: String,
    pub latency_timeout_ms: u64,
    pub proc_root: String,
    pub sys_root: String,
    pub prune_interval_secs: u64,
    /// How often to log app stats (dashboard clients, samples, pruned rows) at INFO level.
    pub stats_log_interval_secs: u64,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            sample_interval_ms: 2000,
            history_limit: 100,
            ssh_port: 22,
            web_port: None,
            probe_timeout_ms: 100,
            latency_target: "1.1.1.1".into(),
            latency_timeout_ms: 1000,
            proc_root: "/proc".into(),
            sys_root: "/sys".into(),
            prune_interval_secs: 3600,
            stats_log_interval_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WatchdogConfig {
    pub interval_ms: u64,
    /// Substring of container names the watchdog heals.
    pub target: String,
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self {
            interval_ms: 5000,
            target: "paperless".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BackupConfig {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            program: "docker".into(),
            args: ["exec", "optilink-webserver-1", "document_exporter", "../export"]
                .map(String::from)
                .to_vec(),
        }
    }
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn web_port(&self) -> u16 {
        self.monitoring.web_port.unwrap_or(self.server.port)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        anyhow::ensure!(
            !self.database.path.is_empty(),
            "database.path must be non-empty"
        );
        anyhow::ensure!(
            self.database.max_pool_size > 0,
            "database.max_pool_size must be > 0, got {}",
            self.database.max_pool_size
        );
        anyhow::ensure!(
            self.database.retention_days > 0,
            "database.retention_days must be > 0, got {}",
            self.database.retention_days
        );
        anyhow::ensure!(
            self.publishing.broadcast_capacity > 0,
            "publishing.broadcast_capacity must be > 0, got {}",
            self.publishing.broadcast_capacity
        );
        anyhow::ensure!(
            self.monitoring.sample_interval_ms > 0,
            "monitoring.sample_interval_ms must be > 0, got {}",
            self.monitoring.sample_interval_ms
        );
        anyhow::ensure!(
            self.monitoring.history_limit > 0,
            "monitoring.history_limit must be > 0, got {}",
            self.monitoring.history_limit
        );
        anyhow::ensure!(
            self.monitoring.probe_timeout_ms > 0,
            "monitoring.probe_timeout_ms must be > 0, got {}",
            self.monitoring.probe_timeout_ms
        );
        anyhow::ensure!(
            self.monitoring.latency_timeout_ms > 0,
            "monitoring.latency_timeout_ms must be > 0, got {}",
            self.monitoring.latency_timeout_ms
        );
        anyhow::ensure!(
            !self.monitoring.latency_target.is_empty(),
            "monitoring.latency_target must be non-empty"
        );
        anyhow::ensure!(
            self.monitoring.prune_interval_secs > 0,
            "monitoring.prune_interval_secs must be > 0, got {}",
            self.monitoring.prune_interval_secs
        );
        anyhow::ensure!(
            self.monitoring.stats_log_interval_secs > 0,
            "monitoring.stats_log_interval_secs must be > 0, got {}",
            self.monitoring.stats_log_interval_secs
        );
        anyhow::ensure!(
            self.watchdog.interval_ms > 0,
            "watchdog.interval_ms must be > 0, got {}",
            self.watchdog.interval_ms
        );
        anyhow::ensure!(
            !self.watchdog.target.is_empty(),
            "watchdog.target must be non-empty"
        );
        anyhow::ensure!(
            !self.backup.program.is_empty(),
            "backup.program must be non-empty"
        );
        Ok(())
    }
}
