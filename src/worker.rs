// Sampling loop: one host sample per tick, persisted, published and checked for events.

use crate::events::EventDetector;
use crate::format::{format_boot_time, format_bytes, format_uptime, round1};
use crate::health::{self, HealthInputs};
use crate::history_repo::MetricStore;
use crate::models::{HubMessage, Sample};
use crate::rate::RateState;
use crate::source::MetricSource;
use chrono::{DateTime, Local, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::broadcast;
use tokio::time::{Duration, Instant, MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Rate limit for "no receivers" logging (nobody on /ws/dashboard is the normal idle case)
const NO_RECEIVERS_WARN_INTERVAL: Duration = Duration::from_secs(60);

const SECTOR_BYTES: f64 = 512.0;
const KIB: f64 = 1024.0;
const MIB: f64 = 1024.0 * 1024.0;
const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Sources, sinks and shutdown for the sampling task.
pub struct WorkerDeps {
    pub source: Arc<dyn MetricSource>,
    pub store: Arc<dyn MetricStore>,
    pub tx: broadcast::Sender<HubMessage>,
    pub ws_connections: Arc<AtomicUsize>,
    pub cancel: CancellationToken,
}

/// Sampling cadence and housekeeping intervals.
/// Stats logging and pruning use real-time intervals, independent of sample_interval_ms.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub sample_interval_ms: u64,
    pub ssh_port: u16,
    pub web_port: u16,
    /// How often to log app stats (real seconds).
    pub stats_log_interval_secs: u64,
    /// How often to prune old history rows (real seconds).
    pub prune_interval_secs: u64,
}

/// Failed reader results become the type's neutral value.
fn or_neutral<T: Default>(result: anyhow::Result<T>, operation: &'static str) -> T {
    match result {
        Ok(v) => v,
        Err(e) => {
            tracing::debug!(error = %e, operation, "reader failed, using neutral value");
            T::default()
        }
    }
}

/// Owns the per-cycle state: counter baselines and event latches.
pub struct Sampler {
    source: Arc<dyn MetricSource>,
    store: Arc<dyn MetricStore>,
    tx: broadcast::Sender<HubMessage>,
    ssh_port: u16,
    web_port: u16,
    net: RateState<2>,
    disk: RateState<2>,
    events: EventDetector,
    last_no_receivers_warn: Option<Instant>,
}

impl Sampler {
    pub fn new(
        source: Arc<dyn MetricSource>,
        store: Arc<dyn MetricStore>,
        tx: broadcast::Sender<HubMessage>,
        config: &WorkerConfig,
    ) -> Self {
        let period = Duration::from_millis(config.sample_interval_ms);
        Self {
            source,
            store,
            tx,
            ssh_port: config.ssh_port,
            web_port: config.web_port,
            net: RateState::new(period),
            disk: RateState::new(period),
            events: EventDetector::new(),
            last_no_receivers_warn: None,
        }
    }

    /// Reads every metric once. Only a failed `refresh` fails the whole sample.
    pub async fn collect(&mut self, at: DateTime<Utc>) -> anyhow::Result<Sample> {
        self.source.refresh().await?;
        let now = Instant::now().into_std();

        let memory = or_neutral(self.source.memory().await, "memory");
        let load = or_neutral(self.source.load_average().await, "load_average");

        // A failed counter read leaves the baseline alone so the next good read still
        // measures against the last good one.
        let [disk_read, disk_write] = match self.source.disk_sectors().await {
            Ok(d) => self.disk.observe([d.read, d.written], now),
            Err(e) => {
                tracing::debug!(error = %e, operation = "disk_sectors", "reader failed, using neutral value");
                [0.0, 0.0]
            }
        };
        let (net_totals, [net_in, net_out]) = match self.source.network_bytes().await {
            Ok(n) => (n, self.net.observe([n.received, n.transmitted], now)),
            Err(e) => {
                tracing::debug!(error = %e, operation = "network_bytes", "reader failed, using neutral value");
                (Default::default(), [0.0, 0.0])
            }
        };

        let cpu_temp = or_neutral(self.source.cpu_temperature().await, "cpu_temperature");
        let uptime_secs = or_neutral(self.source.uptime_secs().await, "uptime_secs");
        let process_count = or_neutral(self.source.process_count().await, "process_count");

        let (ssh_up, web_up, latency_ms) = tokio::join!(
            self.source.port_open(self.ssh_port),
            self.source.port_open(self.web_port),
            self.source.latency_ms(),
        );

        let memory_percent = if memory.total_bytes == 0 {
            0.0
        } else {
            round1(memory.used_bytes() as f64 / memory.total_bytes as f64 * 100.0)
        };

        let (health_score, health_verdict, system_state) = health::evaluate(&HealthInputs {
            load,
            ram_percent: memory_percent,
            ssh_up,
            web_up,
        });

        Ok(Sample {
            timestamp: u64::try_from(at.timestamp_millis()).unwrap_or(0),
            memory_percent,
            cpu_load: load,
            ram_used_gb: memory.used_bytes() as f64 / GIB,
            uptime: format_uptime(uptime_secs),
            boot_time: format_boot_time(at.with_timezone(&Local), uptime_secs),
            net_in: round1(net_in / KIB),
            net_out: round1(net_out / KIB),
            total_in: format_bytes(net_totals.received),
            total_out: format_bytes(net_totals.transmitted),
            disk_read_mb: round1(disk_read * SECTOR_BYTES / MIB),
            disk_write_mb: round1(disk_write * SECTOR_BYTES / MIB),
            cpu_temp,
            latency_ms,
            ssh_up,
            web_up,
            process_count,
            health_score,
            health_verdict,
            system_state,
        })
    }

    /// Collect, persist (best effort), publish the sample, then publish its events.
    pub async fn run_cycle(&mut self) -> anyhow::Result<Sample> {
        let at = Utc::now();
        let sample = self.collect(at).await?;

        if let Err(e) = self.store.append_load(at, sample.cpu_load).await {
            tracing::debug!(
                error = %e,
                operation = "append_load",
                "Failed to persist load sample"
            );
        }

        self.publish(HubMessage::Stats(sample.clone()));
        for event in self.events.observe_sample(&sample) {
            tracing::info!(text = %event.message, severity = ?event.severity, "Host event");
            self.publish(HubMessage::Event(event));
        }
        Ok(sample)
    }

    fn publish(&mut self, msg: HubMessage) {
        let channel = msg.channel();
        if self.tx.send(msg).is_err() {
            let should_warn = self
                .last_no_receivers_warn
                .is_none_or(|t| t.elapsed() >= NO_RECEIVERS_WARN_INTERVAL);
            if should_warn {
                tracing::debug!(
                    operation = "broadcast",
                    channel,
                    "No active WebSocket clients; broadcast channel has no receivers"
                );
                self.last_no_receivers_warn = Some(Instant::now());
            }
        }
    }
}

pub fn spawn(deps: WorkerDeps, config: WorkerConfig) -> tokio::task::JoinHandle<()> {
    let WorkerDeps {
        source,
        store,
        tx,
        ws_connections,
        cancel,
    } = deps;

    let mut sampler = Sampler::new(source, store.clone(), tx, &config);
    let sample_interval = Duration::from_millis(config.sample_interval_ms);
    let stats_log_interval = Duration::from_secs(config.stats_log_interval_secs);
    let prune_interval = Duration::from_secs(config.prune_interval_secs);

    let span = tracing::span!(
        tracing::Level::DEBUG,
        "worker",
        sample_interval_ms = config.sample_interval_ms
    );
    let task = async move {
        let mut tick = interval(sample_interval);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut stats_log_tick = interval(stats_log_interval);
        stats_log_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut prune_tick = interval(prune_interval);
        prune_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut samples_total: u64 = 0;
        let mut rows_pruned_total: u64 = 0;

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::debug!("Worker shutting down");
                    break;
                }
                _ = tick.tick() => {
                    match sampler.run_cycle().await {
                        Ok(_) => samples_total += 1,
                        Err(e) => tracing::warn!(
                            error = %e,
                            operation = "sample_cycle",
                            "Sampling cycle failed"
                        ),
                    }
                }
                _ = stats_log_tick.tick() => {
                    tracing::info!(
                        ws_dashboard_clients = ws_connections.load(Ordering::Relaxed),
                        samples_total,
                        rows_pruned_total,
                        "app stats"
                    );
                }
                _ = prune_tick.tick() => {
                    match store.prune_old_data().await {
                        Ok(n) => {
                            tracing::debug!(operation = "prune_old_data", rows = n, "Old data pruned");
                            rows_pruned_total += n;
                        }
                        Err(e) => tracing::warn!(
                            error = %e,
                            operation = "prune_old_data",
                            "Failed to prune old data"
                        ),
                    }
                }
            }
        }
    };
    tokio::spawn(task.instrument(span))
}
