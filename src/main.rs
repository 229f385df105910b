use anyhow::Result;
use optilink::*;
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(s) => s,
                Err(_) => {
                    let _ = tokio::signal::ctrl_c().await;
                    return;
                }
            };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let app_config = config::AppConfig::load()?;
    let (tx, _) =
        broadcast::channel::<models::HubMessage>(app_config.publishing.broadcast_capacity);

    let monitoring = &app_config.monitoring;
    let sysinfo_repo = Arc::new(sysinfo_repo::SysinfoRepo::new(
        sysinfo_repo::SysinfoRepoConfig {
            proc_root: monitoring.proc_root.clone().into(),
            sys_root: monitoring.sys_root.clone().into(),
            probe_timeout: std::time::Duration::from_millis(monitoring.probe_timeout_ms),
            latency_target: monitoring.latency_target.clone(),
            latency_timeout: std::time::Duration::from_millis(monitoring.latency_timeout_ms),
        },
    ));
    let docker_repo = Arc::new(docker_repo::DockerRepo::connect()?);
    let history_repo = Arc::new(
        history_repo::HistoryRepo::connect(
            &app_config.database.path,
            app_config.database.max_pool_size,
            app_config.database.retention_days,
        )
        .await?,
    );
    history_repo.init().await?;

    let ws_connections = Arc::new(AtomicUsize::new(0));
    let cancel = CancellationToken::new();

    let worker_handle = worker::spawn(
        worker::WorkerDeps {
            source: sysinfo_repo,
            store: history_repo.clone(),
            tx: tx.clone(),
            ws_connections: ws_connections.clone(),
            cancel: cancel.clone(),
        },
        worker::WorkerConfig {
            sample_interval_ms: monitoring.sample_interval_ms,
            ssh_port: monitoring.ssh_port,
            web_port: app_config.web_port(),
            stats_log_interval_secs: monitoring.stats_log_interval_secs,
            prune_interval_secs: monitoring.prune_interval_secs,
        },
    );
    let watchdog_handle = watchdog::spawn(
        watchdog::Watchdog::new(docker_repo, tx.clone(), app_config.watchdog.target.clone()),
        app_config.watchdog.interval_ms,
        cancel.clone(),
    );

    let backup = Arc::new(backup::BackupTrigger::from_config(&app_config.backup));
    let app = routes::app(
        tx,
        history_repo,
        backup,
        ws_connections,
        app_config.clone(),
    );
    let addr = format!("{}:{}", app_config.server.host, app_config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);

    let server_cancel = cancel.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::select! {
                _ = shutdown_signal() => tracing::info!("Received shutdown signal"),
                _ = server_cancel.cancelled() => {}
            }
        })
        .await?;

    cancel.cancel();
    let _ = worker_handle.await;
    let _ = watchdog_handle.await;
    tracing::info!("Shutdown complete");
    Ok(())
}
