// Container watchdog: restarts exited target containers and publishes the inventory.

use crate::models::{ContainerRecord, ContainerState, HubMessage, ICON_ALERT, Notification};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::time::{Duration, MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Container runtime as seen by the watchdog.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Every container, stopped ones included.
    async fn list_all(&self) -> anyhow::Result<Vec<ContainerRecord>>;

    async fn restart(&self, id: &str) -> anyhow::Result<()>;
}

pub fn restarting_message(name: &str) -> String {
    format!("{} caiu. Reiniciando...", name)
}

pub fn recovered_message(name: &str) -> String {
    format!("{} recuperado com sucesso.", name)
}

pub struct Watchdog {
    runtime: Arc<dyn ContainerRuntime>,
    tx: broadcast::Sender<HubMessage>,
    target: String,
}

impl Watchdog {
    pub fn new(
        runtime: Arc<dyn ContainerRuntime>,
        tx: broadcast::Sender<HubMessage>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            runtime,
            tx,
            target: target.into(),
        }
    }

    fn needs_restart(&self, c: &ContainerRecord) -> bool {
        c.state_kind() == ContainerState::Exited && c.name.contains(&self.target)
    }

    fn publish(&self, msg: HubMessage) {
        let channel = msg.channel();
        if self.tx.send(msg).is_err() {
            tracing::debug!(channel, "No subscribers for watchdog message");
        }
    }

    /// One pass: heal matching exited containers, then publish the inventory as listed.
    /// A failed restart aborts the pass before the success event and the inventory.
    pub async fn run_cycle(&self) -> anyhow::Result<Vec<ContainerRecord>> {
        let containers = self.runtime.list_all().await?;

        for c in containers.iter().filter(|c| self.needs_restart(c)) {
            tracing::warn!(container = %c.name, "Target container exited, restarting");
            self.publish(HubMessage::Event(Notification::warn(
                ICON_ALERT,
                restarting_message(&c.name),
            )));
            self.runtime.restart(&c.id).await?;
            tracing::info!(container = %c.name, "Restart issued");
            self.publish(HubMessage::Event(Notification::success(recovered_message(
                &c.name,
            ))));
        }

        self.publish(HubMessage::Containers(containers.clone()));
        Ok(containers)
    }
}

pub fn spawn(
    watchdog: Watchdog,
    interval_ms: u64,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    let span = tracing::span!(tracing::Level::DEBUG, "watchdog", interval_ms);
    let task = async move {
        let mut tick = interval(Duration::from_millis(interval_ms));
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::debug!("Watchdog shutting down");
                    break;
                }
                _ = tick.tick() => {
                    if let Err(e) = watchdog.run_cycle().await {
                        tracing::warn!(
                            error = %e,
                            operation = "watchdog_cycle",
                            "Watchdog cycle failed"
                        );
                    }
                }
            }
        }
    };
    tokio::spawn(task.instrument(span))
}
