// Docker container inventory and restarts via bollard

use crate::models::ContainerRecord;
use crate::watchdog::ContainerRuntime;
use async_trait::async_trait;
use bollard::Docker;
use bollard::models::ContainerSummary;
use bollard::query_parameters::{ListContainersOptions, RestartContainerOptions};
use tracing::instrument;

pub struct DockerRepo {
    docker: Docker,
}

impl DockerRepo {
    /// The socket is only touched on the first request.
    pub fn connect() -> anyhow::Result<Self> {
        let docker = Docker::connect_with_unix_defaults()?;
        Ok(Self { docker })
    }
}

#[async_trait]
impl ContainerRuntime for DockerRepo {
    #[instrument(skip(self), fields(repo = "docker", operation = "list_containers"))]
    async fn list_all(&self) -> anyhow::Result<Vec<ContainerRecord>> {
        let options = ListContainersOptions {
            all: true,
            ..Default::default()
        };
        let containers = self.docker.list_containers(Some(options)).await?;
        Ok(containers.iter().map(record_from_summary).collect())
    }

    #[instrument(skip(self), fields(repo = "docker", operation = "restart_container"))]
    async fn restart(&self, id: &str) -> anyhow::Result<()> {
        self.docker
            .restart_container(id, None::<RestartContainerOptions>)
            .await?;
        Ok(())
    }
}

/// Primary name without the leading `/`; `"Unknown"` when the daemon reports none.
pub fn record_from_summary(c: &ContainerSummary) -> ContainerRecord {
    let name = c
        .names
        .as_ref()
        .and_then(|n| n.first())
        .map(|n| n.trim_start_matches('/').to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "Unknown".to_string());
    let state = c.state.as_ref().map(|s| s.to_string()).unwrap_or_default();
    ContainerRecord {
        id: c.id.clone().unwrap_or_default(),
        name,
        state,
        status: c.status.clone().unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ContainerState;
    use bollard::models::ContainerSummaryStateEnum;

    #[test]
    fn summary_maps_name_state_and_status() {
        let summary = ContainerSummary {
            id: Some("abc123".into()),
            names: Some(vec!["/paperless-ngx".into(), "/alias".into()]),
            state: Some(ContainerSummaryStateEnum::EXITED),
            status: Some("Exited (137) 2 minutes ago".into()),
            ..Default::default()
        };
        let record = record_from_summary(&summary);
        assert_eq!(record.id, "abc123");
        assert_eq!(record.name, "paperless-ngx");
        assert_eq!(record.state, "exited");
        assert_eq!(record.state_kind(), ContainerState::Exited);
        assert_eq!(record.status, "Exited (137) 2 minutes ago");
    }

    #[test]
    fn missing_fields_fall_back() {
        let record = record_from_summary(&ContainerSummary::default());
        assert_eq!(record.name, "Unknown");
        assert_eq!(record.state, "");
        assert_eq!(record.state_kind(), ContainerState::Unknown);
        assert_eq!(record.status, "");
        assert_eq!(record.id, "");
    }

    #[test]
    fn running_state_maps() {
        let summary = ContainerSummary {
            names: Some(vec!["/redis".into()]),
            state: Some(ContainerSummaryStateEnum::RUNNING),
            ..Default::default()
        };
        assert_eq!(
            record_from_summary(&summary).state_kind(),
            ContainerState::Running
        );
    }
}
