// Docker container inventory models

use serde::{Deserialize, Serialize};

/// Docker container lifecycle state, parsed from the daemon's state text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerState {
    Created,
    Running,
    Paused,
    Restarting,
    Exited,
    Removing,
    Dead,
    Unknown,
}

impl ContainerState {
    /// Parse from the Docker API state string. Matching is exact: "Exited" is not "exited".
    pub fn from_docker(s: &str) -> Self {
        match s {
            "created" => ContainerState::Created,
            "running" => ContainerState::Running,
            "paused" => ContainerState::Paused,
            "restarting" => ContainerState::Restarting,
            "exited" => ContainerState::Exited,
            "removing" => ContainerState::Removing,
            "dead" => ContainerState::Dead,
            _ => ContainerState::Unknown,
        }
    }
}

/// One container as seen in a watchdog cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerRecord {
    /// Runtime id, used to address restarts; not part of the published inventory.
    #[serde(skip)]
    pub id: String,
    pub name: String,
    /// State text exactly as the daemon reports it.
    pub state: String,
    /// Human status text, e.g. "Exited (0) 5 seconds ago".
    pub status: String,
}

impl ContainerRecord {
    pub fn state_kind(&self) -> ContainerState {
        ContainerState::from_docker(&self.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unrecognised_state_is_published_verbatim() {
        let record = ContainerRecord {
            id: "abc".into(),
            name: "paperless".into(),
            state: "hibernating".into(),
            status: "Up 2 hours".into(),
        };
        assert_eq!(record.state_kind(), ContainerState::Unknown);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "name": "paperless",
                "state": "hibernating",
                "status": "Up 2 hours"
            })
        );
    }

    #[test]
    fn state_match_is_exact() {
        let mut record = ContainerRecord {
            id: String::new(),
            name: "paperless".into(),
            state: "exited".into(),
            status: String::new(),
        };
        assert_eq!(record.state_kind(), ContainerState::Exited);
        record.state = "Exited".into();
        assert_eq!(record.state_kind(), ContainerState::Unknown);
    }
}
