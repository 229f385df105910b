// Dashboard notifications and the envelope for everything published to subscribers

use serde::{Deserialize, Serialize};

use super::{ContainerRecord, DeviceTelemetry, Sample};

pub const ICON_WARN: &str = "⚠";
pub const ICON_ALERT: &str = "⚡";
pub const ICON_OK: &str = "✔";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warn,
    Danger,
    Success,
}

/// Discrete event shown in the dashboard feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub icon: String,
    pub message: String,
    pub severity: Severity,
}

impl Notification {
    pub fn new(icon: &str, message: impl Into<String>, severity: Severity) -> Self {
        Self {
            icon: icon.to_string(),
            message: message.into(),
            severity,
        }
    }

    pub fn warn(icon: &str, message: impl Into<String>) -> Self {
        Self::new(icon, message, Severity::Warn)
    }

    pub fn danger(icon: &str, message: impl Into<String>) -> Self {
        Self::new(icon, message, Severity::Danger)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(ICON_OK, message, Severity::Success)
    }
}

/// Named message on the broadcast hub. JSON: `{"event": "<channel>", "data": ...}`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum HubMessage {
    Stats(Sample),
    Containers(Vec<ContainerRecord>),
    Event(Notification),
    Log(String),
    Telemetry(DeviceTelemetry),
}

impl HubMessage {
    /// Channel name, for logging.
    pub fn channel(&self) -> &'static str {
        match self {
            HubMessage::Stats(_) => "stats",
            HubMessage::Containers(_) => "containers",
            HubMessage::Event(_) => "event",
            HubMessage::Log(_) => "log",
            HubMessage::Telemetry(_) => "telemetry",
        }
    }
}
