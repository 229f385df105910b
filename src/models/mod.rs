// Domain models pushed to dashboard subscribers

mod container;
mod event;
mod sample;
mod telemetry;

pub use container::{ContainerRecord, ContainerState};
pub use event::{HubMessage, ICON_ALERT, ICON_OK, ICON_WARN, Notification, Severity};
pub use sample::{HealthVerdict, Sample, SystemState};
pub use telemetry::DeviceTelemetry;
