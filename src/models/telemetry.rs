// Device telemetry relayed from field devices to the dashboard

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceTelemetry {
    pub device_id: String,
    pub battery_level: i32,
    pub status: String,
}
