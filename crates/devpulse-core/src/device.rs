use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub id: String,
    pub name: String,
    pub location: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A single liveness assertion. Only `timestamp` takes part in evaluation;
/// `created_at` is the storage write time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartbeatReport {
    pub id: String,
    pub device_id: String,
    pub timestamp: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Read-only snapshot of one device and the heartbeats loaded for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceHistory {
    #[serde(flatten)]
    pub device: Device,
    #[serde(default)]
    pub heartbeats: Vec<DateTime<Utc>>,
}

impl DeviceHistory {
    pub fn new(device: Device, heartbeats: Vec<DateTime<Utc>>) -> Self {
        Self { device, heartbeats }
    }

    pub fn from_reports(device: Device, reports: &[HeartbeatReport]) -> Self {
        let heartbeats = reports
            .iter()
            .filter(|report| report.device_id == device.id)
            .map(|report| report.timestamp)
            .collect();
        Self { device, heartbeats }
    }
}
