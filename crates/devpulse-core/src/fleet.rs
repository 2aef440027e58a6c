use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{debug, info};

use crate::config::TimelineConfig;
use crate::device::DeviceHistory;
use crate::source::{HeartbeatSource, SourceError};
use crate::status::{self, round_percent, DeviceReport};
use crate::timeline::DeviceState;

pub const DEFAULT_REPORT_WINDOW: usize = 1000;

#[derive(Debug, Error)]
pub enum FleetError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("evaluation task failed: {0}")]
    Task(String),
}

#[derive(Debug, Clone)]
pub struct FleetOptions {
    /// Most recent heartbeats loaded per device.
    pub report_window: usize,
}

impl Default for FleetOptions {
    fn default() -> Self {
        Self {
            report_window: DEFAULT_REPORT_WINDOW,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FleetSummary {
    pub total_devices: usize,
    pub online_devices: usize,
    pub offline_devices: usize,
    pub average_uptime: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationStats {
    pub location: String,
    pub total: usize,
    pub online: usize,
    pub offline: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub generated_at: DateTime<Utc>,
    pub summary: FleetSummary,
    pub locations: Vec<LocationStats>,
    pub devices: Vec<DeviceReport>,
}

/// Loads every device from `source` and evaluates them all against the same
/// `now`. Reports come back in the source's device order.
pub async fn evaluate_fleet<S>(
    source: &S,
    config: &TimelineConfig,
    now: DateTime<Utc>,
    options: &FleetOptions,
) -> Result<Vec<DeviceReport>, FleetError>
where
    S: HeartbeatSource + ?Sized,
{
    let devices = source.list_devices().await?;
    let mut tasks = JoinSet::new();

    for (idx, device) in devices.into_iter().enumerate() {
        let heartbeats = source
            .recent_heartbeats(&device.id, options.report_window)
            .await?;
        debug!(device_id = %device.id, heartbeats = heartbeats.len(), "loaded heartbeats");

        let history = DeviceHistory::new(device, heartbeats);
        let config = config.clone();
        tasks.spawn_blocking(move || (idx, status::analyze(&history, &config, now)));
    }

    let mut reports = Vec::with_capacity(tasks.len());
    while let Some(joined) = tasks.join_next().await {
        let (idx, report) = joined.map_err(|err| FleetError::Task(err.to_string()))?;
        reports.push((idx, report));
    }
    reports.sort_by_key(|(idx, _)| *idx);

    let reports: Vec<DeviceReport> = reports.into_iter().map(|(_, report)| report).collect();
    info!(devices = reports.len(), %now, "fleet evaluated");
    Ok(reports)
}

pub fn summarize_fleet(reports: &[DeviceReport]) -> FleetSummary {
    let total_devices = reports.len();
    let online_devices = reports
        .iter()
        .filter(|report| report.summary.status == DeviceState::Online)
        .count();

    let average_uptime = if total_devices > 0 {
        let sum: f64 = reports
            .iter()
            .map(|report| report.summary.uptime_percentage)
            .sum();
        round_percent(sum / total_devices as f64)
    } else {
        0.0
    };

    FleetSummary {
        total_devices,
        online_devices,
        offline_devices: total_devices - online_devices,
        average_uptime,
    }
}

/// Per-location counts, in the order locations first appear.
pub fn location_stats(reports: &[DeviceReport]) -> Vec<LocationStats> {
    let mut stats: Vec<LocationStats> = Vec::new();

    for report in reports {
        let online = report.summary.status == DeviceState::Online;
        let idx = match stats
            .iter()
            .position(|entry| entry.location == report.device.location)
        {
            Some(idx) => idx,
            None => {
                stats.push(LocationStats {
                    location: report.device.location.clone(),
                    total: 0,
                    online: 0,
                    offline: 0,
                });
                stats.len() - 1
            }
        };

        let entry = &mut stats[idx];
        entry.total += 1;
        if online {
            entry.online += 1;
        } else {
            entry.offline += 1;
        }
    }

    stats
}

pub fn build_dashboard(reports: Vec<DeviceReport>, generated_at: DateTime<Utc>) -> Dashboard {
    Dashboard {
        generated_at,
        summary: summarize_fleet(&reports),
        locations: location_stats(&reports),
        devices: reports,
    }
}
