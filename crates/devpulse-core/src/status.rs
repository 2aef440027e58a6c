use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::TimelineConfig;
use crate::device::{Device, DeviceHistory};
use crate::timeline::{self, DeviceState, Interval};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceStatusSummary {
    pub status: DeviceState,
    pub last_seen: Option<DateTime<Utc>>,
    pub uptime_percentage: f64,
    pub total_reports: usize,
}

/// Everything computed for one device in a single evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceReport {
    pub device: Device,
    pub summary: DeviceStatusSummary,
    pub timeline: Vec<Interval>,
}

pub fn analyze(history: &DeviceHistory, config: &TimelineConfig, now: DateTime<Utc>) -> DeviceReport {
    let timeline = timeline::reconstruct_history(history, config, now);
    let summary = summarize(history, &timeline, config, now);

    debug!(
        device_id = %history.device.id,
        status = %summary.status,
        uptime = summary.uptime_percentage,
        intervals = timeline.len(),
        reports = summary.total_reports,
        "device evaluated"
    );

    DeviceReport {
        device: history.device.clone(),
        summary,
        timeline,
    }
}

pub fn evaluate(
    history: &DeviceHistory,
    config: &TimelineConfig,
    now: DateTime<Utc>,
) -> DeviceStatusSummary {
    let timeline = timeline::reconstruct_history(history, config, now);
    summarize(history, &timeline, config, now)
}

/// Derives the summary from an already reconstructed timeline of `history`.
pub fn summarize(
    history: &DeviceHistory,
    timeline: &[Interval],
    config: &TimelineConfig,
    now: DateTime<Utc>,
) -> DeviceStatusSummary {
    let last_seen = history.heartbeats.iter().max().copied();

    let status = match last_seen {
        Some(seen) if now - seen <= config.timeout_delta() => DeviceState::Online,
        _ => DeviceState::Offline,
    };

    let lifetime_ms = (now - history.device.created_at).num_milliseconds();
    let uptime_percentage = if lifetime_ms > 0 {
        let ratio = timeline::online_millis(timeline) as f64 / lifetime_ms as f64;
        round_percent(ratio * 100.0)
    } else {
        0.0
    };

    DeviceStatusSummary {
        status,
        last_seen,
        uptime_percentage,
        total_reports: history.heartbeats.len(),
    }
}

/// Two decimals, half-up, kept inside `[0, 100]`.
pub fn round_percent(value: f64) -> f64 {
    ((value * 100.0).round() / 100.0).clamp(0.0, 100.0)
}
