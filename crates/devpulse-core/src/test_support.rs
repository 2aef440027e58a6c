use chrono::{DateTime, TimeDelta, TimeZone, Utc};

use crate::device::{Device, DeviceHistory};
use crate::timeline::Interval;

pub const MINUTE_MS: i64 = 60_000;

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0)
        .single()
        .expect("valid date")
}

pub fn at(ms: i64) -> DateTime<Utc> {
    t0() + TimeDelta::milliseconds(ms)
}

pub fn device(id: &str, location: &str, created_ms: i64) -> Device {
    Device {
        id: id.to_string(),
        name: format!("{id}-name"),
        location: location.to_string(),
        created_at: at(created_ms),
        updated_at: at(created_ms),
    }
}

pub fn history(id: &str, created_ms: i64, beats_ms: &[i64]) -> DeviceHistory {
    DeviceHistory::new(
        device(id, "lab", created_ms),
        beats_ms.iter().map(|ms| at(*ms)).collect(),
    )
}

/// `(state, start_ms, duration_ms)` relative to `t0`, for compact assertions.
pub fn shape(timeline: &[Interval]) -> Vec<(&'static str, i64, i64)> {
    timeline
        .iter()
        .map(|interval| {
            (
                interval.status.as_str(),
                (interval.start_time - t0()).num_milliseconds(),
                interval.duration_ms,
            )
        })
        .collect()
}
