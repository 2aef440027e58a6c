use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::status::DeviceReport;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AggregateError {
    #[error("window width must be positive, got {0} ms")]
    InvalidWidth(i64),
    #[error("window boundary out of range: {0} ms")]
    OutOfRange(i64),
    #[error("unknown window period: {0}")]
    UnknownPeriod(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WindowPeriod {
    #[serde(rename = "5min")]
    FiveMinutes,
    #[serde(rename = "15min")]
    FifteenMinutes,
    #[serde(rename = "30min")]
    ThirtyMinutes,
    #[serde(rename = "1hour")]
    OneHour,
    #[serde(rename = "2hour")]
    TwoHours,
    #[serde(rename = "6hour")]
    SixHours,
    #[serde(rename = "1day")]
    OneDay,
}

impl WindowPeriod {
    pub const ALL: [WindowPeriod; 7] = [
        WindowPeriod::FiveMinutes,
        WindowPeriod::FifteenMinutes,
        WindowPeriod::ThirtyMinutes,
        WindowPeriod::OneHour,
        WindowPeriod::TwoHours,
        WindowPeriod::SixHours,
        WindowPeriod::OneDay,
    ];

    pub fn minutes(&self) -> i64 {
        match self {
            WindowPeriod::FiveMinutes => 5,
            WindowPeriod::FifteenMinutes => 15,
            WindowPeriod::ThirtyMinutes => 30,
            WindowPeriod::OneHour => 60,
            WindowPeriod::TwoHours => 120,
            WindowPeriod::SixHours => 360,
            WindowPeriod::OneDay => 1440,
        }
    }

    pub fn width(&self) -> TimeDelta {
        TimeDelta::minutes(self.minutes())
    }

    pub fn key(&self) -> &'static str {
        match self {
            WindowPeriod::FiveMinutes => "5min",
            WindowPeriod::FifteenMinutes => "15min",
            WindowPeriod::ThirtyMinutes => "30min",
            WindowPeriod::OneHour => "1hour",
            WindowPeriod::TwoHours => "2hour",
            WindowPeriod::SixHours => "6hour",
            WindowPeriod::OneDay => "1day",
        }
    }
}

impl fmt::Display for WindowPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.key())
    }
}

impl FromStr for WindowPeriod {
    type Err = AggregateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WindowPeriod::ALL
            .into_iter()
            .find(|period| period.key().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| AggregateError::UnknownPeriod(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowCount {
    pub window_start: DateTime<Utc>,
    pub online: usize,
    pub offline: usize,
    pub total: usize,
}

/// Counts online and offline devices per fixed-width window.
///
/// Windows are aligned to the Unix epoch and run from the earliest interval
/// start up to `now` rounded up to the next boundary. A device counts as
/// online in a window when any of its online intervals overlaps it; devices
/// that never reported are offline everywhere.
pub fn aggregate(
    reports: &[DeviceReport],
    width: TimeDelta,
    now: DateTime<Utc>,
) -> Result<Vec<WindowCount>, AggregateError> {
    let width_ms = width.num_milliseconds();
    if width_ms <= 0 {
        return Err(AggregateError::InvalidWidth(width_ms));
    }

    let Some(earliest) = reports
        .iter()
        .flat_map(|report| report.timeline.iter().map(|interval| interval.start_time))
        .min()
    else {
        return Ok(Vec::new());
    };

    let first_ms = earliest.timestamp_millis().div_euclid(width_ms) * width_ms;
    let now_ms = now.timestamp_millis();
    let end_ms = (now_ms.div_euclid(width_ms) + i64::from(now_ms.rem_euclid(width_ms) != 0))
        * width_ms;
    let end_ms = end_ms.max(first_ms + width_ms);

    let mut windows = Vec::new();
    let mut start_ms = first_ms;
    while start_ms < end_ms {
        let window_start = from_millis(start_ms)?;
        let window_end = from_millis(start_ms + width_ms)?;

        let online = reports
            .iter()
            .filter(|report| online_within(report, window_start, window_end))
            .count();

        windows.push(WindowCount {
            window_start,
            online,
            offline: reports.len() - online,
            total: reports.len(),
        });
        start_ms += width_ms;
    }

    Ok(windows)
}

fn online_within(report: &DeviceReport, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
    report.summary.total_reports > 0
        && report
            .timeline
            .iter()
            .any(|interval| interval.is_online() && interval.overlaps(start, end))
}

fn from_millis(ms: i64) -> Result<DateTime<Utc>, AggregateError> {
    DateTime::from_timestamp_millis(ms).ok_or(AggregateError::OutOfRange(ms))
}
