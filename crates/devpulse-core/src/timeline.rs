use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::TimelineConfig;
use crate::device::DeviceHistory;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceState {
    Online,
    Offline,
}

impl DeviceState {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceState::Online => "online",
            DeviceState::Offline => "offline",
        }
    }
}

impl fmt::Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// One maximal run of a single state, `[start_time, start_time + duration_ms)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interval {
    pub start_time: DateTime<Utc>,
    pub status: DeviceState,
    pub duration_ms: i64,
}

impl Interval {
    pub fn end_time(&self) -> DateTime<Utc> {
        self.start_time + TimeDelta::milliseconds(self.duration_ms)
    }

    pub fn is_online(&self) -> bool {
        self.status == DeviceState::Online
    }

    /// Strict half-open overlap; an empty interval never overlaps anything.
    pub fn overlaps(&self, window_start: DateTime<Utc>, window_end: DateTime<Utc>) -> bool {
        self.start_time < window_end && self.end_time() > window_start
    }
}

/// Collects run boundaries and turns them into intervals once `now` is known.
///
/// Transitions into the current state are ignored and a run that would end
/// where it started is dropped, so the output never holds two neighbouring
/// intervals with the same state.
struct TimelineBuilder {
    runs: Vec<(DateTime<Utc>, DeviceState)>,
}

impl TimelineBuilder {
    fn starting(at: DateTime<Utc>, state: DeviceState) -> Self {
        Self {
            runs: vec![(at, state)],
        }
    }

    fn transition(&mut self, at: DateTime<Utc>, state: DeviceState) {
        if let Some(&(last_at, last_state)) = self.runs.last() {
            if last_state == state {
                return;
            }
            if last_at == at {
                self.runs.pop();
                if matches!(self.runs.last(), Some(&(_, prev)) if prev == state) {
                    return;
                }
            }
        }
        self.runs.push((at, state));
    }

    fn finish(mut self, now: DateTime<Utc>) -> Vec<Interval> {
        if self.runs.len() > 1 && matches!(self.runs.last(), Some(&(at, _)) if at == now) {
            self.runs.pop();
        }

        let ends = self
            .runs
            .iter()
            .skip(1)
            .map(|(at, _)| *at)
            .chain(std::iter::once(now));

        self.runs
            .iter()
            .zip(ends)
            .map(|(&(start_time, status), end)| Interval {
                start_time,
                status,
                duration_ms: (end - start_time).num_milliseconds(),
            })
            .collect()
    }
}

/// Rebuilds the online/offline history of a device from `created_at` to `now`.
///
/// Heartbeats may arrive in any order and may repeat. Inputs outside
/// `[created_at, now]` are clamped into that range (and `now` is raised to
/// `created_at` if it precedes it), so durations are never negative.
pub fn reconstruct(
    created_at: DateTime<Utc>,
    heartbeats: &[DateTime<Utc>],
    config: &TimelineConfig,
    now: DateTime<Utc>,
) -> Vec<Interval> {
    let now = clamp_now(created_at, now);
    let beats = sorted_within(heartbeats, created_at, now);
    let timeout = config.timeout_delta();

    let (Some(&first), Some(&last)) = (beats.first(), beats.last()) else {
        return TimelineBuilder::starting(created_at, DeviceState::Offline).finish(now);
    };

    let mut builder = if first - created_at > timeout {
        let mut builder = TimelineBuilder::starting(created_at, DeviceState::Offline);
        builder.transition(first, DeviceState::Online);
        builder
    } else {
        TimelineBuilder::starting(created_at, DeviceState::Online)
    };

    for pair in beats.windows(2) {
        let (prev, curr) = (pair[0], pair[1]);
        if curr - prev > timeout {
            builder.transition(prev, DeviceState::Offline);
            builder.transition(curr, DeviceState::Online);
        }
    }

    if now - last > timeout {
        builder.transition(last, DeviceState::Offline);
    }

    builder.finish(now)
}

pub fn reconstruct_history(
    history: &DeviceHistory,
    config: &TimelineConfig,
    now: DateTime<Utc>,
) -> Vec<Interval> {
    reconstruct(history.device.created_at, &history.heartbeats, config, now)
}

pub fn online_millis(timeline: &[Interval]) -> i64 {
    timeline
        .iter()
        .filter(|interval| interval.is_online())
        .map(|interval| interval.duration_ms)
        .sum()
}

fn clamp_now(created_at: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    if now < created_at {
        warn!(%created_at, %now, "evaluation instant precedes device creation, clamping");
        return created_at;
    }
    now
}

fn sorted_within(
    heartbeats: &[DateTime<Utc>],
    created_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Vec<DateTime<Utc>> {
    let mut early = 0_usize;
    let mut late = 0_usize;

    let mut beats: Vec<DateTime<Utc>> = heartbeats
        .iter()
        .map(|&ts| {
            if ts < created_at {
                early += 1;
                created_at
            } else if ts > now {
                late += 1;
                now
            } else {
                ts
            }
        })
        .collect();

    if early > 0 || late > 0 {
        warn!(early, late, %created_at, %now, "heartbeats outside device lifetime, clamping");
    }

    beats.sort_unstable();
    beats
}
