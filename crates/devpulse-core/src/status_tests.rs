use crate::config::TimelineConfig;
use crate::device::{DeviceHistory, HeartbeatReport};
use crate::status::{analyze, evaluate, round_percent};
use crate::test_support::{at, history, MINUTE_MS};
use crate::timeline::DeviceState;

fn config() -> TimelineConfig {
    TimelineConfig::default()
}

#[test]
fn device_without_reports_is_offline_with_zero_uptime() {
    // Arrange
    let history = history("dev-1", 0, &[]);

    // Act
    let summary = evaluate(&history, &config(), at(3_600_000));

    // Assert
    assert_eq!(summary.status, DeviceState::Offline);
    assert_eq!(summary.last_seen, None);
    assert_eq!(summary.uptime_percentage, 0.0);
    assert_eq!(summary.total_reports, 0);
}

#[test]
fn recent_single_heartbeat_is_online() {
    // Arrange
    let history = history("dev-1", 0, &[MINUTE_MS]);

    // Act
    let summary = evaluate(&history, &config(), at(2 * MINUTE_MS));

    // Assert
    assert_eq!(summary.status, DeviceState::Online);
    assert_eq!(summary.last_seen, Some(at(MINUTE_MS)));
    assert_eq!(summary.uptime_percentage, 100.0);
    assert_eq!(summary.total_reports, 1);
}

#[test]
fn scenario_fixture_summary() {
    // Arrange
    let history = history("dev-1", 0, &[0, 400_000]);

    // Act
    let report = analyze(&history, &config(), at(500_000));

    // Assert
    assert_eq!(report.summary.status, DeviceState::Online);
    assert_eq!(report.summary.last_seen, Some(at(400_000)));
    assert_eq!(report.summary.uptime_percentage, 20.0);
    assert_eq!(report.summary.total_reports, 2);
    assert_eq!(report.timeline.len(), 2);
    assert_eq!(report.device.id, "dev-1");
}

#[test]
fn status_flips_to_offline_one_ms_past_timeout() {
    // Arrange
    let history = history("dev-1", 0, &[0, 60_000]);

    // Act
    let at_limit = evaluate(&history, &config(), at(60_000 + 300_000));
    let past_limit = evaluate(&history, &config(), at(60_000 + 300_001));

    // Assert
    assert_eq!(at_limit.status, DeviceState::Online);
    assert_eq!(past_limit.status, DeviceState::Offline);
}

#[test]
fn uptime_is_rounded_to_two_decimals() {
    // Arrange: online for 1 of 3 hours.
    let history = history("dev-1", 0, &[0, 60 * MINUTE_MS]);
    let config = TimelineConfig::with_timeout_ms((60 * MINUTE_MS) as u64);

    // Act
    let summary = evaluate(&history, &config, at(180 * MINUTE_MS + 1));

    // Assert
    assert_eq!(summary.status, DeviceState::Offline);
    assert_eq!(summary.uptime_percentage, 33.33);
}

#[test]
fn duplicate_heartbeats_still_count_as_reports() {
    // Arrange
    let history = history("dev-1", 0, &[30_000, 30_000, 30_000]);

    // Act
    let summary = evaluate(&history, &config(), at(60_000));

    // Assert
    assert_eq!(summary.total_reports, 3);
    assert_eq!(summary.uptime_percentage, 100.0);
}

#[test]
fn zero_lifetime_has_zero_uptime() {
    // Arrange
    let history = history("dev-1", 0, &[0]);

    // Act
    let summary = evaluate(&history, &config(), at(0));

    // Assert
    assert_eq!(summary.status, DeviceState::Online);
    assert_eq!(summary.uptime_percentage, 0.0);
}

#[test]
fn now_before_creation_has_zero_uptime() {
    // Arrange
    let history = history("dev-1", 100_000, &[]);

    // Act
    let summary = evaluate(&history, &config(), at(0));

    // Assert
    assert_eq!(summary.status, DeviceState::Offline);
    assert_eq!(summary.uptime_percentage, 0.0);
}

#[test]
fn round_percent_rounds_half_up_and_bounds() {
    assert_eq!(round_percent(12.345_6), 12.35);
    assert_eq!(round_percent(0.125), 0.13);
    assert_eq!(round_percent(100.000_1), 100.0);
    assert_eq!(round_percent(-0.5), 0.0);
}

#[test]
fn summary_serializes_with_camel_case_keys() {
    // Arrange
    let history = history("dev-1", 0, &[0]);
    let summary = evaluate(&history, &config(), at(60_000));

    // Act
    let json = serde_json::to_value(&summary).expect("serialize");

    // Assert
    assert_eq!(json["status"], "online");
    assert_eq!(json["uptimePercentage"], 100.0);
    assert_eq!(json["totalReports"], 1);
    assert!(json["lastSeen"].is_string());
}

#[test]
fn history_from_reports_keeps_only_own_timestamps() {
    // Arrange
    let owner = crate::test_support::device("dev-1", "lab", 0);
    let report = |id: &str, device_id: &str, ms: i64| HeartbeatReport {
        id: id.to_string(),
        device_id: device_id.to_string(),
        timestamp: at(ms),
        created_at: at(ms + 5),
    };
    let reports = vec![
        report("r1", "dev-1", 1_000),
        report("r2", "dev-2", 2_000),
        report("r3", "dev-1", 3_000),
    ];

    // Act
    let history = DeviceHistory::from_reports(owner, &reports);
    let summary = evaluate(&history, &config(), at(4_000));

    // Assert
    assert_eq!(history.heartbeats, vec![at(1_000), at(3_000)]);
    assert_eq!(summary.total_reports, 2);
    assert_eq!(summary.last_seen, Some(at(3_000)));
}
