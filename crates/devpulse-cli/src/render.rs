use std::fmt::Write as _;

use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use devpulse_core::{Dashboard, Device, DeviceReport, WindowCount, WindowPeriod};
use serde::Serialize;

use crate::OutputFormat;

pub fn print_devices(devices: &[Device], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Human => print!("{}", devices_table(devices)),
        _ => emit_all(devices, format)?,
    }
    Ok(())
}

pub fn print_statuses(reports: &[DeviceReport], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Human => print!("{}", status_table(reports)),
        _ => {
            let rows: Vec<_> = reports.iter().map(StatusRow::from).collect();
            emit_all(&rows, format)?;
        }
    }
    Ok(())
}

pub fn print_timeline(report: &DeviceReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Human => print!("{}", timeline_text(report)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
        OutputFormat::Ndjson => {
            for interval in &report.timeline {
                println!("{}", serde_json::to_string(interval)?);
            }
        }
    }
    Ok(())
}

pub fn print_dashboard(dashboard: &Dashboard, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Human => print!("{}", dashboard_text(dashboard)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(dashboard)?),
        OutputFormat::Ndjson => println!("{}", serde_json::to_string(dashboard)?),
    }
    Ok(())
}

pub fn print_windows(period: WindowPeriod, windows: &[WindowCount], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Human => print!("{}", windows_table(period, windows)),
        _ => emit_all(windows, format)?,
    }
    Ok(())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusRow<'a> {
    device_id: &'a str,
    name: &'a str,
    location: &'a str,
    #[serde(flatten)]
    summary: &'a devpulse_core::DeviceStatusSummary,
}

impl<'a> From<&'a DeviceReport> for StatusRow<'a> {
    fn from(report: &'a DeviceReport) -> Self {
        Self {
            device_id: &report.device.id,
            name: &report.device.name,
            location: &report.device.location,
            summary: &report.summary,
        }
    }
}

fn emit_all<T: Serialize>(items: &[T], format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Ndjson {
        for item in items {
            println!("{}", serde_json::to_string(item)?);
        }
    } else {
        println!("{}", serde_json::to_string_pretty(items)?);
    }
    Ok(())
}

pub(crate) fn devices_table(devices: &[Device]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:<16} {:<24} {:<16} {}", "ID", "NAME", "LOCATION", "CREATED");
    for device in devices {
        let _ = writeln!(
            out,
            "{:<16} {:<24} {:<16} {}",
            device.id,
            device.name,
            device.location,
            timestamp(device.created_at)
        );
    }
    out
}

pub(crate) fn status_table(reports: &[DeviceReport]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<16} {:<16} {:<8} {:>8} {:>8}  {}",
        "ID", "LOCATION", "STATUS", "UPTIME", "REPORTS", "LAST SEEN"
    );
    for report in reports {
        let summary = &report.summary;
        let _ = writeln!(
            out,
            "{:<16} {:<16} {:<8} {:>7.2}% {:>8}  {}",
            report.device.id,
            report.device.location,
            summary.status,
            summary.uptime_percentage,
            summary.total_reports,
            summary.last_seen.map(timestamp).unwrap_or_else(|| "never".to_string())
        );
    }
    out
}

pub(crate) fn timeline_text(report: &DeviceReport) -> String {
    let mut out = String::new();
    let summary = &report.summary;
    let _ = writeln!(out, "=== {} ({}) ===", report.device.name, report.device.id);
    let _ = writeln!(out, "Location:   {}", report.device.location);
    let _ = writeln!(
        out,
        "State:      status={} uptime={:.2}% reports={}",
        summary.status, summary.uptime_percentage, summary.total_reports
    );
    for interval in &report.timeline {
        let _ = writeln!(
            out,
            "  {:<8} {} -> {}  ({})",
            interval.status,
            timestamp(interval.start_time),
            timestamp(interval.end_time()),
            format_duration_ms(interval.duration_ms)
        );
    }
    out
}

pub(crate) fn dashboard_text(dashboard: &Dashboard) -> String {
    let mut out = String::new();
    let summary = &dashboard.summary;
    let _ = writeln!(out, "=== Fleet @ {} ===", timestamp(dashboard.generated_at));
    let _ = writeln!(
        out,
        "Devices:    total={} online={} offline={} average_uptime={:.2}%",
        summary.total_devices, summary.online_devices, summary.offline_devices, summary.average_uptime
    );
    if !dashboard.locations.is_empty() {
        let _ = writeln!(out, "Locations:");
        for location in &dashboard.locations {
            let _ = writeln!(
                out,
                "  {:<16} total={} online={} offline={}",
                location.location, location.total, location.online, location.offline
            );
        }
    }
    out.push_str(&status_table(&dashboard.devices));
    out
}

pub(crate) fn windows_table(period: WindowPeriod, windows: &[WindowCount]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "window={period}");
    let _ = writeln!(out, "{:<20} {:>7} {:>7} {:>7}", "START", "ONLINE", "OFFLINE", "TOTAL");
    for window in windows {
        let _ = writeln!(
            out,
            "{:<20} {:>7} {:>7} {:>7}",
            timestamp(window.window_start),
            window.online,
            window.offline,
            window.total
        );
    }
    out
}

fn timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub(crate) fn format_duration_ms(ms: i64) -> String {
    if ms < 1_000 {
        return format!("{ms}ms");
    }

    let total_secs = ms / 1_000;
    let days = total_secs / 86_400;
    let hours = (total_secs % 86_400) / 3_600;
    let minutes = (total_secs % 3_600) / 60;
    let seconds = total_secs % 60;

    [(days, "d"), (hours, "h"), (minutes, "m"), (seconds, "s")]
        .iter()
        .filter(|(value, _)| *value > 0)
        .map(|(value, unit)| format!("{value}{unit}"))
        .collect::<Vec<_>>()
        .join(" ")
}
