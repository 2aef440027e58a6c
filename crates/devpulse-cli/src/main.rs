use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use devpulse_core::fleet::{self, FleetOptions, DEFAULT_REPORT_WINDOW};
use devpulse_core::{
    aggregate, analyze, evaluate_fleet, DeviceHistory, HeartbeatSource, SnapshotFileSource,
    TimelineConfig, WindowPeriod,
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

mod render;

#[derive(Debug, Parser)]
#[command(name = "devpulse")]
#[command(about = "Device heartbeat timelines, status and uptime (read-only)")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Heartbeat snapshot exported by the storage layer.
    #[arg(long, default_value = "./data/heartbeats.json")]
    source: String,

    /// Longest silence still counted as online. Falls back to
    /// HEALTH_MAX_TIMEOUT, then to five minutes.
    #[arg(long)]
    online_timeout_ms: Option<u64>,

    /// Evaluation instant (RFC 3339). Defaults to the current time.
    #[arg(long)]
    now: Option<DateTime<Utc>>,

    #[arg(long, default_value_t = DEFAULT_REPORT_WINDOW)]
    report_window: usize,
}

#[derive(Debug, Subcommand)]
enum Command {
    Devices {
        #[arg(long, value_enum, default_value = "human")]
        format: OutputFormat,
    },
    Status {
        #[arg(long, value_enum, default_value = "human")]
        format: OutputFormat,
    },
    Timeline {
        device_id: String,
        #[arg(long, value_enum, default_value = "human")]
        format: OutputFormat,
    },
    Dashboard {
        #[arg(long, value_enum, default_value = "json")]
        format: OutputFormat,
    },
    Aggregate {
        #[arg(long, default_value = "5min")]
        period: WindowPeriod,
        #[arg(long, value_enum, default_value = "human")]
        format: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Human,
    Json,
    Ndjson,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    let config = match cli.online_timeout_ms {
        Some(ms) => TimelineConfig::with_timeout_ms(ms),
        None => TimelineConfig::from_env()?,
    };
    config.validate()?;

    let now = cli.now.unwrap_or_else(Utc::now);
    let options = FleetOptions {
        report_window: cli.report_window,
    };

    let source = SnapshotFileSource::load(&cli.source)
        .await
        .with_context(|| format!("loading heartbeat snapshot from {}", cli.source))?;
    debug!(timeout_ms = %config.online_timeout.as_millis(), %now, "evaluating");

    match cli.command {
        Command::Devices { format } => {
            let devices = source.list_devices().await?;
            render::print_devices(&devices, format)?;
        }
        Command::Status { format } => {
            let reports = evaluate_fleet(&source, &config, now, &options).await?;
            render::print_statuses(&reports, format)?;
        }
        Command::Timeline { device_id, format } => {
            let devices = source.list_devices().await?;
            let Some(device) = devices.into_iter().find(|device| device.id == device_id) else {
                bail!("device {device_id} not found in {}", cli.source);
            };
            let heartbeats = source
                .recent_heartbeats(&device.id, options.report_window)
                .await?;
            let report = analyze(&DeviceHistory::new(device, heartbeats), &config, now);
            render::print_timeline(&report, format)?;
        }
        Command::Dashboard { format } => {
            let reports = evaluate_fleet(&source, &config, now, &options).await?;
            let dashboard = fleet::build_dashboard(reports, now);
            info!(
                devices = dashboard.summary.total_devices,
                online = dashboard.summary.online_devices,
                average_uptime = dashboard.summary.average_uptime,
                "dashboard built"
            );
            render::print_dashboard(&dashboard, format)?;
        }
        Command::Aggregate { period, format } => {
            let reports = evaluate_fleet(&source, &config, now, &options).await?;
            let windows = aggregate(&reports, period.width(), now)?;
            render::print_windows(period, &windows, format)?;
        }
    }

    Ok(())
}
