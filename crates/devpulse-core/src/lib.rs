pub mod aggregate;
pub mod config;
pub mod device;
pub mod fleet;
pub mod source;
pub mod status;
pub mod timeline;

#[cfg(test)]
mod status_tests;
#[cfg(test)]
mod test_support;

pub use aggregate::{aggregate, AggregateError, WindowCount, WindowPeriod};
pub use config::{ConfigError, TimelineConfig};
pub use device::{Device, DeviceHistory, HeartbeatReport};
pub use fleet::{
    build_dashboard, evaluate_fleet, Dashboard, FleetError, FleetOptions, FleetSummary,
    LocationStats,
};
pub use source::{HeartbeatSnapshot, HeartbeatSource, InMemorySource, SnapshotFileSource, SourceError};
pub use status::{analyze, evaluate, DeviceReport, DeviceStatusSummary};
pub use timeline::{reconstruct, DeviceState, Interval};
