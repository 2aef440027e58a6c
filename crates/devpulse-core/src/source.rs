use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::device::{Device, DeviceHistory};

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("io error: {0}")]
    Io(String),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("unknown device: {0}")]
    UnknownDevice(String),
}

/// Read-only view of the store that owns devices and their heartbeats.
#[async_trait]
pub trait HeartbeatSource: Send + Sync {
    async fn list_devices(&self) -> Result<Vec<Device>, SourceError>;

    /// Up to `limit` of the device's most recent heartbeat timestamps, newest
    /// first.
    async fn recent_heartbeats(
        &self,
        device_id: &str,
        limit: usize,
    ) -> Result<Vec<DateTime<Utc>>, SourceError>;
}

/// On-disk layout read by [`SnapshotFileSource`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HeartbeatSnapshot {
    #[serde(default)]
    pub devices: Vec<DeviceHistory>,
}

#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    histories: Vec<DeviceHistory>,
}

impl InMemorySource {
    pub fn new(histories: Vec<DeviceHistory>) -> Self {
        Self { histories }
    }

    pub fn push(&mut self, history: DeviceHistory) {
        self.histories.push(history);
    }

    pub fn histories(&self) -> &[DeviceHistory] {
        &self.histories
    }

    fn find(&self, device_id: &str) -> Option<&DeviceHistory> {
        self.histories
            .iter()
            .find(|history| history.device.id == device_id)
    }
}

#[async_trait]
impl HeartbeatSource for InMemorySource {
    async fn list_devices(&self) -> Result<Vec<Device>, SourceError> {
        Ok(self
            .histories
            .iter()
            .map(|history| history.device.clone())
            .collect())
    }

    async fn recent_heartbeats(
        &self,
        device_id: &str,
        limit: usize,
    ) -> Result<Vec<DateTime<Utc>>, SourceError> {
        let history = self
            .find(device_id)
            .ok_or_else(|| SourceError::UnknownDevice(device_id.to_string()))?;

        let mut beats = history.heartbeats.clone();
        beats.sort_unstable_by(|a, b| b.cmp(a));
        beats.truncate(limit);
        Ok(beats)
    }
}

/// JSON snapshot exported by the storage layer, loaded once and served from
/// memory.
#[derive(Debug, Clone)]
pub struct SnapshotFileSource {
    path: PathBuf,
    inner: InMemorySource,
}

impl SnapshotFileSource {
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self, SourceError> {
        let path = path.into();
        let raw = tokio::fs::read_to_string(&path)
            .await
            .map_err(|err| SourceError::Io(format!("failed to read {}: {err}", path.display())))?;
        let snapshot = Self::parse(&raw)
            .map_err(|err| SourceError::Parse(format!("{}: {err}", path.display())))?;

        debug!(path = %path.display(), devices = snapshot.devices.len(), "loaded heartbeat snapshot");

        Ok(Self {
            path,
            inner: InMemorySource::new(snapshot.devices),
        })
    }

    fn parse(raw: &str) -> Result<HeartbeatSnapshot, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl HeartbeatSource for SnapshotFileSource {
    async fn list_devices(&self) -> Result<Vec<Device>, SourceError> {
        self.inner.list_devices().await
    }

    async fn recent_heartbeats(
        &self,
        device_id: &str,
        limit: usize,
    ) -> Result<Vec<DateTime<Utc>>, SourceError> {
        self.inner.recent_heartbeats(device_id, limit).await
    }
}
