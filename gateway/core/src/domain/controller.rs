// Copyright (c) 2026 Flynn Controller gRPC Contributors
// SPDX-License-Identifier: BSD-3-Clause

//! # Controller Domain Model
//!
//! Entities owned by the controller API. The gateway never persists these;
//! each value is read, converted and dropped within a single request or
//! streamed event. Serde attributes follow the controller's JSON encoding so
//! the same types travel over the HTTP client unchanged.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct App {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub meta: HashMap<String, String>,
    pub strategy: String,
    #[serde(rename = "release", skip_serializing_if = "String::is_empty")]
    pub release_id: String,
    pub deploy_timeout: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Release {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub app_id: String,
    /// Artifact ids in layering order.
    #[serde(rename = "artifacts")]
    pub artifact_ids: Vec<String>,
    pub env: HashMap<String, String>,
    pub meta: HashMap<String, String>,
    pub processes: HashMap<String, ProcessType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessType {
    pub args: Vec<String>,
    pub env: HashMap<String, String>,
    pub ports: Vec<Port>,
    pub volumes: Vec<VolumeReq>,
    pub omni: bool,
    pub host_network: bool,
    pub host_pid_namespace: bool,
    pub service: String,
    pub resurrect: bool,
    /// Constraints keyed by resource class (`memory`, `cpu`, `max_fd`, ...).
    pub resources: HashMap<String, ResourceSpec>,
    pub mounts: Vec<Mount>,
    pub linux_capabilities: Vec<String>,
    pub allowed_devices: Vec<Device>,
    pub writeable_cgroups: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Port {
    pub port: i32,
    pub proto: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<HostService>,
}

/// Service registration for a port.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostService {
    #[serde(rename = "name")]
    pub display_name: String,
    pub create: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check: Option<HealthCheck>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthCheck {
    #[serde(rename = "type")]
    pub check_type: String,
    #[serde(with = "duration_nanos", skip_serializing_if = "Option::is_none")]
    pub interval: Option<Duration>,
    pub threshold: i32,
    pub kill_down: bool,
    #[serde(with = "duration_nanos", skip_serializing_if = "Option::is_none")]
    pub start_timeout: Option<Duration>,
    pub path: String,
    pub host: String,
    #[serde(rename = "match")]
    pub match_pattern: String,
    pub status: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumeReq {
    pub path: String,
    pub delete_on_stop: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Mount {
    pub location: String,
    pub target: String,
    pub writeable: bool,
    pub device: String,
    pub data: String,
    pub flags: i32,
}

/// Device node allowed inside a job's cgroup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Device {
    /// `c`, `b`, `u`, `p` or `a`; encoded as a rune by the controller.
    #[serde(rename = "type", with = "rune")]
    pub device_type: char,
    pub path: String,
    pub major: i64,
    pub minor: i64,
    pub permissions: String,
    pub file_mode: u32,
    pub uid: u32,
    pub gid: u32,
    pub allow: bool,
}

impl Default for Device {
    fn default() -> Self {
        Self {
            device_type: 'a',
            path: String::new(),
            major: 0,
            minor: 0,
            permissions: String::new(),
            file_mode: 0,
            uid: 0,
            gid: 0,
            allow: false,
        }
    }
}

pub const DEPLOYMENT_PENDING: &str = "pending";
pub const DEPLOYMENT_RUNNING: &str = "running";
pub const DEPLOYMENT_COMPLETE: &str = "complete";
pub const DEPLOYMENT_FAILED: &str = "failed";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Deployment {
    pub id: String,
    pub app_id: String,
    #[serde(rename = "old_release", skip_serializing_if = "String::is_empty")]
    pub old_release_id: String,
    #[serde(rename = "new_release")]
    pub new_release_id: String,
    pub strategy: String,
    /// Raw controller status; see [`Deployment::is_terminal`].
    pub status: String,
    pub processes: HashMap<String, i64>,
    pub tags: HashMap<String, HashMap<String, String>>,
    pub deploy_timeout: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl Deployment {
    /// A deployment stops changing once it is complete or failed.
    pub fn is_terminal(&self) -> bool {
        self.status == DEPLOYMENT_COMPLETE || self.status == DEPLOYMENT_FAILED
    }
}

/// Kinds of objects the controller emits events about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    App,
    AppDeletion,
    AppRelease,
    AppGarbageCollection,
    Deployment,
    Job,
    Scale,
    Release,
    ReleaseDeletion,
    Artifact,
    Route,
    RouteDeletion,
    DomainMigration,
    ClusterBackup,
    Volume,
    Sink,
    SinkDeletion,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::App => "app",
            Self::AppDeletion => "app_deletion",
            Self::AppRelease => "app_release",
            Self::AppGarbageCollection => "app_garbage_collection",
            Self::Deployment => "deployment",
            Self::Job => "job",
            Self::Scale => "scale",
            Self::Release => "release",
            Self::ReleaseDeletion => "release_deletion",
            Self::Artifact => "artifact",
            Self::Route => "route",
            Self::RouteDeletion => "route_deletion",
            Self::DomainMigration => "domain_migration",
            Self::ClusterBackup => "cluster_backup",
            Self::Volume => "volume",
            Self::Sink => "sink",
            Self::SinkDeletion => "sink_deletion",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    #[serde(default)]
    pub app_id: String,
    pub object_type: EventType,
    #[serde(default)]
    pub object_id: String,
    /// Snapshot of the object at emission time; not interpreted here.
    #[serde(default)]
    pub data: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub op: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Nanosecond integer encoding used by the controller for durations.
mod duration_nanos {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => s.serialize_u64(u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(d)?
            .filter(|nanos| *nanos > 0)
            .map(Duration::from_nanos))
    }
}

mod rune {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &char, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u32(*value as u32)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<char, D::Error> {
        let code = u32::deserialize(d)?;
        char::from_u32(code).ok_or_else(|| D::Error::custom(format!("invalid rune {}", code)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deployment_terminal_status() {
        let mut deployment = Deployment::default();
        for (status, terminal) in [
            ("pending", false),
            ("running", false),
            ("complete", true),
            ("failed", true),
            ("rolling-back", false),
        ] {
            deployment.status = status.to_string();
            assert_eq!(deployment.is_terminal(), terminal, "status {}", status);
        }
    }

    #[test]
    fn test_app_json_field_names() {
        let app: App = serde_json::from_str(
            r#"{"id":"a1","name":"web","meta":{"k":"v"},"release":"r1","deploy_timeout":30}"#,
        )
        .unwrap();
        assert_eq!(app.release_id, "r1");
        assert_eq!(app.meta["k"], "v");
        assert!(app.created_at.is_none());

        let json = serde_json::to_value(&app).unwrap();
        assert_eq!(json["release"], "r1");
        assert!(json.get("created_at").is_none());
    }

    #[test]
    fn test_health_check_durations_are_nanoseconds() {
        let check: HealthCheck =
            serde_json::from_str(r#"{"type":"http","interval":1500000000,"threshold":2}"#).unwrap();
        assert_eq!(check.interval, Some(Duration::from_millis(1500)));
        assert_eq!(check.start_timeout, None);

        let json = serde_json::to_value(&check).unwrap();
        assert_eq!(json["interval"], 1_500_000_000u64);
        assert!(json.get("start_timeout").is_none());
    }

    #[test]
    fn test_device_type_is_rune() {
        let device: Device = serde_json::from_str(r#"{"type":99,"path":"/dev/null"}"#).unwrap();
        assert_eq!(device.device_type, 'c');
        assert_eq!(serde_json::to_value(&device).unwrap()["type"], 99);
    }

    #[test]
    fn test_event_type_wire_names() {
        let event: Event = serde_json::from_str(
            r#"{"id":12,"app_id":"a1","object_type":"deployment","object_id":"d1","data":{"status":"running"}}"#,
        )
        .unwrap();
        assert_eq!(event.object_type, EventType::Deployment);
        assert_eq!(event.object_type.to_string(), "deployment");
        assert_eq!(EventType::AppRelease.as_str(), "app_release");
    }
}
