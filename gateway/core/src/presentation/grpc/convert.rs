// Copyright (c) 2026 Flynn Controller gRPC Contributors
// SPDX-License-Identifier: BSD-3-Clause

//! Controller ⇄ wire conversion
//!
//! Paired functions translating controller entities into `controller.v1`
//! messages and back. For every field the wire format carries:
//!
//! - `x_from_wire(&x_to_wire(e)) == e`
//! - `x_to_wire(&x_from_wire(w)?) == w` for canonical messages
//!
//! Cross-entity references travel as fully qualified resource names. Absent
//! timestamps stay absent in both directions.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use prost::Message;
use prost_types::{Any, Timestamp};
use thiserror::Error;

use super::proto as pb;
use super::proto::deployment::Status as DeploymentStatus;
use crate::domain::controller::{
    App, Deployment, Device, Event, HealthCheck, HostService, Mount, Port, ProcessType, Release,
    ResourceSpec, VolumeReq, DEPLOYMENT_COMPLETE, DEPLOYMENT_FAILED, DEPLOYMENT_PENDING,
    DEPLOYMENT_RUNNING,
};
use crate::domain::resource_name::{
    ResourceName, ResourceNameError, ResourcePath, APPS, DEPLOYMENTS, RELEASES,
};

#[derive(Debug, Error)]
pub enum ConversionError {
    #[error(transparent)]
    Name(#[from] ResourceNameError),

    #[error("timestamp out of range: {seconds}s {nanos}ns")]
    Timestamp { seconds: i64, nanos: i32 },

    #[error("invalid duration for {field}")]
    Duration { field: &'static str },

    #[error("{field} value {value} does not fit in 32 bits")]
    OutOfRange { field: String, value: i64 },

    #[error("invalid device type '{0}'")]
    DeviceType(String),

    #[error("invalid event id '{0}'")]
    EventId(String),

    #[error("event has no payload")]
    MissingPayload,

    #[error("failed to decode event payload: {0}")]
    Payload(#[from] prost::DecodeError),
}

// ============================================================================
// Scalars
// ============================================================================

pub fn timestamp_to_wire(time: Option<&DateTime<Utc>>) -> Option<Timestamp> {
    time.map(|t| Timestamp {
        seconds: t.timestamp(),
        nanos: t.timestamp_subsec_nanos() as i32,
    })
}

pub fn timestamp_from_wire(
    timestamp: Option<&Timestamp>,
) -> Result<Option<DateTime<Utc>>, ConversionError> {
    timestamp
        .map(|ts| {
            u32::try_from(ts.nanos)
                .ok()
                .and_then(|nanos| DateTime::from_timestamp(ts.seconds, nanos))
                .ok_or(ConversionError::Timestamp {
                    seconds: ts.seconds,
                    nanos: ts.nanos,
                })
        })
        .transpose()
}

pub fn duration_to_wire(duration: Option<Duration>) -> Option<prost_types::Duration> {
    duration.map(|d| prost_types::Duration {
        seconds: i64::try_from(d.as_secs()).unwrap_or(i64::MAX),
        nanos: d.subsec_nanos() as i32,
    })
}

pub fn duration_from_wire(
    duration: Option<&prost_types::Duration>,
    field: &'static str,
) -> Result<Option<Duration>, ConversionError> {
    duration
        .map(|d| Duration::try_from(d.clone()).map_err(|_| ConversionError::Duration { field }))
        .transpose()
}

pub fn deployment_status_to_wire(status: &str) -> DeploymentStatus {
    match status {
        DEPLOYMENT_PENDING => DeploymentStatus::Pending,
        DEPLOYMENT_FAILED => DeploymentStatus::Failed,
        DEPLOYMENT_RUNNING => DeploymentStatus::Running,
        DEPLOYMENT_COMPLETE => DeploymentStatus::Complete,
        // Unknown statuses are reported as pending rather than failing the call
        _ => DeploymentStatus::Pending,
    }
}

pub fn deployment_status_from_wire(status: DeploymentStatus) -> &'static str {
    match status {
        DeploymentStatus::Pending => DEPLOYMENT_PENDING,
        DeploymentStatus::Failed => DEPLOYMENT_FAILED,
        DeploymentStatus::Running => DEPLOYMENT_RUNNING,
        DeploymentStatus::Complete => DEPLOYMENT_COMPLETE,
    }
}

/// `apps/{app}/releases/{release}`, or empty when either id is missing.
fn release_reference(app_id: &str, release_id: &str) -> String {
    if app_id.is_empty() || release_id.is_empty() {
        return String::new();
    }
    ResourcePath::new(APPS, app_id)
        .child(RELEASES, release_id)
        .to_string()
}

fn release_id_from_reference(reference: &str) -> Result<String, ConversionError> {
    if reference.is_empty() {
        return Ok(String::new());
    }
    let (_, release_id) = reference
        .parse::<ResourceName>()?
        .expect_release(reference)?;
    Ok(release_id)
}

fn deployment_name(app_id: &str, deployment_id: &str) -> String {
    ResourcePath::new(APPS, app_id)
        .child(DEPLOYMENTS, deployment_id)
        .to_string()
}

// ============================================================================
// App
// ============================================================================

pub fn app_to_wire(app: &App) -> pb::App {
    pb::App {
        name: ResourcePath::new(APPS, &app.id).to_string(),
        display_name: app.name.clone(),
        labels: app.meta.clone(),
        strategy: app.strategy.clone(),
        release: release_reference(&app.id, &app.release_id),
        deploy_timeout: app.deploy_timeout,
        create_time: timestamp_to_wire(app.created_at.as_ref()),
        update_time: timestamp_to_wire(app.updated_at.as_ref()),
    }
}

pub fn app_from_wire(app: &pb::App) -> Result<App, ConversionError> {
    let id = app.name.parse::<ResourceName>()?.expect_app(&app.name)?;
    Ok(App {
        id,
        name: app.display_name.clone(),
        meta: app.labels.clone(),
        strategy: app.strategy.clone(),
        release_id: release_id_from_reference(&app.release)?,
        deploy_timeout: app.deploy_timeout,
        created_at: timestamp_from_wire(app.create_time.as_ref())?,
        updated_at: timestamp_from_wire(app.update_time.as_ref())?,
    })
}

// ============================================================================
// Release and process types
// ============================================================================

pub fn release_to_wire(release: &Release) -> pb::Release {
    pb::Release {
        name: release_reference(&release.app_id, &release.id),
        artifacts: release.artifact_ids.clone(),
        env: release.env.clone(),
        labels: release.meta.clone(),
        processes: release
            .processes
            .iter()
            .map(|(name, process)| (name.clone(), process_type_to_wire(process)))
            .collect(),
        create_time: timestamp_to_wire(release.created_at.as_ref()),
    }
}

/// An empty name is accepted so unsaved releases can be converted.
pub fn release_from_wire(release: &pb::Release) -> Result<Release, ConversionError> {
    let (app_id, id) = if release.name.is_empty() {
        (String::new(), String::new())
    } else {
        release
            .name
            .parse::<ResourceName>()?
            .expect_release(&release.name)?
    };

    let processes = release
        .processes
        .iter()
        .map(|(name, process)| Ok((name.clone(), process_type_from_wire(process)?)))
        .collect::<Result<HashMap<_, _>, ConversionError>>()?;

    Ok(Release {
        id,
        app_id,
        artifact_ids: release.artifacts.clone(),
        env: release.env.clone(),
        meta: release.labels.clone(),
        processes,
        created_at: timestamp_from_wire(release.create_time.as_ref())?,
    })
}

pub fn process_type_to_wire(process: &ProcessType) -> pb::ProcessType {
    pb::ProcessType {
        args: process.args.clone(),
        env: process.env.clone(),
        ports: process.ports.iter().map(port_to_wire).collect(),
        volumes: process.volumes.iter().map(volume_to_wire).collect(),
        omni: process.omni,
        host_network: process.host_network,
        host_pid_namespace: process.host_pid_namespace,
        service: process.service.clone(),
        resurrect: process.resurrect,
        resources: process
            .resources
            .iter()
            .map(|(class, spec)| (class.clone(), resource_spec_to_wire(spec)))
            .collect(),
        mounts: process.mounts.iter().map(mount_to_wire).collect(),
        linux_capabilities: process.linux_capabilities.clone(),
        allowed_devices: process.allowed_devices.iter().map(device_to_wire).collect(),
        writeable_cgroups: process.writeable_cgroups,
    }
}

pub fn process_type_from_wire(process: &pb::ProcessType) -> Result<ProcessType, ConversionError> {
    Ok(ProcessType {
        args: process.args.clone(),
        env: process.env.clone(),
        ports: process
            .ports
            .iter()
            .map(port_from_wire)
            .collect::<Result<_, _>>()?,
        volumes: process.volumes.iter().map(volume_from_wire).collect(),
        omni: process.omni,
        host_network: process.host_network,
        host_pid_namespace: process.host_pid_namespace,
        service: process.service.clone(),
        resurrect: process.resurrect,
        resources: process
            .resources
            .iter()
            .map(|(class, spec)| (class.clone(), resource_spec_from_wire(spec)))
            .collect(),
        mounts: process.mounts.iter().map(mount_from_wire).collect(),
        linux_capabilities: process.linux_capabilities.clone(),
        allowed_devices: process
            .allowed_devices
            .iter()
            .map(device_from_wire)
            .collect::<Result<_, _>>()?,
        writeable_cgroups: process.writeable_cgroups,
    })
}

pub fn port_to_wire(port: &Port) -> pb::Port {
    pb::Port {
        port: port.port,
        proto: port.proto.clone(),
        service: port.service.as_ref().map(service_to_wire),
    }
}

pub fn port_from_wire(port: &pb::Port) -> Result<Port, ConversionError> {
    Ok(Port {
        port: port.port,
        proto: port.proto.clone(),
        service: port.service.as_ref().map(service_from_wire).transpose()?,
    })
}

pub fn service_to_wire(service: &HostService) -> pb::HostService {
    pb::HostService {
        display_name: service.display_name.clone(),
        create: service.create,
        check: service.check.as_ref().map(health_check_to_wire),
    }
}

pub fn service_from_wire(service: &pb::HostService) -> Result<HostService, ConversionError> {
    Ok(HostService {
        display_name: service.display_name.clone(),
        create: service.create,
        check: service
            .check
            .as_ref()
            .map(health_check_from_wire)
            .transpose()?,
    })
}

pub fn health_check_to_wire(check: &HealthCheck) -> pb::HostHealthCheck {
    pb::HostHealthCheck {
        r#type: check.check_type.clone(),
        interval: duration_to_wire(check.interval),
        threshold: check.threshold,
        kill_down: check.kill_down,
        start_timeout: duration_to_wire(check.start_timeout),
        path: check.path.clone(),
        host: check.host.clone(),
        r#match: check.match_pattern.clone(),
        status: check.status,
    }
}

pub fn health_check_from_wire(check: &pb::HostHealthCheck) -> Result<HealthCheck, ConversionError> {
    Ok(HealthCheck {
        check_type: check.r#type.clone(),
        interval: duration_from_wire(check.interval.as_ref(), "interval")?,
        threshold: check.threshold,
        kill_down: check.kill_down,
        start_timeout: duration_from_wire(check.start_timeout.as_ref(), "start_timeout")?,
        path: check.path.clone(),
        host: check.host.clone(),
        match_pattern: check.r#match.clone(),
        status: check.status,
    })
}

pub fn volume_to_wire(volume: &VolumeReq) -> pb::VolumeReq {
    pb::VolumeReq {
        path: volume.path.clone(),
        delete_on_stop: volume.delete_on_stop,
    }
}

pub fn volume_from_wire(volume: &pb::VolumeReq) -> VolumeReq {
    VolumeReq {
        path: volume.path.clone(),
        delete_on_stop: volume.delete_on_stop,
    }
}

pub fn resource_spec_to_wire(spec: &ResourceSpec) -> pb::HostResourceSpec {
    pb::HostResourceSpec {
        request: spec.request,
        limit: spec.limit,
    }
}

pub fn resource_spec_from_wire(spec: &pb::HostResourceSpec) -> ResourceSpec {
    ResourceSpec {
        request: spec.request,
        limit: spec.limit,
    }
}

pub fn mount_to_wire(mount: &Mount) -> pb::HostMount {
    pb::HostMount {
        location: mount.location.clone(),
        target: mount.target.clone(),
        writeable: mount.writeable,
        device: mount.device.clone(),
        data: mount.data.clone(),
        flags: mount.flags,
    }
}

pub fn mount_from_wire(mount: &pb::HostMount) -> Mount {
    Mount {
        location: mount.location.clone(),
        target: mount.target.clone(),
        writeable: mount.writeable,
        device: mount.device.clone(),
        data: mount.data.clone(),
        flags: mount.flags,
    }
}

pub fn device_to_wire(device: &Device) -> pb::LibContainerDevice {
    pb::LibContainerDevice {
        r#type: device.device_type.to_string(),
        path: device.path.clone(),
        major: device.major,
        minor: device.minor,
        permissions: device.permissions.clone(),
        file_mode: device.file_mode,
        uid: device.uid,
        gid: device.gid,
        allow: device.allow,
    }
}

pub fn device_from_wire(device: &pb::LibContainerDevice) -> Result<Device, ConversionError> {
    let mut chars = device.r#type.chars();
    let device_type = match (chars.next(), chars.next()) {
        (Some(c), None) => c,
        _ => return Err(ConversionError::DeviceType(device.r#type.clone())),
    };
    Ok(Device {
        device_type,
        path: device.path.clone(),
        major: device.major,
        minor: device.minor,
        permissions: device.permissions.clone(),
        file_mode: device.file_mode,
        uid: device.uid,
        gid: device.gid,
        allow: device.allow,
    })
}

// ============================================================================
// Deployment and events
// ============================================================================

pub fn deployment_to_wire(deployment: &Deployment) -> Result<pb::Deployment, ConversionError> {
    let processes = deployment
        .processes
        .iter()
        .map(|(name, count)| {
            i32::try_from(*count)
                .map(|count| (name.clone(), count))
                .map_err(|_| ConversionError::OutOfRange {
                    field: format!("processes.{}", name),
                    value: *count,
                })
        })
        .collect::<Result<HashMap<_, _>, _>>()?;

    Ok(pb::Deployment {
        name: deployment_name(&deployment.app_id, &deployment.id),
        old_release: release_reference(&deployment.app_id, &deployment.old_release_id),
        new_release: release_reference(&deployment.app_id, &deployment.new_release_id),
        strategy: deployment.strategy.clone(),
        status: deployment_status_to_wire(&deployment.status) as i32,
        processes,
        tags: deployment
            .tags
            .iter()
            .map(|(process, tags)| {
                (
                    process.clone(),
                    pb::DeploymentProcessTags { tags: tags.clone() },
                )
            })
            .collect(),
        deploy_timeout: deployment.deploy_timeout,
        create_time: timestamp_to_wire(deployment.created_at.as_ref()),
        end_time: timestamp_to_wire(deployment.finished_at.as_ref()),
    })
}

pub fn deployment_from_wire(deployment: &pb::Deployment) -> Result<Deployment, ConversionError> {
    let (app_id, id) = deployment
        .name
        .parse::<ResourceName>()?
        .expect_deployment(&deployment.name)?;

    Ok(Deployment {
        id,
        app_id,
        old_release_id: release_id_from_reference(&deployment.old_release)?,
        new_release_id: release_id_from_reference(&deployment.new_release)?,
        strategy: deployment.strategy.clone(),
        // unknown enum values decode as Pending
        status: deployment_status_from_wire(deployment.status()).to_string(),
        processes: deployment
            .processes
            .iter()
            .map(|(name, count)| (name.clone(), i64::from(*count)))
            .collect(),
        tags: deployment
            .tags
            .iter()
            .map(|(process, tags)| (process.clone(), tags.tags.clone()))
            .collect(),
        deploy_timeout: deployment.deploy_timeout,
        created_at: timestamp_from_wire(deployment.create_time.as_ref())?,
        finished_at: timestamp_from_wire(deployment.end_time.as_ref())?,
    })
}

/// Wrap the current state of a deployment in the envelope streamed for `event`.
///
/// The payload type tag is the deployment's resource name.
pub fn deployment_event_to_wire(
    event: &Event,
    deployment: &Deployment,
) -> Result<pb::Event, ConversionError> {
    let parent = deployment_name(&deployment.app_id, &deployment.id);
    let payload = deployment_to_wire(deployment)?;
    Ok(pb::Event {
        name: ResourceName::event(event.id).to_string(),
        parent: parent.clone(),
        data: Some(Any {
            type_url: parent,
            value: payload.encode_to_vec(),
        }),
    })
}

/// Recover the event id and deployment carried by a streamed envelope.
pub fn deployment_event_from_wire(event: &pb::Event) -> Result<(i64, Deployment), ConversionError> {
    let event_id = match event.name.parse::<ResourceName>()? {
        ResourceName::Event { event_id } => event_id
            .parse::<i64>()
            .map_err(|_| ConversionError::EventId(event_id))?,
        _ => {
            return Err(ResourceNameError::UnexpectedKind {
                name: event.name.clone(),
                expected: "event",
            }
            .into())
        }
    };
    let data = event.data.as_ref().ok_or(ConversionError::MissingPayload)?;
    let payload = pb::Deployment::decode(data.value.as_slice())?;
    Ok((event_id, deployment_from_wire(&payload)?))
}
