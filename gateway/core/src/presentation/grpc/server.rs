// Copyright (c) 2026 Flynn Controller gRPC Contributors
// SPDX-License-Identifier: BSD-3-Clause

//! gRPC server implementation for the controller API
//! Exposes ListApps, GetApp, UpdateApp, GetRelease, ListReleases, CreateRelease, CreateDeployment

use std::sync::Arc;

use tonic::{Request, Response, Status};
use tracing::info;

use super::convert::{app_from_wire, app_to_wire, release_from_wire, release_to_wire};
use super::deployment_stream::{self, DeploymentEventStream};
use super::proto::controller_server::{Controller, ControllerServer};
use super::proto::*;
use crate::domain::client::ControllerClient;
use crate::domain::resource_name::ResourceName;

/// Implementation of the Controller gRPC service
pub struct ControllerService {
    client: Arc<dyn ControllerClient>,
}

impl ControllerService {
    pub fn new(client: Arc<dyn ControllerClient>) -> Self {
        Self { client }
    }

    /// Create a gRPC server instance
    pub fn into_server(self) -> ControllerServer<Self> {
        ControllerServer::new(self)
    }
}

/// Application id addressed by a create/list parent such as `apps/a1`.
fn parent_app_id(parent: &str) -> Result<String, Status> {
    Ok(ResourceName::parse_parent(parent)?.expect_app(parent)?)
}

#[tonic::async_trait]
impl Controller for ControllerService {
    type StreamAppLogStream = tokio_stream::Empty<Result<LogChunk, Status>>;
    type CreateDeploymentStream = DeploymentEventStream;
    type StreamEventsStream = tokio_stream::Empty<Result<Event, Status>>;

    /// List every application. Pagination is not supported.
    async fn list_apps(
        &self,
        _request: Request<ListAppsRequest>,
    ) -> Result<Response<ListAppsResponse>, Status> {
        let apps = self.client.app_list().await?;
        Ok(Response::new(ListAppsResponse {
            apps: apps.iter().map(app_to_wire).collect(),
            next_page_token: String::new(),
        }))
    }

    async fn get_app(&self, request: Request<GetAppRequest>) -> Result<Response<App>, Status> {
        let req = request.into_inner();
        let app_id = req.name.parse::<ResourceName>()?.expect_app(&req.name)?;

        let app = self.client.get_app(&app_id).await?;
        Ok(Response::new(app_to_wire(&app)))
    }

    /// Replace an application with the submitted one.
    async fn update_app(
        &self,
        request: Request<UpdateAppRequest>,
    ) -> Result<Response<App>, Status> {
        let req = request.into_inner();
        let app = req
            .app
            .ok_or_else(|| Status::invalid_argument("app is required"))?;
        let app = app_from_wire(&app)?;

        let updated = self.client.update_app(app).await?;
        Ok(Response::new(app_to_wire(&updated)))
    }

    async fn get_release(
        &self,
        request: Request<GetReleaseRequest>,
    ) -> Result<Response<Release>, Status> {
        let req = request.into_inner();
        let (_, release_id) = req
            .name
            .parse::<ResourceName>()?
            .expect_release(&req.name)?;

        let release = self.client.get_release(&release_id).await?;
        Ok(Response::new(release_to_wire(&release)))
    }

    /// List releases of one application, or of every application when no
    /// parent is given.
    async fn list_releases(
        &self,
        request: Request<ListReleasesRequest>,
    ) -> Result<Response<ListReleasesResponse>, Status> {
        let req = request.into_inner();
        let releases = if req.parent.is_empty() {
            self.client.release_list().await?
        } else {
            let app_id = parent_app_id(&req.parent)?;
            self.client.app_release_list(&app_id).await?
        };

        Ok(Response::new(ListReleasesResponse {
            releases: releases.iter().map(release_to_wire).collect(),
            next_page_token: String::new(),
        }))
    }

    async fn stream_app_log(
        &self,
        _request: Request<StreamAppLogRequest>,
    ) -> Result<Response<Self::StreamAppLogStream>, Status> {
        Ok(Response::new(tokio_stream::empty()))
    }

    async fn create_release(
        &self,
        request: Request<CreateReleaseRequest>,
    ) -> Result<Response<Release>, Status> {
        let req = request.into_inner();
        let app_id = parent_app_id(&req.parent)?;
        let release = req
            .release
            .ok_or_else(|| Status::invalid_argument("release is required"))?;
        let release = release_from_wire(&release)?;
        if !release.app_id.is_empty() && release.app_id != app_id {
            return Err(Status::invalid_argument(format!(
                "release belongs to apps/{}, not {}",
                release.app_id, req.parent
            )));
        }

        let created = self.client.create_release(&app_id, release).await?;
        info!(app_id = %app_id, release_id = %created.id, "Created release");
        Ok(Response::new(release_to_wire(&created)))
    }

    /// Start a deployment and stream its progress until it finishes.
    async fn create_deployment(
        &self,
        request: Request<CreateDeploymentRequest>,
    ) -> Result<Response<Self::CreateDeploymentStream>, Status> {
        let req = request.into_inner();
        let app_id = parent_app_id(&req.parent)?;
        let (release_app_id, release_id) = req
            .release
            .parse::<ResourceName>()?
            .expect_release(&req.release)?;
        if release_app_id != app_id {
            return Err(Status::invalid_argument(format!(
                "release {} does not belong to {}",
                req.release, req.parent
            )));
        }

        let deployment = self.client.create_deployment(&app_id, &release_id).await?;
        info!(
            app_id = %app_id,
            release_id = %release_id,
            deployment_id = %deployment.id,
            "Created deployment"
        );

        let stream = deployment_stream::open(self.client.clone(), &deployment).await?;
        Ok(Response::new(stream))
    }

    async fn stream_events(
        &self,
        _request: Request<StreamEventsRequest>,
    ) -> Result<Response<Self::StreamEventsStream>, Status> {
        Ok(Response::new(tokio_stream::empty()))
    }
}
