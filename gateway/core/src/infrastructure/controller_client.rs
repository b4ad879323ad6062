// Copyright (c) 2026 Flynn Controller gRPC Contributors
// SPDX-License-Identifier: BSD-3-Clause

//! Controller API HTTP Client
//!
//! `ControllerClient` implementation over the controller's JSON API.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** HTTP communication with the controller
//! - **Integration:** Gateway → Controller JSON API (basic auth, key as password)
//!
//! # Event Feed
//!
//! `GET /events` is consumed as a Server-Sent-Events body. A background task
//! decodes the body and forwards events through a bounded channel; the
//! [`HttpEventSubscription`] handle aborts that task when closed or dropped.
//! An `error` event from the controller ends the feed and is reported by
//! `close()`.

use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::StreamExt;
use reqwest::header::ACCEPT;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::domain::client::{
    ControllerClient, ControllerError, EventSubscription, StreamEventsOptions,
};
use crate::domain::controller::{App, Deployment, Event, EventType, Release};
use crate::domain::gateway_config::ControllerConfig;

/// Events buffered between the feed reader and the subscriber.
const EVENT_BUFFER: usize = 16;

/// Client for the controller JSON API.
#[derive(Clone)]
pub struct HttpControllerClient {
    base_url: String,
    client: Client,
    auth_key: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

#[derive(Serialize)]
struct DeployRequest<'a> {
    id: &'a str,
}

impl HttpControllerClient {
    pub fn new(base_url: impl Into<String>, auth_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: Client::new(),
            auth_key: auth_key.into(),
        }
    }

    pub fn from_config(config: &ControllerConfig) -> Self {
        Self::new(&config.url, &config.auth_key)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ControllerError> {
        self.send(self.client.get(self.url(path))).await
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ControllerError>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        self.send(self.client.post(self.url(path)).json(body)).await
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ControllerError> {
        let response = request
            .basic_auth("", Some(&self.auth_key))
            .send()
            .await
            .map_err(|e| ControllerError::Transport(e.to_string()))?;
        let response = check_status(response).await?;
        response
            .json()
            .await
            .map_err(|e| ControllerError::Decode(e.to_string()))
    }
}

async fn check_status(response: Response) -> Result<Response, ControllerError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .map(|b| b.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| {
            if body.is_empty() {
                status.canonical_reason().unwrap_or("unknown error").to_string()
            } else {
                body
            }
        });

    Err(match status {
        StatusCode::NOT_FOUND => ControllerError::NotFound(message),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            ControllerError::Validation(message)
        }
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ControllerError::Unauthorized(message),
        StatusCode::CONFLICT => ControllerError::Conflict(message),
        _ => ControllerError::Server {
            status: status.as_u16(),
            message,
        },
    })
}

#[async_trait]
impl ControllerClient for HttpControllerClient {
    async fn app_list(&self) -> Result<Vec<App>, ControllerError> {
        self.get("/apps").await
    }

    async fn get_app(&self, app_id: &str) -> Result<App, ControllerError> {
        self.get(&format!("/apps/{}", app_id)).await
    }

    async fn update_app(&self, app: App) -> Result<App, ControllerError> {
        self.post(&format!("/apps/{}", app.id), &app).await
    }

    async fn get_release(&self, release_id: &str) -> Result<Release, ControllerError> {
        self.get(&format!("/releases/{}", release_id)).await
    }

    async fn release_list(&self) -> Result<Vec<Release>, ControllerError> {
        self.get("/releases").await
    }

    async fn app_release_list(&self, app_id: &str) -> Result<Vec<Release>, ControllerError> {
        self.get(&format!("/apps/{}/releases", app_id)).await
    }

    async fn create_release(
        &self,
        app_id: &str,
        mut release: Release,
    ) -> Result<Release, ControllerError> {
        release.app_id = app_id.to_string();
        self.post("/releases", &release).await
    }

    async fn create_deployment(
        &self,
        app_id: &str,
        release_id: &str,
    ) -> Result<Deployment, ControllerError> {
        self.post(
            &format!("/apps/{}/deploy", app_id),
            &DeployRequest { id: release_id },
        )
        .await
    }

    async fn get_deployment(&self, deployment_id: &str) -> Result<Deployment, ControllerError> {
        self.get(&format!("/deployments/{}", deployment_id)).await
    }

    async fn stream_events(
        &self,
        options: StreamEventsOptions,
    ) -> Result<Box<dyn EventSubscription>, ControllerError> {
        let object_types = options
            .object_types
            .iter()
            .map(EventType::as_str)
            .collect::<Vec<_>>()
            .join(",");

        let mut query = vec![("past", options.past.to_string())];
        if !options.app_id.is_empty() {
            query.push(("app_id", options.app_id.clone()));
        }
        if !options.object_id.is_empty() {
            query.push(("object_id", options.object_id.clone()));
        }
        if !object_types.is_empty() {
            query.push(("object_types", object_types));
        }

        let response = self
            .client
            .get(self.url("/events"))
            .query(&query)
            .header(ACCEPT, "text/event-stream")
            .basic_auth("", Some(&self.auth_key))
            .send()
            .await
            .map_err(|e| ControllerError::Transport(e.to_string()))?;
        let response = check_status(response).await?;

        debug!(
            app_id = %options.app_id,
            object_id = %options.object_id,
            "Opened controller event stream"
        );

        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let task = tokio::spawn(read_event_feed(response, tx));

        Ok(Box::new(HttpEventSubscription {
            events: rx,
            task,
            error: None,
        }))
    }
}

/// Decode an SSE body into events until it ends, errors or the reader goes away.
async fn read_event_feed(
    response: Response,
    tx: mpsc::Sender<Result<Event, ControllerError>>,
) {
    let mut messages = response.bytes_stream().eventsource();

    while let Some(message) = messages.next().await {
        let message = match message {
            Ok(message) => message,
            Err(e) => {
                let _ = tx.send(Err(ControllerError::Transport(e.to_string()))).await;
                return;
            }
        };

        if message.event == "error" {
            let reason = serde_json::from_str::<String>(&message.data).unwrap_or(message.data);
            let _ = tx.send(Err(ControllerError::Subscription(reason))).await;
            return;
        }

        match serde_json::from_str::<Event>(&message.data) {
            Ok(event) => {
                if tx.send(Ok(event)).await.is_err() {
                    return;
                }
            }
            Err(e) => warn!("Skipping undecodable controller event: {}", e),
        }
    }
}

/// Handle over one `GET /events` feed.
pub struct HttpEventSubscription {
    events: mpsc::Receiver<Result<Event, ControllerError>>,
    task: JoinHandle<()>,
    error: Option<ControllerError>,
}

#[async_trait]
impl EventSubscription for HttpEventSubscription {
    async fn next_event(&mut self) -> Option<Event> {
        if self.error.is_some() {
            return None;
        }
        match self.events.recv().await? {
            Ok(event) => Some(event),
            Err(e) => {
                self.error = Some(e);
                None
            }
        }
    }

    async fn close(self: Box<Self>) -> Result<(), ControllerError> {
        let mut this = self;
        this.task.abort();
        this.events.close();
        match this.error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl Drop for HttpEventSubscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}
