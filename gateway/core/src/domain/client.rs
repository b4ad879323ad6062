// Copyright (c) 2026 Flynn Controller gRPC Contributors
// SPDX-License-Identifier: BSD-3-Clause
//! # Controller Client Contract
//!
//! The narrow interface through which the gateway reaches the controller API.
//! All business logic lives behind it; the gateway only reads, writes and
//! subscribes.
//!
//! | Trait | Purpose | Implementations |
//! |-------|---------|----------------|
//! | `ControllerClient` | list/get/create/update + event subscription | `HttpControllerClient` |
//! | `EventSubscription` | cancellable handle over one event feed | `HttpEventSubscription` |

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::controller::{App, Deployment, Event, EventType, Release};

/// Errors reported by the controller or by the transport used to reach it.
///
/// Controller-originated variants carry the controller's message verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControllerError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Conflict(String),

    #[error("controller returned {status}: {message}")]
    Server { status: u16, message: String },

    #[error("controller unreachable: {0}")]
    Transport(String),

    #[error("failed to decode controller response: {0}")]
    Decode(String),

    #[error("event stream error: {0}")]
    Subscription(String),
}

/// Scope of an event subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamEventsOptions {
    pub app_id: String,
    pub object_id: String,
    pub object_types: Vec<EventType>,
    /// Replay events emitted before the subscription was opened.
    pub past: bool,
}

#[async_trait]
pub trait ControllerClient: Send + Sync {
    async fn app_list(&self) -> Result<Vec<App>, ControllerError>;

    async fn get_app(&self, app_id: &str) -> Result<App, ControllerError>;

    /// Replace the stored application and return what the controller saved.
    async fn update_app(&self, app: App) -> Result<App, ControllerError>;

    async fn get_release(&self, release_id: &str) -> Result<Release, ControllerError>;

    async fn release_list(&self) -> Result<Vec<Release>, ControllerError>;

    async fn app_release_list(&self, app_id: &str) -> Result<Vec<Release>, ControllerError>;

    async fn create_release(&self, app_id: &str, release: Release)
        -> Result<Release, ControllerError>;

    async fn create_deployment(
        &self,
        app_id: &str,
        release_id: &str,
    ) -> Result<Deployment, ControllerError>;

    async fn get_deployment(&self, deployment_id: &str) -> Result<Deployment, ControllerError>;

    /// Open an event feed. Failure here means no event was delivered.
    async fn stream_events(
        &self,
        options: StreamEventsOptions,
    ) -> Result<Box<dyn EventSubscription>, ControllerError>;
}

/// Exclusive handle over one controller event feed.
///
/// Events are yielded lazily and the sequence cannot be restarted. The owner
/// must call [`EventSubscription::close`] on every exit path; implementations
/// also release their resources on drop.
#[async_trait]
pub trait EventSubscription: Send {
    /// Next event in delivery order, or `None` once the feed has ended.
    ///
    /// Must be cancel safe: dropping the future loses no event.
    async fn next_event(&mut self) -> Option<Event>;

    /// Close the feed, reporting the error that ended it, if any.
    async fn close(self: Box<Self>) -> Result<(), ControllerError>;
}
