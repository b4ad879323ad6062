// Copyright (c) 2026 Flynn Controller gRPC Contributors
// SPDX-License-Identifier: BSD-3-Clause

//! In-memory controller used by the integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use controller_gateway_core::domain::client::{
    ControllerClient, ControllerError, EventSubscription, StreamEventsOptions,
};
use controller_gateway_core::domain::controller::{App, Deployment, Event, EventType, Release};
use tokio::sync::mpsc;

#[derive(Default)]
pub struct FakeController {
    pub apps: Mutex<Vec<App>>,
    pub releases: Mutex<Vec<Release>>,
    /// Results returned by successive `get_deployment` calls.
    pub deployment_reads: Mutex<VecDeque<Result<Deployment, ControllerError>>>,
    pub created_deployment: Mutex<Option<Deployment>>,
    pub stream_error: Mutex<Option<ControllerError>>,
    pub close_error: Mutex<Option<ControllerError>>,
    pub subscriptions: Mutex<Vec<StreamEventsOptions>>,
    pub get_deployment_calls: AtomicUsize,
    pub closed: Arc<AtomicBool>,
    feed: Mutex<Option<mpsc::UnboundedReceiver<Event>>>,
}

impl FakeController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue events on the feed handed out by the next `stream_events` call.
    ///
    /// The returned sender keeps the feed open until it is dropped.
    pub fn feed(&self, events: Vec<Event>) -> mpsc::UnboundedSender<Event> {
        let (tx, rx) = mpsc::unbounded_channel();
        for event in events {
            tx.send(event).unwrap();
        }
        *self.feed.lock().unwrap() = Some(rx);
        tx
    }

    pub fn push_read(&self, result: Result<Deployment, ControllerError>) {
        self.deployment_reads.lock().unwrap().push_back(result);
    }

    pub fn get_deployment_calls(&self) -> usize {
        self.get_deployment_calls.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

pub fn deployment(id: &str, status: &str) -> Deployment {
    Deployment {
        id: id.to_string(),
        app_id: "app1".to_string(),
        old_release_id: "rel1".to_string(),
        new_release_id: "rel2".to_string(),
        strategy: "all-at-once".to_string(),
        status: status.to_string(),
        processes: HashMap::from([("web".to_string(), 2)]),
        ..Default::default()
    }
}

pub fn event(id: i64, object_type: EventType, object_id: &str) -> Event {
    Event {
        id,
        app_id: "app1".to_string(),
        object_type,
        object_id: object_id.to_string(),
        data: serde_json::Value::Null,
        op: None,
        created_at: None,
    }
}

#[async_trait]
impl ControllerClient for FakeController {
    async fn app_list(&self) -> Result<Vec<App>, ControllerError> {
        Ok(self.apps.lock().unwrap().clone())
    }

    async fn get_app(&self, app_id: &str) -> Result<App, ControllerError> {
        self.apps
            .lock()
            .unwrap()
            .iter()
            .find(|app| app.id == app_id)
            .cloned()
            .ok_or_else(|| ControllerError::NotFound("app not found".to_string()))
    }

    async fn update_app(&self, app: App) -> Result<App, ControllerError> {
        let mut apps = self.apps.lock().unwrap();
        match apps.iter_mut().find(|existing| existing.id == app.id) {
            Some(existing) => {
                *existing = app.clone();
                Ok(app)
            }
            None => Err(ControllerError::NotFound("app not found".to_string())),
        }
    }

    async fn get_release(&self, release_id: &str) -> Result<Release, ControllerError> {
        self.releases
            .lock()
            .unwrap()
            .iter()
            .find(|release| release.id == release_id)
            .cloned()
            .ok_or_else(|| ControllerError::NotFound("release not found".to_string()))
    }

    async fn release_list(&self) -> Result<Vec<Release>, ControllerError> {
        Ok(self.releases.lock().unwrap().clone())
    }

    async fn app_release_list(&self, app_id: &str) -> Result<Vec<Release>, ControllerError> {
        Ok(self
            .releases
            .lock()
            .unwrap()
            .iter()
            .filter(|release| release.app_id == app_id)
            .cloned()
            .collect())
    }

    async fn create_release(
        &self,
        app_id: &str,
        mut release: Release,
    ) -> Result<Release, ControllerError> {
        release.app_id = app_id.to_string();
        if release.id.is_empty() {
            release.id = format!("rel{}", self.releases.lock().unwrap().len() + 1);
        }
        self.releases.lock().unwrap().push(release.clone());
        Ok(release)
    }

    async fn create_deployment(
        &self,
        app_id: &str,
        release_id: &str,
    ) -> Result<Deployment, ControllerError> {
        match self.created_deployment.lock().unwrap().clone() {
            Some(deployment) => Ok(deployment),
            None => Err(ControllerError::Validation(format!(
                "cannot deploy {} to {}",
                release_id, app_id
            ))),
        }
    }

    async fn get_deployment(&self, _deployment_id: &str) -> Result<Deployment, ControllerError> {
        self.get_deployment_calls.fetch_add(1, Ordering::SeqCst);
        self.deployment_reads
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ControllerError::NotFound("no scripted read".to_string())))
    }

    async fn stream_events(
        &self,
        options: StreamEventsOptions,
    ) -> Result<Box<dyn EventSubscription>, ControllerError> {
        if let Some(err) = self.stream_error.lock().unwrap().take() {
            return Err(err);
        }
        self.subscriptions.lock().unwrap().push(options);
        let events = self
            .feed
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| mpsc::unbounded_channel().1);
        Ok(Box::new(FakeSubscription {
            events,
            close_error: self.close_error.lock().unwrap().take(),
            closed: self.closed.clone(),
        }))
    }
}

pub struct FakeSubscription {
    events: mpsc::UnboundedReceiver<Event>,
    close_error: Option<ControllerError>,
    closed: Arc<AtomicBool>,
}

#[async_trait]
impl EventSubscription for FakeSubscription {
    async fn next_event(&mut self) -> Option<Event> {
        self.events.recv().await
    }

    async fn close(self: Box<Self>) -> Result<(), ControllerError> {
        self.closed.store(true, Ordering::SeqCst);
        match self.close_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
