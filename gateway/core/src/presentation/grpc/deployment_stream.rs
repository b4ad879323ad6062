// Copyright (c) 2026 Flynn Controller gRPC Contributors
// SPDX-License-Identifier: BSD-3-Clause

//! Deployment event bridge
//!
//! Follows one deployment through the controller event feed and pushes its
//! state onto a `CreateDeployment` response stream.
//!
//! ```text
//! Subscribing ──► Listening ──► Draining ──► Closed
//!                  │   ▲
//!                  └───┘ re-fetch, convert, send
//! ```
//!
//! Every event for the deployment triggers a fresh read of the deployment;
//! the event payload is never trusted as current state. A failed read or
//! conversion drops that event only. The stream ends after the first terminal
//! status, when the feed closes, or when the client goes away. The
//! subscription is closed on every path and a close error becomes the final
//! item of the stream.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tonic::Status;
use tracing::{debug, warn};

use super::convert::deployment_event_to_wire;
use super::proto;
use crate::domain::client::{
    ControllerClient, ControllerError, EventSubscription, StreamEventsOptions,
};
use crate::domain::controller::{Deployment, Event, EventType};

/// Outbound channel capacity. Sending blocks until the client has taken the
/// previous event, so a slow client holds back the feed.
const OUTBOUND_BUFFER: usize = 1;

pub type DeploymentEventStream = ReceiverStream<Result<proto::Event, Status>>;

/// Subscribe to the events of `deployment` and start forwarding them.
///
/// Subscription failures are returned before any event is produced.
pub async fn open(
    client: Arc<dyn ControllerClient>,
    deployment: &Deployment,
) -> Result<DeploymentEventStream, ControllerError> {
    let subscription = client
        .stream_events(StreamEventsOptions {
            app_id: deployment.app_id.clone(),
            object_id: deployment.id.clone(),
            object_types: vec![EventType::Deployment],
            past: true,
        })
        .await?;

    debug!(
        app_id = %deployment.app_id,
        deployment_id = %deployment.id,
        "Subscribed to deployment events"
    );

    let (tx, rx) = mpsc::channel(OUTBOUND_BUFFER);
    tokio::spawn(forward(client, subscription, deployment.id.clone(), tx));

    Ok(ReceiverStream::new(rx))
}

async fn forward(
    client: Arc<dyn ControllerClient>,
    mut subscription: Box<dyn EventSubscription>,
    deployment_id: String,
    sender: mpsc::Sender<Result<proto::Event, Status>>,
) {
    loop {
        let event = tokio::select! {
            _ = sender.closed() => {
                debug!(deployment_id = %deployment_id, "Client disconnected from deployment stream");
                break;
            }
            event = subscription.next_event() => event,
        };
        let Some(event) = event else {
            debug!(deployment_id = %deployment_id, "Deployment event feed closed");
            break;
        };

        if !concerns(&event, &deployment_id) {
            continue;
        }

        let Some((message, terminal)) = render(client.as_ref(), &event).await else {
            continue;
        };

        if sender.send(Ok(message)).await.is_err() {
            debug!(deployment_id = %deployment_id, "Client disconnected from deployment stream");
            break;
        }
        if terminal {
            break;
        }
    }

    if let Err(err) = subscription.close().await {
        warn!(deployment_id = %deployment_id, error = %err, "Deployment event feed ended with error");
        let _ = sender.send(Err(err.into())).await;
    }
}

fn concerns(event: &Event, deployment_id: &str) -> bool {
    event.object_type == EventType::Deployment && event.object_id == deployment_id
}

/// Re-read the deployment an event refers to and wrap it for the client.
///
/// Returns the message and whether the deployment has finished, or `None`
/// when the event has to be skipped.
async fn render(client: &dyn ControllerClient, event: &Event) -> Option<(proto::Event, bool)> {
    let deployment = match client.get_deployment(&event.object_id).await {
        Ok(deployment) => deployment,
        Err(err) => {
            warn!(
                event_id = event.id,
                deployment_id = %event.object_id,
                error = %err,
                "Failed to fetch deployment for event, skipping"
            );
            return None;
        }
    };

    match deployment_event_to_wire(event, &deployment) {
        Ok(message) => Some((message, deployment.is_terminal())),
        Err(err) => {
            warn!(
                event_id = event.id,
                deployment_id = %event.object_id,
                error = %err,
                "Failed to convert deployment for event, skipping"
            );
            None
        }
    }
}
