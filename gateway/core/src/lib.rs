// Copyright (c) 2026 Flynn Controller gRPC Contributors
// SPDX-License-Identifier: BSD-3-Clause
//! Controller gRPC gateway
//!
//! Serves the controller API as gRPC-Web. Requests are translated into calls
//! on a [`ControllerClient`](domain::client::ControllerClient), and
//! `CreateDeployment` streams deployment progress from the controller's
//! event feed until the deployment finishes.
//!
//! # Architecture
//!
//! - **Layer:** Core System
//! - **Purpose:** Resource naming, entity conversion, deployment streaming
//!   and HTTP dispatch

pub mod domain;
pub mod infrastructure;
pub mod presentation;

pub use domain::client::{ControllerClient, ControllerError, EventSubscription};
pub use domain::gateway_config::GatewayConfig;
pub use infrastructure::HttpControllerClient;
pub use presentation::dispatch::build_app;
pub use presentation::grpc::server::ControllerService;
