// Copyright (c) 2026 Flynn Controller gRPC Contributors
// SPDX-License-Identifier: BSD-3-Clause
//! gRPC surface
//!
//! Generated `controller.v1` types, the entity converter, the deployment
//! event bridge and the service implementation.
//!
//! # Architecture
//!
//! - **Layer:** Presentation Layer
//! - **Purpose:** Maps controller results and errors onto gRPC

pub mod convert;
pub mod deployment_stream;
pub mod server;

use tonic::Status;

use crate::domain::client::ControllerError;
use crate::domain::resource_name::ResourceNameError;
use convert::ConversionError;

// Generated protobuf code
pub mod proto {
    tonic::include_proto!("controller.v1");
}

impl From<ControllerError> for Status {
    fn from(err: ControllerError) -> Self {
        let message = err.to_string();
        match err {
            ControllerError::NotFound(_) => Status::not_found(message),
            ControllerError::Validation(_) => Status::invalid_argument(message),
            ControllerError::Unauthorized(_) => Status::unauthenticated(message),
            ControllerError::Conflict(_) => Status::already_exists(message),
            ControllerError::Transport(_) => Status::unavailable(message),
            ControllerError::Server { .. }
            | ControllerError::Decode(_)
            | ControllerError::Subscription(_) => Status::internal(message),
        }
    }
}

impl From<ResourceNameError> for Status {
    fn from(err: ResourceNameError) -> Self {
        Status::invalid_argument(err.to_string())
    }
}

impl From<ConversionError> for Status {
    fn from(err: ConversionError) -> Self {
        Status::invalid_argument(err.to_string())
    }
}
