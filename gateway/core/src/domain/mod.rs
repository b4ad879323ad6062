// Copyright (c) 2026 Flynn Controller gRPC Contributors
// SPDX-License-Identifier: BSD-3-Clause
//! Domain
//!
//! Controller entities, resource naming and the controller client contract.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Types shared by the infrastructure and presentation layers

pub mod client;
pub mod controller;
pub mod gateway_config;
pub mod resource_name;
