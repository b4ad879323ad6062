// Copyright (c) 2026 Flynn Controller gRPC Contributors
// SPDX-License-Identifier: BSD-3-Clause
//! Presentation layer: the gRPC service and the HTTP stack in front of it.

pub mod dispatch;
pub mod grpc;
