// Copyright (c) 2026 Flynn Controller gRPC Contributors
// SPDX-License-Identifier: BSD-3-Clause

pub mod controller_client;

pub use controller_client::{HttpControllerClient, HttpEventSubscription};
