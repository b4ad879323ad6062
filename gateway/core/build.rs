// Copyright (c) 2026 Flynn Controller gRPC Contributors
// SPDX-License-Identifier: BSD-3-Clause
//! Build Script for controller-gateway-core
//!
//! Compiles the `controller.v1` Protocol Buffer definitions into the tonic
//! server stubs and prost messages served by the gateway.
//!
//! # Code Generation
//!
//! Uses `tonic-prost-build` to generate Rust code from
//! `../../proto/controller.proto`. Generated code is placed in `OUT_DIR` and
//! included via `tonic::include_proto!` in `src/presentation/grpc/mod.rs`.
//!
//! # Dependencies
//!
//! - **protoc**: Protocol buffer compiler (vendored via `protoc-bin-vendored`)
//! - **tonic-prost-build**: Code generator for Rust gRPC stubs

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Point PROTOC at the vendored binary so builds don't need a system protoc
    std::env::set_var("PROTOC", protoc_bin_vendored::protoc_bin_path()?);

    tonic_prost_build::configure()
        .build_server(true)
        .build_client(true)
        .compile_protos(&["../../proto/controller.proto"], &["../../proto"])?;

    println!("cargo:rerun-if-changed=../../proto/controller.proto");

    Ok(())
}
