// Copyright (c) 2026 CloudShip AI, Inc.
// SPDX-License-Identifier: Apache-2.0
//! # ship-core
//!
//! The runtime heart of Ship. This crate owns the domain model, the
//! containerized tool runtime, and the orchestration use-cases that every
//! other crate builds on.
//!
//! ## Layer Structure
//!
//! ```text
//! application/    ← Tool orchestration, variable resolution, query repair,
//!                   inventory-engine client
//!     ↓
//! domain/         ← Tool descriptors, invocation value objects, runtime and
//!                   LLM traits, provider tags
//!     ↓
//! infrastructure/ ← Docker runtime (bollard), module catalogue, OpenAI
//!                   chat adapter
//! ```
//!
//! Every external tool Ship knows about runs inside an ephemeral container;
//! nothing in this crate shells out to a host binary.

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use domain::*;
