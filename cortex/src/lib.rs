// Copyright (c) 2026 CloudShip AI, Inc.
// SPDX-License-Identifier: Apache-2.0
//! # ship-cortex
//!
//! The learning half of Ship: persisted episodic memory, lazily-learned
//! inventory table schemas, and the ReAct investigation engine that drives a
//! chat model over the inventory engine.
//!
//! Memory is one JSON document owned by a single-writer store; the engine
//! reads a snapshot at the start of an investigation and commits exactly
//! once at the end.

pub mod application;
pub mod domain;

pub use application::investigator::{Investigator, InvestigatorConfig};
pub use application::schema_cache::SchemaCache;
pub use application::store::MemoryStore;
pub use domain::*;
