// Copyright (c) 2026 CloudShip AI, Inc.
// SPDX-License-Identifier: Apache-2.0

pub mod inventory;
pub mod orchestrator;
pub mod query_repair;
pub mod variables;

pub use inventory::{InventoryClient, InventoryError, InventoryQuerier};
pub use orchestrator::ToolOrchestrator;
pub use query_repair::QueryRepairer;
