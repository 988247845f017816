// Copyright (c) 2026 CloudShip AI, Inc.
// SPDX-License-Identifier: Apache-2.0

pub mod episode;
pub mod investigation;
pub mod memory;
pub mod pattern;

pub use episode::{lesson_for, QueryFailure, QuerySuccess};
pub use investigation::{
    Insight, InsightType, InvestigationError, InvestigationRequest, InvestigationResult,
    InvestigationStep, Severity,
};
pub use memory::{AgentMemory, ColumnDescriptor, TableSchema, DEFAULT_EPISODE_LIMIT};
pub use pattern::{PatternId, QueryPattern};
