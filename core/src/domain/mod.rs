// Copyright (c) 2026 CloudShip AI, Inc.
// SPDX-License-Identifier: Apache-2.0

pub mod invocation;
pub mod llm;
pub mod provider;
pub mod runtime;
pub mod tool;

pub use invocation::*;
pub use provider::Provider;
pub use runtime::{Bind, ContainerRuntime, RunOutput, RunSpec, RuntimeError};
pub use tool::{FlagSpec, MountSpec, OutputMode, ToolCategory, ToolDescriptor, Variable};
