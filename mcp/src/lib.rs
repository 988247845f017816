// Copyright (c) 2026 CloudShip AI, Inc.
// SPDX-License-Identifier: Apache-2.0
//! # ship-mcp
//!
//! Ship's Model Context Protocol surface: a stdio JSON-RPC server that
//! exposes the tool catalogue to AI clients, and a transparent proxy that
//! spawns a third-party MCP server, discovers its tools, and re-exports
//! them over the parent's stdio.
//!
//! Oversize tool responses are chunked and summarised rather than streamed;
//! clients that need full output must narrow the request.

pub mod chunk;
pub mod external;
pub mod proxy;
pub mod server;

pub use external::{external_server, external_servers, ExternalServerConfig};
pub use proxy::run_proxy;
pub use server::{serve_stdio, Exposure, ShipMcpServer};
