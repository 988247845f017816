// Copyright (c) 2026 CloudShip AI, Inc.
// SPDX-License-Identifier: Apache-2.0
//! Chat model adapters.
//!
//! Implementations of the `ChatModel` domain trait. Each adapter is an
//! anti-corruption layer: it translates Ship's message/tool-call types into
//! one vendor's wire format and back, and nothing outside this module knows
//! the difference.

pub mod openai;

pub use openai::OpenAiChat;
