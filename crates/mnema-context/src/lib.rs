// SPDX-FileCopyrightText: 2026 Mnema Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation context management for the Mnema memory engine.
//!
//! Holds one bounded, ordered window of memory items per conversation id,
//! entirely transient and process-local: windows are rebuilt from
//! underlying storage on first access and never persisted across restarts.

pub mod manager;

pub use manager::{CONVERSATION_SOURCE_TYPE, ContextManager, merge_windows};
