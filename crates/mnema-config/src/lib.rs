// SPDX-FileCopyrightText: 2026 Mnema Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Mnema memory engine.
//!
//! Layered loading (compiled defaults, TOML files, `MNEMA_` environment
//! overrides) via Figment, with post-deserialization semantic validation.

pub mod loader;
pub mod model;
pub mod validation;

pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::MnemaConfig;
pub use validation::{ConfigIssue, validate_config};
