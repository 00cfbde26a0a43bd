// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Spoolgate — core types, configuration store, and error definitions
// shared across all crates.

pub mod config;
pub mod error;
pub mod types;

pub use config::{ConfigStore, PlatformDefaults, PrinterConfig};
pub use error::{Result, SpoolgateError};
pub use types::*;
