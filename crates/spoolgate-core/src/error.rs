// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Spoolgate.

use thiserror::Error;

/// Top-level error type for all Spoolgate operations.
#[derive(Debug, Error)]
pub enum SpoolgateError {
    // -- Configuration errors --
    #[error("configuration read failed: {0}")]
    ConfigRead(String),

    #[error("configuration write failed: {0}")]
    ConfigWrite(String),

    // -- Document errors --
    #[error("invalid base64 payload: {0}")]
    Decode(String),

    #[error("failed to save document: {0}")]
    Persist(String),

    // -- Print errors --
    #[error("print dispatch failed: {0}")]
    PrintDispatch(String),

    // -- HTTP surface --
    /// Displays bare so the message lands in the response body unchanged.
    #[error("{0}")]
    RequestValidation(String),

    #[error("print server error: {0}")]
    Server(String),

    // -- Catch-alls --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, SpoolgateError>;
