// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Writes incoming base64 payloads to the configured folder.

use std::fs;
use std::path::PathBuf;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::{info, instrument};

use spoolgate_core::config::ConfigStore;
use spoolgate_core::error::{Result, SpoolgateError};

/// Decodes request payloads and writes them into the configured folder.
pub struct DocumentPersister {
    config: ConfigStore,
}

impl DocumentPersister {
    pub fn new(config: ConfigStore) -> Self {
        Self { config }
    }

    /// Decode `payload_base64` and write it to `<pdf_folder>/<doc_name>`,
    /// returning the path of the file written.
    ///
    /// Decoding is strict: standard alphabet, correct padding, no stray
    /// characters. Nothing is written when decoding fails. An empty payload
    /// is valid and produces a zero-byte file. An existing file of the same
    /// name is overwritten.
    ///
    /// `doc_name` is taken as-is, path separators included. The endpoint
    /// only accepts loopback callers, and those are trusted with the
    /// destination path.
    #[instrument(skip(self, payload_base64), fields(payload_len = payload_base64.len(), doc_name))]
    pub fn save_document(&self, payload_base64: &str, doc_name: &str) -> Result<PathBuf> {
        let bytes = STANDARD
            .decode(payload_base64)
            .map_err(|e| SpoolgateError::Decode(e.to_string()))?;

        let folder = self.config.pdf_folder()?;
        let path = folder.join(doc_name);

        fs::write(&path, &bytes)
            .map_err(|e| SpoolgateError::Persist(format!("write {}: {e}", path.display())))?;

        info!(path = %path.display(), bytes = bytes.len(), "document saved");
        Ok(path)
    }
}
