// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Resolves the target printer and hands saved documents to the spooler.

use std::path::Path;
use std::sync::Arc;

use tracing::{info, instrument};

use spoolgate_core::config::ConfigStore;
use spoolgate_core::error::{Result, SpoolgateError};

use crate::spooler::Spooler;

/// Message returned to callers when the OS has accepted a job.
pub const DISPATCH_OK_MESSAGE: &str = "Print job sent successfully";

/// Sends persisted documents to the configured printer.
///
/// Dispatch is fire-and-forget: success means the OS print subsystem
/// accepted the job. There is no completion tracking, no cancellation and
/// no retry; past submission the OS spooler owns the job. Submission also
/// has no timeout -- a hung spooler blocks the calling request.
pub struct PrintDispatcher {
    config: ConfigStore,
    spooler: Arc<dyn Spooler>,
}

impl PrintDispatcher {
    pub fn new(config: ConfigStore, spooler: Arc<dyn Spooler>) -> Self {
        Self { config, spooler }
    }

    /// Print the file at `path` on the configured printer.
    ///
    /// The file must already exist. The printer name is re-read from the
    /// configuration store per call and is not checked against the OS
    /// enumeration; a wrong name surfaces through the submission's own
    /// error.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub fn print_document(&self, path: &Path) -> Result<String> {
        if !path.exists() {
            return Err(SpoolgateError::PrintDispatch(format!(
                "file {} does not exist",
                path.display()
            )));
        }

        let printer = self.config.default_printer()?;
        if printer.is_empty() {
            return Err(SpoolgateError::PrintDispatch(
                "no printer configured and the system reports no default".to_string(),
            ));
        }

        self.spooler.submit_job(path, &printer)?;

        info!(printer = %printer, "print job accepted by the OS");
        Ok(DISPATCH_OK_MESSAGE.to_string())
    }
}
