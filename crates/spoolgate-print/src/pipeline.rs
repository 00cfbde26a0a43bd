// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The request-to-print pipeline behind the print-raw endpoint.

use tracing::{info, instrument};

use spoolgate_core::error::{Result, SpoolgateError};
use spoolgate_core::types::{PrintRawRequest, DEFAULT_DOC_NAME};
use spoolgate_document::DocumentPersister;

use crate::dispatcher::PrintDispatcher;

/// The services behind the print-raw endpoint, wired once at startup and
/// shared by every connection task.
pub struct PrintPipeline {
    persister: DocumentPersister,
    dispatcher: PrintDispatcher,
}

impl PrintPipeline {
    pub fn new(persister: DocumentPersister, dispatcher: PrintDispatcher) -> Self {
        Self {
            persister,
            dispatcher,
        }
    }

    /// Run one request through persist and dispatch, returning the success
    /// message for the response body.
    ///
    /// A request without a payload field is a validation error. An empty
    /// payload string is not: it is a legitimate zero-byte document.
    #[instrument(skip_all)]
    pub fn print_raw(&self, request: &PrintRawRequest) -> Result<String> {
        let payload = request
            .payload_base64
            .as_deref()
            .ok_or_else(|| SpoolgateError::RequestValidation("No payload provided".to_string()))?;

        let doc_name = request.doc_name.as_deref().unwrap_or(DEFAULT_DOC_NAME);

        let path = self.persister.save_document(payload, doc_name)?;
        let message = self.dispatcher.print_document(&path)?;

        info!(doc_name, path = %path.display(), "print request completed");
        Ok(message)
    }
}
