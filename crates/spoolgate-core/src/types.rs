// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Wire types for the print bridge endpoint.

use serde::{Deserialize, Serialize};

/// Document name used when a request does not carry one.
pub const DEFAULT_DOC_NAME: &str = "Document.pdf";

/// Body of `POST /api/printer/printraw`.
///
/// Field names are PascalCase on the wire; that spelling is part of the
/// endpoint contract and existing callers depend on it.
///
/// An absent `PayloadBase64` means the caller sent no payload and the
/// request is rejected. An empty string is different: it decodes to a
/// valid zero-byte document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PrintRawRequest {
    /// The document, base64-encoded (standard alphabet, padded).
    #[serde(default)]
    pub payload_base64: Option<String>,
    /// File name to store the document under. Defaults to
    /// [`DEFAULT_DOC_NAME`].
    #[serde(default)]
    pub doc_name: Option<String>,
}

/// Success body: `{"message": ...}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageBody {
    pub message: String,
}

/// Failure body: `{"error": ...}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_fields_use_wire_names() {
        let request: PrintRawRequest =
            serde_json::from_str(r#"{"PayloadBase64": "AA==", "DocName": "a.pdf"}"#)
                .expect("parse");

        assert_eq!(request.payload_base64.as_deref(), Some("AA=="));
        assert_eq!(request.doc_name.as_deref(), Some("a.pdf"));
    }

    #[test]
    fn absent_fields_parse_as_none() {
        let request: PrintRawRequest = serde_json::from_str("{}").expect("parse");

        assert!(request.payload_base64.is_none());
        assert!(request.doc_name.is_none());
    }
}
