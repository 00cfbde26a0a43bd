// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Loopback HTTP print server.
//
// The bridge exposes exactly one JSON endpoint, so requests are served
// straight off a Tokio TCP listener with minimal HTTP/1.1 framing instead
// of a full web framework: read the header section, honour Content-Length,
// write a handcrafted response. The listener binds 127.0.0.1 only; nothing
// off-machine can reach it.
//
// # Endpoint
//
//   POST /api/printer/printraw    accept a base64 document and print it
//
// Browser callers get permissive CORS headers, matching the bridge's role
// as a helper for local web front ends.

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use spoolgate_core::error::{Result, SpoolgateError};
use spoolgate_core::types::PrintRawRequest;

use crate::pipeline::PrintPipeline;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Port the print service listens on.
const DEFAULT_PORT: u16 = 8072;

/// Path of the raw print endpoint.
const PRINT_RAW_PATH: &str = "/api/printer/printraw";

/// Maximum accepted request body size. Caps memory per connection; a
/// base64-encoded PDF of ordinary size fits with lots of room.
const MAX_BODY_BYTES: usize = 64 * 1024 * 1024;

/// Upper bound for the header section of a request.
const MAX_HEADER_BYTES: usize = 64 * 1024;

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

/// Lifecycle state of the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerStatus {
    Stopped,
    Running,
}

/// Loopback HTTP server for the print-raw endpoint.
pub struct PrintServer {
    /// Port requested at construction; 0 asks the OS for an ephemeral one.
    port: u16,
    /// Port actually bound, once running.
    bound_port: Option<u16>,
    status: ServerStatus,
    /// Signals the accept loop to wind down.
    shutdown_signal: Arc<Notify>,
    /// Handle to the Tokio task running the accept loop.
    task_handle: Option<JoinHandle<()>>,
}

impl PrintServer {
    /// Create a server for the given port, `Stopped` until started.
    /// `None` selects the standard bridge port.
    pub fn new(port: Option<u16>) -> Self {
        Self {
            port: port.unwrap_or(DEFAULT_PORT),
            bound_port: None,
            status: ServerStatus::Stopped,
            shutdown_signal: Arc::new(Notify::new()),
            task_handle: None,
        }
    }

    /// The port the server is bound to, or will request when started.
    pub fn port(&self) -> u16 {
        self.bound_port.unwrap_or(self.port)
    }

    pub fn status(&self) -> ServerStatus {
        self.status
    }

    /// Bind the loopback listener and start serving.
    ///
    /// The pipeline is shared across connection tasks. A handler failure is
    /// contained by its task and cannot take the listener down.
    pub async fn start(&mut self, pipeline: Arc<PrintPipeline>) -> Result<()> {
        if self.status == ServerStatus::Running {
            debug!(port = self.port(), "print server already running");
            return Ok(());
        }

        let bind_addr: SocketAddr = (Ipv4Addr::LOCALHOST, self.port).into();
        let listener = TcpListener::bind(bind_addr)
            .await
            .map_err(|e| SpoolgateError::Server(format!("bind {bind_addr}: {e}")))?;

        let local = listener
            .local_addr()
            .map_err(|e| SpoolgateError::Server(format!("local addr: {e}")))?;
        self.bound_port = Some(local.port());

        info!(port = local.port(), "print server listening on loopback");

        let shutdown = Arc::clone(&self.shutdown_signal);
        let handle = tokio::spawn(async move {
            Self::accept_loop(listener, shutdown, pipeline).await;
        });

        self.task_handle = Some(handle);
        self.status = ServerStatus::Running;
        Ok(())
    }

    /// Gracefully stop the server.
    ///
    /// Signals the accept loop to exit and awaits it. Connections that are
    /// mid-request run on their own tasks and are left to finish.
    pub async fn stop(&mut self) -> Result<()> {
        if self.status != ServerStatus::Running {
            return Ok(());
        }

        info!(port = self.port(), "stopping print server");
        self.shutdown_signal.notify_one();

        if let Some(handle) = self.task_handle.take() {
            handle
                .await
                .map_err(|e| SpoolgateError::Server(format!("task join: {e}")))?;
        }

        self.status = ServerStatus::Stopped;
        info!(port = self.port(), "print server stopped");
        Ok(())
    }

    /// Accept until the shutdown signal fires, one task per connection.
    async fn accept_loop(
        listener: TcpListener,
        shutdown: Arc<Notify>,
        pipeline: Arc<PrintPipeline>,
    ) {
        loop {
            tokio::select! {
                _ = shutdown.notified() => {
                    debug!("accept loop received shutdown signal");
                    break;
                }

                accept_result = listener.accept() => {
                    match accept_result {
                        Ok((stream, peer_addr)) => {
                            debug!(peer = %peer_addr, "incoming connection");
                            let pipeline = Arc::clone(&pipeline);
                            tokio::spawn(async move {
                                if let Err(e) = handle_connection(stream, peer_addr, pipeline).await {
                                    warn!(peer = %peer_addr, error = %e, "connection handler error");
                                }
                            });
                        }
                        Err(e) => {
                            error!(error = %e, "failed to accept connection");
                        }
                    }
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Connection handling
// ---------------------------------------------------------------------------

/// Read one request off the stream, route it, and write the response.
async fn handle_connection(
    mut stream: TcpStream,
    peer_addr: SocketAddr,
    pipeline: Arc<PrintPipeline>,
) -> Result<()> {
    // Read until the end of the header section.
    let mut buf = Vec::with_capacity(8192);
    let header_end = loop {
        if let Some(pos) = find_subsequence(&buf, b"\r\n\r\n") {
            break pos;
        }
        if buf.len() > MAX_HEADER_BYTES {
            return send_response(
                &mut stream,
                431,
                "Request Header Fields Too Large",
                &error_body("Request headers too large"),
            )
            .await;
        }

        let mut chunk = [0u8; 4096];
        let n = stream
            .read(&mut chunk)
            .await
            .map_err(|e| SpoolgateError::Server(format!("read from {peer_addr}: {e}")))?;
        if n == 0 {
            if !buf.is_empty() {
                warn!(peer = %peer_addr, bytes = buf.len(), "connection closed mid-headers");
            }
            return Ok(());
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let body_offset = header_end + 4;
    let head = String::from_utf8_lossy(&buf[..header_end]).into_owned();

    let Some((method, path)) = parse_request_line(&head) else {
        return send_response(
            &mut stream,
            400,
            "Bad Request",
            &error_body("Malformed request line"),
        )
        .await;
    };

    let content_length = header_value(&head, "content-length")
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(0);

    if content_length > MAX_BODY_BYTES {
        warn!(peer = %peer_addr, content_length, "request body too large");
        return send_response(
            &mut stream,
            413,
            "Payload Too Large",
            &error_body("Request body too large"),
        )
        .await;
    }

    // The body is whatever arrived past the headers plus the remainder
    // announced by Content-Length.
    let mut body = buf.split_off(body_offset);
    while body.len() < content_length {
        let mut chunk = [0u8; 8192];
        let n = stream
            .read(&mut chunk)
            .await
            .map_err(|e| SpoolgateError::Server(format!("read from {peer_addr}: {e}")))?;
        if n == 0 {
            warn!(
                peer = %peer_addr,
                got = body.len(),
                expected = content_length,
                "connection closed mid-body"
            );
            return Ok(());
        }
        body.extend_from_slice(&chunk[..n]);
    }
    body.truncate(content_length);

    debug!(peer = %peer_addr, %method, %path, body_bytes = body.len(), "request received");

    let (status, reason, payload) = route(&method, &path, &body, &pipeline);
    send_response(&mut stream, status, reason, &payload).await
}

/// Route a parsed request to its handler.
fn route(
    method: &str,
    path: &str,
    body: &[u8],
    pipeline: &PrintPipeline,
) -> (u16, &'static str, Vec<u8>) {
    match (method, path) {
        ("POST", PRINT_RAW_PATH) => handle_print_raw(body, pipeline),
        ("OPTIONS", PRINT_RAW_PATH) => (204, "No Content", Vec::new()),
        (_, PRINT_RAW_PATH) => (405, "Method Not Allowed", error_body("Method not allowed")),
        _ => (404, "Not Found", error_body("Not found")),
    }
}

/// `POST /api/printer/printraw`: decode, save, and dispatch one document.
///
/// The error split is part of the wire contract: a body that does not
/// parse is "No data provided" (400), a parsed body without the payload
/// field is "No payload provided" (400), and persist or dispatch failures
/// are 500s carrying the failing component's message.
fn handle_print_raw(body: &[u8], pipeline: &PrintPipeline) -> (u16, &'static str, Vec<u8>) {
    let request: PrintRawRequest = match serde_json::from_slice(body) {
        Ok(request) => request,
        Err(e) => {
            warn!(error = %e, "unparseable print-raw body");
            return (400, "Bad Request", error_body("No data provided"));
        }
    };

    match pipeline.print_raw(&request) {
        Ok(message) => (200, "OK", message_body(&message)),
        Err(e @ SpoolgateError::RequestValidation(_)) => {
            warn!(error = %e, "print-raw request rejected");
            (400, "Bad Request", error_body(&e.to_string()))
        }
        Err(e) => {
            error!(error = %e, "print-raw request failed");
            (500, "Internal Server Error", error_body(&e.to_string()))
        }
    }
}

fn message_body(message: &str) -> Vec<u8> {
    serde_json::json!({ "message": message }).to_string().into_bytes()
}

fn error_body(error: &str) -> Vec<u8> {
    serde_json::json!({ "error": error }).to_string().into_bytes()
}

/// Write a handcrafted HTTP/1.1 response and flush.
///
/// Every response carries permissive CORS headers so local web front ends
/// can call the bridge; the preflight answer advertises POST and the
/// Content-Type header.
async fn send_response(
    stream: &mut TcpStream,
    status: u16,
    reason: &str,
    body: &[u8],
) -> Result<()> {
    let head = format!(
        "HTTP/1.1 {status} {reason}\r\n\
         Content-Type: application/json\r\n\
         Content-Length: {}\r\n\
         Access-Control-Allow-Origin: *\r\n\
         Access-Control-Allow-Methods: POST, OPTIONS\r\n\
         Access-Control-Allow-Headers: Content-Type\r\n\
         Connection: close\r\n\
         \r\n",
        body.len()
    );

    stream
        .write_all(head.as_bytes())
        .await
        .map_err(|e| SpoolgateError::Server(format!("write response head: {e}")))?;

    stream
        .write_all(body)
        .await
        .map_err(|e| SpoolgateError::Server(format!("write response body: {e}")))?;

    stream
        .flush()
        .await
        .map_err(|e| SpoolgateError::Server(format!("flush response: {e}")))?;

    Ok(())
}

// ---------------------------------------------------------------------------
// Request parsing
// ---------------------------------------------------------------------------

/// Split the request line into method and path. The HTTP version token is
/// not inspected.
fn parse_request_line(head: &str) -> Option<(String, String)> {
    let line = head.lines().next()?;
    let mut parts = line.split_whitespace();
    let method = parts.next()?.to_string();
    let path = parts.next()?.to_string();
    Some((method, path))
}

/// Case-insensitive lookup of a header value in the raw head section.
fn header_value<'a>(head: &'a str, name: &str) -> Option<&'a str> {
    head.lines().skip(1).find_map(|line| {
        let (key, value) = line.split_once(':')?;
        if key.trim().eq_ignore_ascii_case(name) {
            Some(value.trim())
        } else {
            None
        }
    })
}

/// Find the first occurrence of `needle` in `haystack`.
fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    use std::path::PathBuf;
    use std::time::Duration;

    use tempfile::TempDir;

    use spoolgate_core::config::{ConfigStore, PlatformDefaults, PrinterConfig};
    use spoolgate_core::types::{ErrorBody, MessageBody};
    use spoolgate_document::DocumentPersister;

    use crate::dispatcher::PrintDispatcher;
    use crate::spooler::testing::RecordingSpooler;

    struct TestDefaults {
        folder: PathBuf,
    }

    impl PlatformDefaults for TestDefaults {
        fn pdf_folder(&self) -> PathBuf {
            self.folder.clone()
        }

        fn default_printer(&self) -> Option<String> {
            Some("Front Desk".to_string())
        }
    }

    /// Spin up a server on an ephemeral port over a fresh temp dir.
    async fn start_test_server(dir: &TempDir) -> (PrintServer, Arc<RecordingSpooler>, u16) {
        let store = ConfigStore::open(
            dir.path().join("config").join("config.json"),
            Arc::new(TestDefaults {
                folder: dir.path().to_path_buf(),
            }),
        );
        let spooler = Arc::new(RecordingSpooler::new());
        let pipeline = Arc::new(PrintPipeline::new(
            DocumentPersister::new(store.clone()),
            PrintDispatcher::new(store, Arc::clone(&spooler) as Arc<dyn crate::spooler::Spooler>),
        ));

        let mut server = PrintServer::new(Some(0));
        server.start(pipeline).await.expect("server start");
        let port = server.port();
        (server, spooler, port)
    }

    /// Send a raw HTTP request and return the full response text.
    async fn send_request(port: u16, request: &str) -> String {
        let mut stream = TcpStream::connect(("127.0.0.1", port))
            .await
            .expect("connect");
        stream.write_all(request.as_bytes()).await.expect("write");

        let mut response = String::new();
        stream.read_to_string(&mut response).await.expect("read");
        response
    }

    fn post_print_raw(body: &str) -> String {
        format!(
            "POST /api/printer/printraw HTTP/1.1\r\n\
             Host: 127.0.0.1\r\n\
             Content-Type: application/json\r\n\
             Content-Length: {}\r\n\
             \r\n\
             {}",
            body.len(),
            body
        )
    }

    fn response_status(response: &str) -> u16 {
        response
            .split_whitespace()
            .nth(1)
            .and_then(|s| s.parse().ok())
            .expect("status code")
    }

    fn response_body(response: &str) -> &str {
        response.split("\r\n\r\n").nth(1).expect("body")
    }

    #[test]
    fn default_port_is_8072() {
        let server = PrintServer::new(None);
        assert_eq!(server.port(), 8072);
    }

    #[test]
    fn initial_status_is_stopped() {
        let server = PrintServer::new(None);
        assert_eq!(server.status(), ServerStatus::Stopped);
    }

    #[test]
    fn request_line_parses_method_and_path() {
        let head = "POST /api/printer/printraw HTTP/1.1\r\nHost: x";
        assert_eq!(
            parse_request_line(head),
            Some(("POST".to_string(), "/api/printer/printraw".to_string()))
        );
        assert_eq!(parse_request_line(""), None);
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let head = "POST / HTTP/1.1\r\nHost: x\r\nCONTENT-LENGTH: 42";
        assert_eq!(header_value(head, "content-length"), Some("42"));
        assert_eq!(header_value(head, "content-type"), None);
    }

    #[test]
    fn find_subsequence_locates_header_terminator() {
        assert_eq!(find_subsequence(b"abc\r\n\r\ndef", b"\r\n\r\n"), Some(3));
        assert_eq!(find_subsequence(b"abc", b"\r\n\r\n"), None);
    }

    #[tokio::test]
    async fn happy_path_saves_dispatches_and_reports_success() {
        let dir = TempDir::new().expect("tempdir");
        let (mut server, spooler, port) = start_test_server(&dir).await;

        let response = send_request(
            port,
            &post_print_raw(r#"{"PayloadBase64": "JVBERi0xLjQK", "DocName": "test.pdf"}"#),
        )
        .await;

        assert_eq!(response_status(&response), 200);
        let body: MessageBody = serde_json::from_str(response_body(&response)).expect("body");
        assert_eq!(body.message, "Print job sent successfully");

        let saved = dir.path().join("test.pdf");
        assert_eq!(std::fs::read(&saved).expect("saved file"), b"%PDF-1.4\n");

        {
            let submissions = spooler.submissions.lock().expect("lock");
            assert_eq!(submissions.as_slice(), &[(saved, "Front Desk".to_string())]);
        }

        server.stop().await.expect("stop");
    }

    #[tokio::test]
    async fn missing_payload_field_is_a_400() {
        let dir = TempDir::new().expect("tempdir");
        let (mut server, spooler, port) = start_test_server(&dir).await;

        let response = send_request(port, &post_print_raw("{}")).await;

        assert_eq!(response_status(&response), 400);
        let body: ErrorBody = serde_json::from_str(response_body(&response)).expect("body");
        assert_eq!(body.error, "No payload provided");
        assert_eq!(spooler.submission_count(), 0);

        server.stop().await.expect("stop");
    }

    #[tokio::test]
    async fn unparseable_body_is_no_data_provided() {
        let dir = TempDir::new().expect("tempdir");
        let (mut server, _spooler, port) = start_test_server(&dir).await;

        for body in ["not json", ""] {
            let response = send_request(port, &post_print_raw(body)).await;
            assert_eq!(response_status(&response), 400);
            let parsed: ErrorBody =
                serde_json::from_str(response_body(&response)).expect("body");
            assert_eq!(parsed.error, "No data provided");
        }

        server.stop().await.expect("stop");
    }

    #[tokio::test]
    async fn invalid_base64_is_a_500_and_writes_nothing() {
        let dir = TempDir::new().expect("tempdir");
        let (mut server, spooler, port) = start_test_server(&dir).await;

        let response = send_request(
            port,
            &post_print_raw(r#"{"PayloadBase64": "!!!not-base64!!!"}"#),
        )
        .await;

        assert_eq!(response_status(&response), 500);
        let body: ErrorBody = serde_json::from_str(response_body(&response)).expect("body");
        assert!(body.error.contains("base64"));

        assert!(!dir.path().join("Document.pdf").exists());
        assert_eq!(spooler.submission_count(), 0);

        server.stop().await.expect("stop");
    }

    #[tokio::test]
    async fn empty_payload_prints_a_zero_byte_default_document() {
        let dir = TempDir::new().expect("tempdir");
        let (mut server, spooler, port) = start_test_server(&dir).await;

        let response = send_request(port, &post_print_raw(r#"{"PayloadBase64": ""}"#)).await;

        assert_eq!(response_status(&response), 200);

        let saved = dir.path().join("Document.pdf");
        assert_eq!(std::fs::metadata(&saved).expect("metadata").len(), 0);
        assert_eq!(spooler.submission_count(), 1);

        server.stop().await.expect("stop");
    }

    #[tokio::test]
    async fn unknown_path_is_a_404() {
        let dir = TempDir::new().expect("tempdir");
        let (mut server, _spooler, port) = start_test_server(&dir).await;

        let response = send_request(
            port,
            "GET /health HTTP/1.1\r\nHost: 127.0.0.1\r\n\r\n",
        )
        .await;

        assert_eq!(response_status(&response), 404);

        server.stop().await.expect("stop");
    }

    #[tokio::test]
    async fn wrong_method_is_a_405() {
        let dir = TempDir::new().expect("tempdir");
        let (mut server, _spooler, port) = start_test_server(&dir).await;

        let response = send_request(
            port,
            "GET /api/printer/printraw HTTP/1.1\r\nHost: 127.0.0.1\r\n\r\n",
        )
        .await;

        assert_eq!(response_status(&response), 405);

        server.stop().await.expect("stop");
    }

    #[tokio::test]
    async fn preflight_gets_cors_headers() {
        let dir = TempDir::new().expect("tempdir");
        let (mut server, _spooler, port) = start_test_server(&dir).await;

        let response = send_request(
            port,
            "OPTIONS /api/printer/printraw HTTP/1.1\r\nHost: 127.0.0.1\r\n\r\n",
        )
        .await;

        assert_eq!(response_status(&response), 204);
        assert!(response.contains("Access-Control-Allow-Origin: *"));
        assert!(response.contains("Access-Control-Allow-Methods: POST, OPTIONS"));

        server.stop().await.expect("stop");
    }

    #[tokio::test]
    async fn oversize_content_length_is_rejected() {
        let dir = TempDir::new().expect("tempdir");
        let (mut server, spooler, port) = start_test_server(&dir).await;

        let request = format!(
            "POST /api/printer/printraw HTTP/1.1\r\n\
             Host: 127.0.0.1\r\n\
             Content-Length: {}\r\n\
             \r\n",
            MAX_BODY_BYTES + 1
        );
        let response = send_request(port, &request).await;

        assert_eq!(response_status(&response), 413);
        assert_eq!(spooler.submission_count(), 0);

        server.stop().await.expect("stop");
    }

    #[tokio::test]
    async fn split_writes_are_reassembled() {
        let dir = TempDir::new().expect("tempdir");
        let (mut server, _spooler, port) = start_test_server(&dir).await;

        let body = r#"{"PayloadBase64": "JVBERi0xLjQK"}"#;
        let head = format!(
            "POST /api/printer/printraw HTTP/1.1\r\n\
             Host: 127.0.0.1\r\n\
             Content-Length: {}\r\n\
             \r\n",
            body.len()
        );

        let mut stream = TcpStream::connect(("127.0.0.1", port))
            .await
            .expect("connect");
        stream.write_all(head.as_bytes()).await.expect("write head");
        stream.flush().await.expect("flush");
        tokio::time::sleep(Duration::from_millis(20)).await;
        stream.write_all(body.as_bytes()).await.expect("write body");

        let mut response = String::new();
        stream.read_to_string(&mut response).await.expect("read");

        assert_eq!(response_status(&response), 200);

        server.stop().await.expect("stop");
    }

    #[tokio::test]
    async fn config_edits_apply_to_the_next_request() {
        let dir = TempDir::new().expect("tempdir");
        let (mut server, spooler, port) = start_test_server(&dir).await;

        let first = send_request(port, &post_print_raw(r#"{"PayloadBase64": ""}"#)).await;
        assert_eq!(response_status(&first), 200);

        // The settings editor rewrites the shared file while the service
        // keeps running.
        let edited = PrinterConfig {
            pdf_folder: dir.path().to_path_buf(),
            default_printer: "Rewired".to_string(),
        };
        std::fs::write(
            dir.path().join("config").join("config.json"),
            serde_json::to_string_pretty(&edited).expect("serialize"),
        )
        .expect("external edit");

        let second = send_request(port, &post_print_raw(r#"{"PayloadBase64": ""}"#)).await;
        assert_eq!(response_status(&second), 200);

        {
            let submissions = spooler.submissions.lock().expect("lock");
            assert_eq!(submissions.len(), 2);
            assert_eq!(submissions[0].1, "Front Desk");
            assert_eq!(submissions[1].1, "Rewired");
        }

        server.stop().await.expect("stop");
    }
}
