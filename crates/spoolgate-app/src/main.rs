// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Spoolgate — loopback HTTP print bridge.
//
// Entry point for the background service: initialise logging, wire the
// configuration store and print pipeline, and serve the print-raw endpoint
// until Ctrl-C.

use std::sync::Arc;

use spoolgate_core::config::{ConfigStore, CONFIG_FILE};
use spoolgate_core::error::{Result, SpoolgateError};
use spoolgate_document::DocumentPersister;
use spoolgate_print::dispatcher::PrintDispatcher;
use spoolgate_print::pipeline::PrintPipeline;
use spoolgate_print::server::PrintServer;
use spoolgate_print::spooler::{HostDefaults, Spooler, SystemSpooler};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Spoolgate starting");

    let spooler: Arc<dyn Spooler> = Arc::new(SystemSpooler::new());
    let store = ConfigStore::open(
        CONFIG_FILE,
        Arc::new(HostDefaults::service(Arc::clone(&spooler))),
    );

    // Prime the configuration so the settings editor sees the same file
    // from first run onwards. A broken file is not fatal here; requests
    // surface the error to their callers.
    match store.load() {
        Ok(config) => tracing::info!(
            folder = %config.pdf_folder.display(),
            printer = %config.default_printer,
            "configuration loaded"
        ),
        Err(e) => tracing::warn!(error = %e, "configuration not loadable at startup"),
    }

    let pipeline = Arc::new(PrintPipeline::new(
        DocumentPersister::new(store.clone()),
        PrintDispatcher::new(store, spooler),
    ));

    let mut server = PrintServer::new(None);
    server.start(pipeline).await?;

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| SpoolgateError::Server(format!("signal handler: {e}")))?;

    tracing::info!("shutdown requested");
    server.stop().await?;

    Ok(())
}
