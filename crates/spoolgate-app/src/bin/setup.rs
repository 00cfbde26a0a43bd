// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Spoolgate settings editor.
//
// Companion process for the print service. It reads and writes the same
// config/config.json and lists OS printers so the user picks a real one.
// All writes go through the store's atomic save; the running service picks
// changes up on its next request, no restart needed.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use spoolgate_core::config::{ConfigStore, PrinterConfig, CONFIG_FILE};
use spoolgate_core::error::{Result, SpoolgateError};
use spoolgate_print::spooler::{HostDefaults, Spooler, SystemSpooler};

#[derive(Debug, Parser)]
#[command(
    name = "spoolgate-setup",
    about = "Configure the Spoolgate print bridge",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show the current configuration.
    Show,
    /// List printers known to the OS.
    Printers,
    /// Set the folder incoming documents are saved to.
    SetFolder {
        /// An existing directory; stored as an absolute path.
        path: PathBuf,
    },
    /// Set the printer documents are dispatched to.
    SetPrinter {
        /// A printer name as shown by `printers`.
        name: String,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let spooler: Arc<dyn Spooler> = Arc::new(SystemSpooler::new());
    let store = ConfigStore::open(
        CONFIG_FILE,
        Arc::new(HostDefaults::editor(Arc::clone(&spooler))),
    );

    match run(&cli.command, &store, spooler.as_ref()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: &Command, store: &ConfigStore, spooler: &dyn Spooler) -> Result<()> {
    match command {
        Command::Show => show(store),
        Command::Printers => printers(spooler),
        Command::SetFolder { path } => set_folder(store, path),
        Command::SetPrinter { name } => set_printer(store, spooler, name),
    }
}

/// Print the current configuration, or the in-memory defaults when the
/// file is broken.
fn show(store: &ConfigStore) -> Result<()> {
    let config = load_or_default(store);
    println!("config file:     {}", store.path().display());
    println!("pdf_folder:      {}", config.pdf_folder.display());
    println!(
        "default_printer: {}",
        display_printer(&config.default_printer)
    );
    Ok(())
}

/// List the printers the OS knows, marking the system default.
fn printers(spooler: &dyn Spooler) -> Result<()> {
    let names = spooler.printers()?;
    if names.is_empty() {
        println!("no printers found");
        return Ok(());
    }

    let default = spooler.default_printer().unwrap_or_default();
    for name in &names {
        let marker = if Some(name) == default.as_ref() {
            "*"
        } else {
            " "
        };
        println!("{marker} {name}");
    }
    Ok(())
}

fn set_folder(store: &ConfigStore, path: &Path) -> Result<()> {
    let absolute = fs::canonicalize(path)
        .map_err(|e| SpoolgateError::ConfigWrite(format!("folder {}: {e}", path.display())))?;
    if !absolute.is_dir() {
        return Err(SpoolgateError::ConfigWrite(format!(
            "{} is not a directory",
            absolute.display()
        )));
    }

    let mut config = load_or_default(store);
    config.pdf_folder = absolute;
    store.save(&config)?;
    println!(
        "saved: documents will be written to {}",
        config.pdf_folder.display()
    );
    Ok(())
}

fn set_printer(store: &ConfigStore, spooler: &dyn Spooler, name: &str) -> Result<()> {
    // Accept the name anyway when enumeration is unavailable; the OS checks
    // again at dispatch time.
    match spooler.printers() {
        Ok(names) if !names.iter().any(|n| n == name) => {
            return Err(SpoolgateError::ConfigWrite(format!(
                "unknown printer {name:?}; run `spoolgate-setup printers` for the list"
            )));
        }
        Ok(_) => {}
        Err(e) => eprintln!("warning: could not list printers ({e}); saving anyway"),
    }

    let mut config = load_or_default(store);
    config.default_printer = name.to_string();
    store.save(&config)?;
    println!("saved: documents will be dispatched to {name}");
    Ok(())
}

/// Read the current document, falling back to defaults with a notice when
/// the file exists but cannot be parsed. The broken file gets replaced
/// wholesale by the next save.
fn load_or_default(store: &ConfigStore) -> PrinterConfig {
    match store.load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("warning: {e}; using defaults");
            store.default_config()
        }
    }
}

fn display_printer(name: &str) -> &str {
    if name.is_empty() { "(none)" } else { name }
}
