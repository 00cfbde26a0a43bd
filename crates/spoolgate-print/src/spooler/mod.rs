// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The OS print subsystem as an injectable capability.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::warn;

use spoolgate_core::config::PlatformDefaults;
use spoolgate_core::error::Result;

#[cfg(unix)]
mod unix;
#[cfg(windows)]
mod windows;

/// Access to the OS print subsystem.
///
/// Submission is fire-and-forget: `submit_job` returning `Ok` means the OS
/// accepted the job, not that anything came out of the printer. Everything
/// downstream of acceptance belongs to the OS spooler.
pub trait Spooler: Send + Sync {
    /// Queue the file at `path` on the named printer.
    fn submit_job(&self, path: &Path, printer: &str) -> Result<()>;

    /// The system default printer, `None` when the OS has none configured.
    fn default_printer(&self) -> Result<Option<String>>;

    /// All printers known to the OS.
    fn printers(&self) -> Result<Vec<String>>;
}

/// The real OS spooler.
///
/// * Unix: CUPS via the `lp` and `lpstat` command-line tools.
/// * Windows: the shell `printto` verb and the winspool enumeration APIs.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemSpooler;

impl SystemSpooler {
    pub fn new() -> Self {
        Self
    }
}

impl Spooler for SystemSpooler {
    fn submit_job(&self, path: &Path, printer: &str) -> Result<()> {
        #[cfg(unix)]
        {
            unix::submit_job(path, printer)
        }

        #[cfg(windows)]
        {
            windows::submit_job(path, printer)
        }

        #[cfg(not(any(unix, windows)))]
        {
            let _ = (path, printer);
            Err(spoolgate_core::error::SpoolgateError::PrintDispatch(
                "printing is not supported on this platform".to_string(),
            ))
        }
    }

    fn default_printer(&self) -> Result<Option<String>> {
        #[cfg(unix)]
        {
            unix::default_printer()
        }

        #[cfg(windows)]
        {
            windows::default_printer()
        }

        #[cfg(not(any(unix, windows)))]
        {
            Ok(None)
        }
    }

    fn printers(&self) -> Result<Vec<String>> {
        #[cfg(unix)]
        {
            unix::printers()
        }

        #[cfg(windows)]
        {
            windows::printers()
        }

        #[cfg(not(any(unix, windows)))]
        {
            Ok(Vec::new())
        }
    }
}

/// Platform defaults backed by a spooler query.
///
/// The folder default differs by context: the service drops documents in
/// the system temp directory, while the settings editor proposes the
/// user's home directory as a friendlier starting point.
pub struct HostDefaults {
    folder: PathBuf,
    spooler: Arc<dyn Spooler>,
}

impl HostDefaults {
    /// Defaults for the background service.
    pub fn service(spooler: Arc<dyn Spooler>) -> Self {
        Self {
            folder: std::env::temp_dir(),
            spooler,
        }
    }

    /// Defaults for the settings editor.
    pub fn editor(spooler: Arc<dyn Spooler>) -> Self {
        Self {
            folder: dirs::home_dir().unwrap_or_else(std::env::temp_dir),
            spooler,
        }
    }
}

impl PlatformDefaults for HostDefaults {
    fn pdf_folder(&self) -> PathBuf {
        self.folder.clone()
    }

    fn default_printer(&self) -> Option<String> {
        match self.spooler.default_printer() {
            Ok(printer) => printer,
            Err(e) => {
                warn!(error = %e, "default printer query failed");
                None
            }
        }
    }
}
