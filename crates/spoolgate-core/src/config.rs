// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// JSON configuration store shared by the print service and the settings
// editor.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::error::{Result, SpoolgateError};

/// Location of the configuration document, relative to the working
/// directory. Both the service and the settings editor resolve this against
/// the directory they were launched from, which is how two separate
/// processes end up sharing one file.
pub const CONFIG_FILE: &str = "config/config.json";

/// Environment-derived fallbacks used when the configuration file does not
/// exist yet or omits a key.
///
/// The service and the settings editor plug in different folder defaults,
/// and the printer default comes from an OS query, so the store takes these
/// as a capability rather than computing them itself.
pub trait PlatformDefaults: Send + Sync {
    /// Folder incoming documents are written to when none is configured.
    fn pdf_folder(&self) -> PathBuf;

    /// The OS default printer, if the system has one.
    fn default_printer(&self) -> Option<String>;
}

/// The persisted configuration document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrinterConfig {
    /// Folder incoming documents are saved to before printing.
    pub pdf_folder: PathBuf,
    /// Printer that documents are dispatched to. Empty means the system
    /// reported no default and nobody has configured one yet.
    pub default_printer: String,
}

/// Loose variant of [`PrinterConfig`] used only for reads, so a file with a
/// missing key still loads and gets the gap filled from defaults. Unknown
/// keys are ignored.
#[derive(Debug, Deserialize)]
struct PartialConfig {
    #[serde(default)]
    pdf_folder: Option<PathBuf>,
    #[serde(default)]
    default_printer: Option<String>,
}

/// Handle on the configuration file.
///
/// The store holds no cached state: every read goes back to disk, so edits
/// made by the settings editor are visible to the running service on its
/// next request without any signalling between the processes. Writes
/// replace the whole document via a temp file and rename, which keeps a
/// concurrent reader from ever observing a half-written file.
#[derive(Clone)]
pub struct ConfigStore {
    path: PathBuf,
    defaults: Arc<dyn PlatformDefaults>,
}

impl ConfigStore {
    /// Create a store for the file at `path`. The file itself is not
    /// touched until the first load or save.
    pub fn open(path: impl Into<PathBuf>, defaults: Arc<dyn PlatformDefaults>) -> Self {
        Self {
            path: path.into(),
            defaults,
        }
    }

    /// Path of the configuration file this store reads and writes.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The configuration that applies when nothing is on disk.
    pub fn default_config(&self) -> PrinterConfig {
        PrinterConfig {
            pdf_folder: self.defaults.pdf_folder(),
            default_printer: self.defaults.default_printer().unwrap_or_default(),
        }
    }

    /// Read the configuration from disk.
    ///
    /// A missing file is not an error: the defaults are synthesised,
    /// persisted, and returned, so the file exists from first contact
    /// onwards. Individual missing keys are filled from defaults without
    /// being written back. An unreadable or unparseable file is a read
    /// error; the broken file is left in place for the user to inspect.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn load(&self) -> Result<PrinterConfig> {
        if !self.path.exists() {
            let config = self.default_config();
            info!("no configuration file, creating one with defaults");
            self.save(&config)?;
            return Ok(config);
        }

        let raw = fs::read_to_string(&self.path).map_err(|e| {
            SpoolgateError::ConfigRead(format!("read {}: {e}", self.path.display()))
        })?;

        let partial: PartialConfig = serde_json::from_str(&raw).map_err(|e| {
            SpoolgateError::ConfigRead(format!("parse {}: {e}", self.path.display()))
        })?;

        Ok(PrinterConfig {
            pdf_folder: partial
                .pdf_folder
                .unwrap_or_else(|| self.defaults.pdf_folder()),
            default_printer: partial
                .default_printer
                .or_else(|| self.defaults.default_printer())
                .unwrap_or_default(),
        })
    }

    /// Replace the configuration on disk with `config`.
    ///
    /// The document is written to a sibling temp file and renamed into
    /// place, so a reader either sees the old document or the new one,
    /// never a torn write.
    #[instrument(skip_all, fields(path = %self.path.display()))]
    pub fn save(&self, config: &PrinterConfig) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                SpoolgateError::ConfigWrite(format!("create {}: {e}", parent.display()))
            })?;
        }

        let json = serde_json::to_string_pretty(config)
            .map_err(|e| SpoolgateError::ConfigWrite(format!("serialize: {e}")))?;

        let tmp = self.temp_path();
        fs::write(&tmp, json)
            .map_err(|e| SpoolgateError::ConfigWrite(format!("write {}: {e}", tmp.display())))?;

        fs::rename(&tmp, &self.path).map_err(|e| {
            // Leave no stray temp file behind on a failed rename.
            let _ = fs::remove_file(&tmp);
            SpoolgateError::ConfigWrite(format!(
                "rename {} -> {}: {e}",
                tmp.display(),
                self.path.display()
            ))
        })?;

        debug!("configuration saved");
        Ok(())
    }

    /// Folder documents are saved to, re-read from disk per call.
    pub fn pdf_folder(&self) -> Result<PathBuf> {
        Ok(self.load()?.pdf_folder)
    }

    /// Printer documents are dispatched to, re-read from disk per call.
    pub fn default_printer(&self) -> Result<String> {
        Ok(self.load()?.default_printer)
    }

    fn temp_path(&self) -> PathBuf {
        let mut os = self.path.clone().into_os_string();
        os.push(".tmp");
        PathBuf::from(os)
    }
}
