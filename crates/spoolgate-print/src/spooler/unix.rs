// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// CUPS-backed spooler access for Linux and macOS.
//
// Goes through the `lp` and `lpstat` command-line tools rather than
// linking libcups: they are present wherever CUPS is, and the bridge only
// needs job submission and two queries.

use std::path::Path;
use std::process::Command;

use tracing::{debug, info};

use spoolgate_core::error::{Result, SpoolgateError};

/// Queue the file at `path` on `printer` via `lp`.
///
/// `lp` returns as soon as the job is queued; completion is the spooler's
/// business.
pub(super) fn submit_job(path: &Path, printer: &str) -> Result<()> {
    let title = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());

    let output = Command::new("lp")
        .arg("-d")
        .arg(printer)
        .arg("-t")
        .arg(&title)
        .arg("--")
        .arg(path)
        .output()
        .map_err(|e| SpoolgateError::PrintDispatch(format!("spawn lp: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(SpoolgateError::PrintDispatch(format!(
            "lp exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }

    info!(printer, path = %path.display(), "job handed to lp");
    Ok(())
}

/// The system default destination, via `lpstat -d`.
///
/// Output is `system default destination: <name>` when one is set, and
/// `no system default destination` (no colon) when not.
pub(super) fn default_printer() -> Result<Option<String>> {
    let output = Command::new("lpstat")
        .arg("-d")
        .output()
        .map_err(|e| SpoolgateError::PrintDispatch(format!("spawn lpstat: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(SpoolgateError::PrintDispatch(format!(
            "lpstat -d exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let printer = stdout
        .lines()
        .find_map(|line| line.split_once(':'))
        .map(|(_, name)| name.trim().to_string())
        .filter(|name| !name.is_empty());

    debug!(printer = ?printer, "queried default destination");
    Ok(printer)
}

/// All destinations known to CUPS, via `lpstat -e` (one name per line).
pub(super) fn printers() -> Result<Vec<String>> {
    let output = Command::new("lpstat")
        .arg("-e")
        .output()
        .map_err(|e| SpoolgateError::PrintDispatch(format!("spawn lpstat: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(SpoolgateError::PrintDispatch(format!(
            "lpstat -e exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect())
}
