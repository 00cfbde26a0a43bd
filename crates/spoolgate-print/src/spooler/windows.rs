// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Win32-backed spooler access.
//
// Submission goes through the shell "printto" verb, which routes the file
// to whatever application is registered for printing its type, with the
// printer name as the verb argument. Queries use the winspool APIs.

use std::ffi::OsStr;
use std::os::windows::ffi::OsStrExt;
use std::path::Path;

use tracing::{debug, info};

use spoolgate_core::error::{Result, SpoolgateError};

use windows_sys::Win32::Graphics::Printing::{
    EnumPrintersW, GetDefaultPrinterW, PRINTER_ENUM_CONNECTIONS, PRINTER_ENUM_LOCAL,
    PRINTER_INFO_4W,
};
use windows_sys::Win32::UI::Shell::ShellExecuteW;
use windows_sys::Win32::UI::WindowsAndMessaging::SW_HIDE;

/// NUL-terminated UTF-16 for Win32 string parameters.
fn wide(s: &OsStr) -> Vec<u16> {
    s.encode_wide().chain(std::iter::once(0)).collect()
}

pub(super) fn submit_job(path: &Path, printer: &str) -> Result<()> {
    let operation = wide(OsStr::new("printto"));
    let file = wide(path.as_os_str());
    // The verb's command template expects the printer name as one quoted
    // argument.
    let quoted = format!("\"{printer}\"");
    let parameters = wide(OsStr::new(&quoted));
    let directory = wide(OsStr::new("."));

    let rc = unsafe {
        ShellExecuteW(
            std::ptr::null_mut(),
            operation.as_ptr(),
            file.as_ptr(),
            parameters.as_ptr(),
            directory.as_ptr(),
            SW_HIDE,
        )
    };

    // ShellExecute reports errors as return values of 32 or less.
    if rc as isize <= 32 {
        return Err(SpoolgateError::PrintDispatch(format!(
            "ShellExecute printto failed with code {}",
            rc as isize
        )));
    }

    info!(printer, path = %path.display(), "job handed to shell printto");
    Ok(())
}

pub(super) fn default_printer() -> Result<Option<String>> {
    // First call sizes the buffer, second call fills it.
    let mut needed: u32 = 0;
    unsafe {
        GetDefaultPrinterW(std::ptr::null_mut(), &mut needed);
    }
    if needed == 0 {
        return Ok(None);
    }

    let mut buf = vec![0u16; needed as usize];
    let ok = unsafe { GetDefaultPrinterW(buf.as_mut_ptr(), &mut needed) };
    if ok == 0 {
        return Ok(None);
    }

    let len = buf.iter().position(|&c| c == 0).unwrap_or(buf.len());
    let name = String::from_utf16_lossy(&buf[..len]);
    debug!(printer = %name, "queried default printer");
    Ok(Some(name))
}

pub(super) fn printers() -> Result<Vec<String>> {
    let flags = PRINTER_ENUM_LOCAL | PRINTER_ENUM_CONNECTIONS;
    let mut needed: u32 = 0;
    let mut returned: u32 = 0;

    unsafe {
        EnumPrintersW(
            flags,
            std::ptr::null(),
            4,
            std::ptr::null_mut(),
            0,
            &mut needed,
            &mut returned,
        );
    }
    if needed == 0 {
        return Ok(Vec::new());
    }

    let mut buf = vec![0u8; needed as usize];
    let ok = unsafe {
        EnumPrintersW(
            flags,
            std::ptr::null(),
            4,
            buf.as_mut_ptr(),
            needed,
            &mut needed,
            &mut returned,
        )
    };
    if ok == 0 {
        return Err(SpoolgateError::PrintDispatch(
            "EnumPrinters failed".to_string(),
        ));
    }

    let mut names = Vec::with_capacity(returned as usize);
    let infos = buf.as_ptr() as *const PRINTER_INFO_4W;
    for i in 0..returned as usize {
        let info = unsafe { &*infos.add(i) };
        if info.pPrinterName.is_null() {
            continue;
        }
        let mut len = 0;
        while unsafe { *info.pPrinterName.add(len) } != 0 {
            len += 1;
        }
        let slice = unsafe { std::slice::from_raw_parts(info.pPrinterName, len) };
        names.push(String::from_utf16_lossy(slice));
    }
    Ok(names)
}
