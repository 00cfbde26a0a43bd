// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Spoolgate — spooler access, print dispatch, and the loopback HTTP
// server.

pub mod dispatcher;
pub mod pipeline;
pub mod server;
pub mod spooler;

pub use dispatcher::PrintDispatcher;
pub use pipeline::PrintPipeline;
pub use server::{PrintServer, ServerStatus};
pub use spooler::{HostDefaults, Spooler, SystemSpooler};
