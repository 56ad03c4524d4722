//! Output reporting - one line (or JSON record) per packed tarball on stdout,
//! with notices and progress on stderr.

mod progress;
mod summary;

use anyhow::{Context, Result};
use std::io::Write;
use std::sync::Mutex;

pub use progress::{Progress, SilentProgress, SpinnerProgress};
pub use summary::{format_size, log_tarball};

use crate::package::{ArchiveResult, PackOptions};

#[cfg_attr(test, mockall::automock)]
pub trait Reporter: Send + Sync {
    /// Emit one result. Called once per packed spec, in order, right after packing.
    fn report(&self, result: &ArchiveResult, options: &PackOptions) -> Result<()>;
}

/// Writes results to any `Write`, flushing after each record.
pub struct ConsoleReporter<W: Write + Send> {
    out: Mutex<W>,
}

impl ConsoleReporter<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> ConsoleReporter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        match self.out.into_inner() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<W: Write + Send> Reporter for ConsoleReporter<W> {
    fn report(&self, result: &ArchiveResult, options: &PackOptions) -> Result<()> {
        let line = if options.json {
            serde_json::to_string(result).context("Failed to serialize pack result")?
        } else {
            result.filename.clone()
        };

        let mut out = self
            .out
            .lock()
            .map_err(|_| anyhow::anyhow!("Output stream lock poisoned"))?;
        writeln!(out, "{}", line).context("Failed to write pack result")?;
        out.flush().context("Failed to flush output")?;
        Ok(())
    }
}
