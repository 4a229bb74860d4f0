use std::cell::Cell;

use tracing::{error, info, warn};

use crate::errors::CompileError;

/// Line-number-prefixed, severity-banded logging facade over `tracing`.
///
/// Every emitted message is tagged with the input line currently being
/// processed, mirroring a debugger stepping through the log one record at a
/// time. `warn` and `info` are non-fatal; `error` additionally builds the
/// [`CompileError`] that aborts the fold.
pub struct Diagnostics {
    line: Cell<usize>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self { line: Cell::new(0) }
    }

    pub fn set_line(&self, line: usize) {
        self.line.set(line);
    }

    pub fn line(&self) -> usize {
        self.line.get()
    }

    pub fn info(&self, message: impl std::fmt::Display) {
        info!(line = self.line.get(), "{}", message);
    }

    pub fn warn(&self, message: impl std::fmt::Display) {
        warn!(line = self.line.get(), "{}", message);
    }

    /// Logs at error level and builds the [`CompileError::Invariant`] that
    /// the caller should return to abort the fold.
    pub fn error(&self, message: impl std::fmt::Display) -> CompileError {
        let line = self.line.get();
        let message = message.to_string();
        error!(line, "{}", message);
        CompileError::Invariant { line, message }
    }
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new()
    }
}
