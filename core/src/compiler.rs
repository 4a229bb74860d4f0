use std::collections::HashSet;
use std::io::BufRead;

use crate::diagnostics::Diagnostics;
use crate::emitter::Emitter;
use crate::errors::Result;
use crate::event::Event;
use crate::reader::EventReader;
use crate::session::SessionState;

/// Drives a single compile: pulls events from the reader, feeds them
/// through the session state machine one at a time, and collects whatever
/// the state machine emits.
pub struct Compiler {
    state: SessionState,
    emitter: Emitter,
    diag: Diagnostics,
}

impl Compiler {
    pub fn new() -> Self {
        Self { state: SessionState::new(), emitter: Emitter::new(), diag: Diagnostics::new() }
    }

    pub fn compile<R: BufRead>(mut self, source: R, ignored: HashSet<String>) -> Result<Vec<Event>> {
        let mut reader = EventReader::with_ignored(source, ignored);
        while let Some(event) = reader.next()? {
            self.diag.set_line(reader.current_line());
            self.state.step(event, &mut self.emitter, &self.diag)?;
        }
        Ok(self.emitter.into_vec())
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

/// Compiles a log with the default (empty) ignore set.
pub fn compile<R: BufRead>(source: R) -> Result<Vec<Event>> {
    Compiler::new().compile(source, HashSet::new())
}
