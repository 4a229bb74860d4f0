use std::collections::{HashSet, VecDeque};
use std::io::BufRead;

use regex::Regex;
use serde_json::Value;

use crate::errors::CompileError;
use crate::event::Event;

/// Reads the newline-delimited `[<millis> ]<json object>` log format into
/// [`Event`]s, one line at a time, with a growable lookahead buffer so
/// callers can peek several records ahead without consuming them.
///
/// Blank lines are skipped. A line that is neither blank nor of the
/// expected shape is a fatal parse error carrying the 1-based line number.
pub struct EventReader<R> {
    lines: std::io::Lines<R>,
    line_no: usize,
    lookahead: VecDeque<Event>,
    ignored: HashSet<String>,
    line_re: Regex,
}

impl<R: BufRead> EventReader<R> {
    pub fn new(source: R) -> Self {
        Self::with_ignored(source, HashSet::new())
    }

    pub fn with_ignored(source: R, ignored: HashSet<String>) -> Self {
        Self {
            lines: source.lines(),
            line_no: 0,
            lookahead: VecDeque::new(),
            ignored,
            line_re: Regex::new(r"^\s*(?:(\d+)[ \t]+)?(\{.*\})\s*$").unwrap(),
        }
    }

    pub fn current_line(&self) -> usize {
        self.line_no
    }

    /// Returns the next event, consuming it.
    pub fn next(&mut self) -> Result<Option<Event>, CompileError> {
        if let Some(event) = self.lookahead.pop_front() {
            return Ok(Some(event));
        }
        self.next_impl()
    }

    /// Returns the event `index` positions ahead without consuming it.
    pub fn peek(&mut self, index: usize) -> Result<Option<&Event>, CompileError> {
        while self.lookahead.len() <= index {
            match self.next_impl()? {
                Some(event) => self.lookahead.push_back(event),
                None => return Ok(None),
            }
        }
        Ok(self.lookahead.get(index))
    }

    fn next_impl(&mut self) -> Result<Option<Event>, CompileError> {
        loop {
            let line = match self.lines.next() {
                Some(line) => line?,
                None => return Ok(None),
            };
            self.line_no += 1;
            if line.trim().is_empty() {
                continue;
            }

            let caps = self.line_re.captures(&line).ok_or_else(|| CompileError::Parse {
                line: self.line_no,
                message: format!("unrecognized log line: {line:?}"),
            })?;
            let ts = caps.get(1).map(|m| m.as_str().parse::<i64>().unwrap());
            let json_text = caps.get(2).unwrap().as_str();

            let value: Value = serde_json::from_str(json_text).map_err(|e| CompileError::Parse {
                line: self.line_no,
                message: format!("invalid JSON: {e}"),
            })?;
            if ts.is_none() && !Event::has_time_field(&value) {
                return Err(CompileError::Parse {
                    line: self.line_no,
                    message: "event has no timestamp prefix and no 'time' field".to_string(),
                });
            }
            let mut event = Event::from_json(value).ok_or_else(|| CompileError::Parse {
                line: self.line_no,
                message: "event object is missing an 'event' field".to_string(),
            })?;
            if let Some(t) = ts {
                event.time = t;
            }
            if self.ignored.contains(&event.name) {
                continue;
            }
            return Ok(Some(event));
        }
    }
}
