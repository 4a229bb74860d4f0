use crate::diagnostics::Diagnostics;
use crate::navigation::NavigationAction;

/// A per-tab simulation of the browser's back/forward history list.
///
/// Each entry is the `(url, original_url)` pair of a completed navigation;
/// `original_url` lets a redirected navigation still be matched by the page
/// the user actually requested. `current_index` points at the entry the tab
/// is presently "on" (-1 when the stack is empty).
#[derive(Debug, Clone, Default)]
pub struct BackStack {
    entries: Vec<(String, Option<String>)>,
    current_index: i64,
}

enum Direction {
    Down,
    Up,
}

impl BackStack {
    pub fn new() -> Self {
        Self { entries: Vec::new(), current_index: -1 }
    }

    fn matches(entry: &(String, Option<String>), url: &str) -> bool {
        entry.0 == url || entry.1.as_deref() == Some(url)
    }

    fn scan(&self, from: i64, url: &str, dir: Direction) -> Option<i64> {
        match dir {
            Direction::Down => {
                let mut idx = from.min(self.entries.len() as i64 - 1);
                while idx >= 0 {
                    if Self::matches(&self.entries[idx as usize], url) {
                        return Some(idx - from);
                    }
                    idx -= 1;
                }
            }
            Direction::Up => {
                let mut idx = (from + 1).max(0);
                while (idx as usize) < self.entries.len() {
                    if Self::matches(&self.entries[idx as usize], url) {
                        return Some(idx - from);
                    }
                    idx += 1;
                }
            }
        }
        None
    }

    /// Attaches `back_distance`/`forward_distance`/`match_index` to `nav`
    /// and, for a cause that targets a specific history entry, moves
    /// `current_index` to it. For an ordinary forward navigation, pushes a
    /// new entry unless the current entry already matches (a same-page
    /// reload), truncating any forward history first.
    pub fn process(&mut self, nav: &mut NavigationAction, diag: &Diagnostics) {
        let url = match &nav.url {
            Some(u) => u.clone(),
            None => return,
        };

        let back = self.scan(self.current_index, &url, Direction::Down);
        let forward = self.scan(self.current_index, &url, Direction::Up);
        nav.back_distance = back;
        nav.forward_distance = forward;

        match nav.cause_name() {
            "OnHistoryGoBack" => match back {
                Some(d) => {
                    self.current_index += d;
                    if d.abs() != 1 {
                        diag.info(format!("Actual back distance: {}", d.abs()));
                    }
                }
                None => diag.warn("OnHistoryGoBack with no matching back-stack entry"),
            },
            "BrowserForward" => match forward {
                Some(d) => {
                    self.current_index += d;
                    if d.abs() != 1 {
                        diag.info(format!("Actual forward distance: {}", d.abs()));
                    }
                }
                None => diag.warn("BrowserForward with no matching back-stack entry"),
            },
            "gotoHistoryIndex" => {
                let start =
                    nav.cause.as_ref().and_then(|c| c.i64("index")).unwrap_or(self.current_index);
                let back2 = self.scan(start, &url, Direction::Down);
                let fwd2 = self.scan(start, &url, Direction::Up);
                let chosen = match (back2, fwd2) {
                    (Some(b), Some(f)) => Some(start + if f.abs() <= b.abs() { f } else { b }),
                    (Some(b), None) => Some(start + b),
                    (None, Some(f)) => Some(start + f),
                    (None, None) => {
                        diag.warn("gotoHistoryIndex with no matching back-stack entry");
                        None
                    }
                };
                if let Some(idx) = chosen {
                    self.current_index = idx;
                }
            }
            _ => {
                let at_current = self.current_index >= 0
                    && (self.current_index as usize) < self.entries.len()
                    && Self::matches(&self.entries[self.current_index as usize], &url);
                if !at_current || nav.cause_name() == "form_submit" {
                    let next = (self.current_index + 1).max(0) as usize;
                    self.entries.truncate(next);
                    self.entries.push((url, nav.original_url.clone()));
                    self.current_index = next as i64;
                }
            }
        }
        nav.match_index = Some(self.current_index);
    }
}
