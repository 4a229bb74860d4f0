use std::collections::VecDeque;
use std::rc::Rc;

use crate::diagnostics::Diagnostics;
use crate::errors::Result;
use crate::event::Event;

const MAX_NAVIGATION_CAUSES: usize = 256;

/// A single browser window: its tab strip, its selection history, and the
/// ring of recent candidate navigation causes tabs within it can draw on.
#[derive(Debug, Clone)]
pub struct Window {
    pub win_id: String,
    /// Tab strip by position; `None` marks a just-closed slot awaiting a
    /// pending insert (see `pending_tab_close_index`).
    pub tabs: Vec<Option<String>>,
    /// Chronological `(time, tab|None)` selection records.
    pub selection_history: Vec<(i64, Option<String>)>,
    /// `(owning tab, event)` pairs, newest at the back.
    pub navigation_causes: VecDeque<(Option<String>, Rc<Event>)>,
    pub tlogger_init: bool,
    pub pending_tab_close_index: i64,
    /// First-seen `gotoHistoryIndex` during startup, buffered until the
    /// next non-`gotoHistoryIndex` event flushes it.
    pub goto_history_index_event: Option<Event>,
}

impl Window {
    pub fn new(win_id: impl Into<String>) -> Self {
        Self {
            win_id: win_id.into(),
            tabs: Vec::new(),
            selection_history: Vec::new(),
            navigation_causes: VecDeque::new(),
            tlogger_init: false,
            pending_tab_close_index: -1,
            goto_history_index_event: None,
        }
    }

    pub fn tab_count(&self) -> usize {
        self.tabs.iter().filter(|t| t.is_some()).count()
    }

    pub fn index_of(&self, tab_id: &str) -> Option<i64> {
        self.tabs.iter().position(|t| t.as_deref() == Some(tab_id)).map(|i| i as i64)
    }

    /// A `TabClose` on tab N shifts every later `tabIndex` down by one until
    /// the close is acknowledged; this undoes that shift for an index
    /// reported while the close is still pending.
    fn adjust_index(&self, index: i64) -> i64 {
        if self.pending_tab_close_index >= 0 && self.pending_tab_close_index <= index {
            index - 1
        } else {
            index
        }
    }

    pub fn tab_at_adjusted_index(&self, raw_index: i64) -> Option<String> {
        let idx = self.adjust_index(raw_index);
        if idx < 0 {
            return None;
        }
        self.tabs.get(idx as usize).cloned().flatten()
    }

    /// Places `tab_id` at `raw_index` (T-1-adjusted). A pending close leaves
    /// a `None` placeholder at its old slot; a fresh tab overwrites it, an
    /// otherwise out-of-range index grows the strip.
    pub fn insert_tab(&mut self, tab_id: String, raw_index: i64, time: i64) {
        let first_tab = self.tabs.is_empty();
        let index = self.adjust_index(raw_index).max(0) as usize;

        if index < self.tabs.len() {
            if self.tabs[index].is_none() {
                self.tabs[index] = Some(tab_id.clone());
            } else {
                self.tabs.insert(index, Some(tab_id.clone()));
            }
        } else {
            self.tabs.resize(index, None);
            self.tabs.push(Some(tab_id.clone()));
        }

        if first_tab {
            self.select_tab(time, Some(tab_id));
        }
    }

    pub fn move_tab(&mut self, tab_id: &str, raw_index: i64) {
        if let Some(pos) = self.tabs.iter().position(|t| t.as_deref() == Some(tab_id)) {
            self.tabs.remove(pos);
        }
        let idx = (raw_index.max(0) as usize).min(self.tabs.len());
        self.tabs.insert(idx, Some(tab_id.to_string()));
    }

    pub fn remove_tab(&mut self, tab_id: &str) {
        if let Some(pos) = self.tabs.iter().position(|t| t.as_deref() == Some(tab_id)) {
            self.tabs.remove(pos);
        }
    }

    pub fn check_tab_index(&self, tab_id: &str, raw_index: i64, diag: &Diagnostics) -> Result<()> {
        let expected = self.adjust_index(raw_index);
        if self.index_of(tab_id) != Some(expected) {
            return Err(diag.error(format!("{tab_id} has inconsistent tabIndex")));
        }
        Ok(())
    }

    pub fn select_tab(&mut self, time: i64, tab: Option<String>) {
        self.selection_history.push((time, tab));
    }

    /// The selected tab as of `at`, or the most recent selection when `at`
    /// is `None`.
    pub fn get_selected_tab(&self, at: Option<i64>) -> Option<String> {
        match at {
            None => self.selection_history.last().and_then(|(_, t)| t.clone()),
            Some(t) => self
                .selection_history
                .iter()
                .rev()
                .find(|(time, _)| *time < t)
                .and_then(|(_, tab)| tab.clone()),
        }
    }

    pub fn push_navigation_cause(&mut self, owner: Option<String>, event: Rc<Event>) {
        self.navigation_causes.push_back((owner, event));
        while self.navigation_causes.len() > MAX_NAVIGATION_CAUSES {
            self.navigation_causes.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_close_adjusts_indices_at_and_above_the_closed_slot() {
        let mut win = Window::new("w1");
        win.pending_tab_close_index = 2;
        assert_eq!(win.adjust_index(1), 1);
        assert_eq!(win.adjust_index(2), 1);
        assert_eq!(win.adjust_index(3), 2);
    }

    #[test]
    fn insert_tab_selects_the_first_tab_in_a_window() {
        let mut win = Window::new("w1");
        win.insert_tab("t1".to_string(), 0, 100);
        assert_eq!(win.get_selected_tab(None), Some("t1".to_string()));
    }

    #[test]
    fn insert_tab_fills_a_pending_close_placeholder() {
        let mut win = Window::new("w1");
        win.insert_tab("t1".to_string(), 0, 0);
        win.insert_tab("t2".to_string(), 1, 0);
        win.pending_tab_close_index = 0;
        win.tabs[0] = None;

        win.insert_tab("t3".to_string(), 0, 100);
        assert_eq!(win.tabs[0], Some("t3".to_string()));
        assert_eq!(win.tab_count(), 2);
    }

    #[test]
    fn get_selected_tab_as_of_a_past_time() {
        let mut win = Window::new("w1");
        win.select_tab(10, Some("t1".to_string()));
        win.select_tab(20, Some("t2".to_string()));
        assert_eq!(win.get_selected_tab(Some(15)), Some("t1".to_string()));
        assert_eq!(win.get_selected_tab(Some(25)), Some("t2".to_string()));
        assert_eq!(win.get_selected_tab(None), Some("t2".to_string()));
    }

    #[test]
    fn navigation_cause_ring_is_capped() {
        let mut win = Window::new("w1");
        for i in 0..(MAX_NAVIGATION_CAUSES + 10) {
            win.push_navigation_cause(None, Rc::new(Event::new("LINK_CLICK", i as i64)));
        }
        assert_eq!(win.navigation_causes.len(), MAX_NAVIGATION_CAUSES);
    }
}
