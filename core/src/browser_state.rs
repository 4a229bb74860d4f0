use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use crate::diagnostics::Diagnostics;
use crate::emitter::Emitter;
use crate::errors::Result;
use crate::event::{seconds_between, Event};
use crate::tab::Tab;
use crate::vocab::{is_navigation_cause, is_user_action};
use crate::window::Window;

const MAX_EVENT_HISTORY: usize = 10_000;

/// The live registry of windows and tabs while the browser is open, and the
/// dispatcher that routes every incoming event to the right window/tab
/// method.
pub struct BrowserState {
    windows: HashMap<String, Window>,
    all_tabs: HashMap<String, Tab>,
    event_history: VecDeque<Rc<Event>>,
    last_window_closed: Option<(String, i64)>,
    last_active_window: Option<String>,
}

impl BrowserState {
    pub fn new() -> Self {
        Self {
            windows: HashMap::new(),
            all_tabs: HashMap::new(),
            event_history: VecDeque::new(),
            last_window_closed: None,
            last_active_window: None,
        }
    }

    pub fn registered_tab_ids(&self) -> impl Iterator<Item = &String> {
        self.all_tabs.keys()
    }

    pub fn tab(&self, tab_id: &str) -> Option<&Tab> {
        self.all_tabs.get(tab_id)
    }

    pub fn window_count(&self) -> usize {
        self.windows.len()
    }

    pub fn has_goto_buffer(&self, win_id: &str) -> bool {
        self.windows.get(win_id).map(|w| w.goto_history_index_event.is_some()).unwrap_or(false)
    }

    pub fn take_goto_buffer(&mut self, win_id: &str) -> Option<Event> {
        self.windows.get_mut(win_id).and_then(|w| w.goto_history_index_event.take())
    }

    pub fn set_goto_buffer(&mut self, win_id: &str, event: Event) {
        if let Some(win) = self.windows.get_mut(win_id) {
            win.goto_history_index_event = Some(event);
        }
    }

    fn window_recently_closed(&self, event: &Event) -> bool {
        if let Some(prev) = self.event_history.back() {
            if prev.name == "window_unload" && prev.win() == event.win() {
                return true;
            }
        }
        if let Some((win_id, t)) = &self.last_window_closed {
            if Some(win_id.as_str()) == event.win() {
                return event.time - t < 500;
            }
        }
        false
    }

    fn resolve_tab_id(&self, event: &Event, win: &Window) -> Option<String> {
        if let Some(id) = event.tab_id() {
            return Some(id.to_string());
        }
        if let Some(idx) = event.tab_index() {
            return win.tab_at_adjusted_index(idx);
        }
        win.get_selected_tab(None)
    }

    fn event_before_last(&self) -> Option<&Rc<Event>> {
        let len = self.event_history.len();
        if len >= 2 {
            self.event_history.get(len - 2)
        } else {
            None
        }
    }

    /// Routes a single event through the registry. Appends it to the
    /// rolling history afterward, so history lookups inside the handler see
    /// only strictly earlier events.
    pub fn process_event(&mut self, event: Event, emitter: &mut Emitter, diag: &Diagnostics) -> Result<()> {
        let event = Rc::new(event);
        self.dispatch(&event, emitter, diag)?;
        self.event_history.push_back(event);
        while self.event_history.len() > MAX_EVENT_HISTORY {
            self.event_history.pop_front();
        }
        Ok(())
    }

    fn dispatch(&mut self, event: &Rc<Event>, emitter: &mut Emitter, diag: &Diagnostics) -> Result<()> {
        match event.name.as_str() {
            "ERROR" => {
                diag.warn(event.str("message").unwrap_or(""));
                return Ok(());
            }
            "WARNING" => {
                diag.warn(event.str("msg").unwrap_or(""));
                return Ok(());
            }
            "window_onload" => {
                self.new_window(event, emitter, diag)?;
                return Ok(());
            }
            _ => {}
        }

        let win_id = event.win().map(|s| s.to_string());
        let known_window = win_id.as_deref().map(|id| self.windows.contains_key(id)).unwrap_or(false);

        if !known_window {
            if self.window_recently_closed(event) {
                diag.warn(format!(
                    "Ignoring {} on recently-closed window {}",
                    event.name,
                    win_id.as_deref().unwrap_or("?")
                ));
                return Ok(());
            }
            return Err(diag.error(format!("No window known for event {}", event.name)));
        }
        let win_id = win_id.unwrap();

        if event.name == "window_unload" {
            self.close_window(&win_id, event.time);
            emitter.push(Event::derived(event, "window_close"));
            return Ok(());
        }

        if event.name == "tab_registered" {
            self.new_tab(event, &win_id, diag)?;
            return Ok(());
        }

        let tab_id = {
            let win = self.windows.get(&win_id).unwrap();
            self.resolve_tab_id(event, win)
        };

        if is_navigation_cause(&event.name) && event.is_top_level() {
            let owner = if is_user_action(&event.name) { tab_id.clone() } else { None };
            self.windows.get_mut(&win_id).unwrap().push_navigation_cause(owner, event.clone());
        }

        if event.name == "tlogger_init" || event.name == "tablogger_init" {
            self.windows.get_mut(&win_id).unwrap().tlogger_init = true;
            return Ok(());
        }

        if !self.windows.get(&win_id).unwrap().tlogger_init {
            if event.name == "TabOpen" && event.str("cause") == Some("default") {
                if event.tab_index() != Some(0) {
                    diag.warn(format!("Default tab has tabIndex {:?}", event.tab_index()));
                }
            } else {
                return Err(diag.error("No tlogger_init yet for this window"));
            }
        }

        let tab_id = tab_id.ok_or_else(|| diag.error(format!("No tab found for event {}", event.name)))?;

        if !self.all_tabs.get(&tab_id).map(|t| t.tab_open_emitted).unwrap_or(true) {
            if !matches!(event.name.as_str(), "TabOpen" | "TabRestore" | "TabMove" | "TabSelect") {
                diag.warn(format!("{} arrived immediately after tab_registered", event.name));
            }
            let win = self.windows.get_mut(&win_id).unwrap();
            let tab = self.all_tabs.get_mut(&tab_id).unwrap();
            tab.complete_tab_open(event, win, emitter)?;
        }

        if event.name != "TabMove" {
            if let Some(raw_idx) = event.tab_index() {
                self.windows.get(&win_id).unwrap().check_tab_index(&tab_id, raw_idx, diag)?;
            }
        }

        match event.name.as_str() {
            "TabOpen" => {}
            "TabRestore" => {
                self.all_tabs.get_mut(&tab_id).unwrap().set_restored(diag);
            }
            "TabMove" => {
                let idx = event.tab_index().unwrap_or(0);
                self.windows.get_mut(&win_id).unwrap().move_tab(&tab_id, idx);
                emitter.push(Event::derived(event, "tab_move"));
            }
            "TabSelect" => {
                let win = self.windows.get_mut(&win_id).unwrap();
                win.select_tab(event.time, Some(tab_id.clone()));
                win.pending_tab_close_index = -1;
                emitter.push(Event::derived(event, "tab_select"));
            }
            "TabClose" => {
                let win = self.windows.get_mut(&win_id).unwrap();
                if win.get_selected_tab(None).as_deref() == Some(tab_id.as_str()) {
                    let idx = win.index_of(&tab_id).unwrap_or(-1);
                    win.select_tab(event.time, None);
                    win.pending_tab_close_index = idx;
                }
                win.remove_tab(&tab_id);
                let tab_count = win.tab_count() as i64;
                emitter.push(Event::derived(event, "tab_close").set("tab_count", tab_count));
            }
            "openNewTabWith" | "openNewWindowWith" => {}
            "load_start" => {
                if event.is_top_level() {
                    let last = self.event_history.back().cloned();
                    let win = self.windows.get_mut(&win_id).unwrap();
                    let tab = self.all_tabs.get_mut(&tab_id).unwrap();
                    tab.load_start(event, win, last.as_deref(), diag)?;
                }
            }
            "redirect" => {
                self.all_tabs.get_mut(&tab_id).unwrap().redirect(event, diag)?;
            }
            "LocationChange" => {
                if event.is_top_level() {
                    let last = self.event_history.back().cloned();
                    let win = self.windows.get_mut(&win_id).unwrap();
                    let tab = self.all_tabs.get_mut(&tab_id).unwrap();
                    tab.location_change(event, win, last.as_deref(), emitter, diag)?;
                }
            }
            "load" => {
                if event.is_top_level() {
                    let url = event.str("url").unwrap_or_default().to_string();
                    if url != "about:blank" {
                        let tab = self.all_tabs.get_mut(&tab_id).unwrap();
                        if tab.record_load(&url, event.time, diag) {
                            emitter.push(Event::derived(event, "load"));
                        } else {
                            diag.warn(format!("Ignoring load of {url} without a navigation action"));
                        }
                    }
                }
            }
            "question" => {
                emitter.push(Event::derived(event, "question"));
            }
            "bookmark_visit" => {
                self.handle_bookmark_visit(event, emitter, diag);
            }
            name if is_navigation_cause(name) => {}
            name if is_user_action(name) => {
                self.update_active_window(event, &win_id, diag)?;
            }
            name => {
                return Err(diag.error(format!("Unexpected event {name} on tab {tab_id}")));
            }
        }

        Ok(())
    }

    fn new_window(&mut self, event: &Rc<Event>, emitter: &mut Emitter, diag: &Diagnostics) -> Result<()> {
        let win_id = event.win().unwrap_or_default().to_string();
        if self.windows.contains_key(&win_id) {
            return Err(diag.error("Duplicate window id"));
        }

        let cause_descr = match self.event_history.back() {
            None => "default".to_string(),
            Some(cause) if cause.name == "openNewWindowWith" => {
                let root = self.event_before_last().map(|e| e.name.clone()).unwrap_or_else(|| "unknown".to_string());
                format!("{root}/{}", cause.name)
            }
            Some(cause) => cause.name.clone(),
        };

        emitter.push(Event::derived(event, "window_open").set("cause", cause_descr));
        self.windows.insert(win_id.clone(), Window::new(win_id));
        Ok(())
    }

    fn close_window(&mut self, win_id: &str, time: i64) {
        self.windows.remove(win_id);
        self.last_window_closed = Some((win_id.to_string(), time));
    }

    fn new_tab(&mut self, event: &Rc<Event>, win_id: &str, diag: &Diagnostics) -> Result<()> {
        let tab_id = event.tab_id().ok_or_else(|| diag.error("tab_registered without a tabId"))?.to_string();
        if self.all_tabs.contains_key(&tab_id) {
            return Err(diag.error("Duplicate tabId"));
        }

        let mut opened_new_tab_with = false;
        let cause = match self.event_history.back() {
            None => None,
            Some(last) if last.name == "window_onload" => {
                let win = self.windows.get(win_id).unwrap();
                if win.tab_count() != 0 {
                    return Err(diag.error("Expected this to be the first tab on a new window"));
                }
                Some(last.clone())
            }
            Some(last) if last.name == "openNewTabWith" => {
                opened_new_tab_with = true;
                self.event_before_last().cloned()
            }
            Some(last) => Some(last.clone()),
        };

        let tab = Tab::new(tab_id.clone(), win_id.to_string(), cause, opened_new_tab_with);
        self.all_tabs.insert(tab_id, tab);
        Ok(())
    }

    fn update_active_window(&mut self, event: &Event, win_id: &str, diag: &Diagnostics) -> Result<()> {
        self.last_active_window = Some(win_id.to_string());
        if let Some(tid) = event.tab_id() {
            let win = self.windows.get(win_id).unwrap();
            if win.get_selected_tab(None).as_deref() != Some(tid) {
                return Err(diag.error(format!("{} has inconsistent tabIndex", event.name)));
            }
        }
        Ok(())
    }

    /// Walks recently-emitted `navigation` events backward looking for the
    /// one this bookmark visit confirms, and relabels its cause. Duplicate
    /// visits to the same URL back-to-back are dropped.
    fn handle_bookmark_visit(&mut self, event: &Rc<Event>, emitter: &mut Emitter, diag: &Diagnostics) {
        let url = event.str("url").unwrap_or_default().to_string();
        if let Some(prev) = self.event_history.back() {
            if prev.name == "bookmark_visit" && prev.str("url") == Some(url.as_str()) {
                return;
            }
        }

        let mut found = false;
        for ev in emitter.iter_mut().rev() {
            if seconds_between(ev, event) > 10.0 {
                break;
            }
            if ev.name == "navigation" && ev.str("url") == Some(url.as_str()) {
                ev.fields.insert("cause".to_string(), "bookmark_visit".into());
                found = true;
                break;
            }
        }
        if !found {
            diag.warn(format!("No matching navigation event found for bookmark_visit to {url}"));
        }
    }
}

impl Default for BrowserState {
    fn default() -> Self {
        Self::new()
    }
}
