use std::rc::Rc;

use crate::backstack::BackStack;
use crate::diagnostics::Diagnostics;
use crate::emitter::Emitter;
use crate::errors::Result;
use crate::event::{seconds_between, Event};
use crate::navigation::NavigationAction;
use crate::window::Window;

/// A single browser tab: the chain of navigations it has carried, and the
/// back/forward history those navigations fed.
pub struct Tab {
    pub tab_id: String,
    pub win_id: String,
    pub tab_open_cause: Option<Rc<Event>>,
    pub opened_new_tab_with: bool,
    pub tab_open_emitted: bool,
    pub restored: bool,
    pub nav_action: Option<NavigationAction>,
    pub last_nav_action: Option<NavigationAction>,
    pub current_url: Option<String>,
    pub last_navigation_time: i64,
    pub back_stack: BackStack,
}

impl Tab {
    pub fn new(
        tab_id: impl Into<String>,
        win_id: impl Into<String>,
        tab_open_cause: Option<Rc<Event>>,
        opened_new_tab_with: bool,
    ) -> Self {
        Self {
            tab_id: tab_id.into(),
            win_id: win_id.into(),
            tab_open_cause,
            opened_new_tab_with,
            tab_open_emitted: false,
            restored: false,
            nav_action: None,
            last_nav_action: None,
            current_url: None,
            last_navigation_time: 0,
            back_stack: BackStack::new(),
        }
    }

    pub fn has_navigated(&self) -> bool {
        self.nav_action.is_some() || self.last_nav_action.is_some()
    }

    pub fn complete_tab_open(
        &mut self,
        event: &Event,
        win: &mut Window,
        emitter: &mut Emitter,
    ) -> Result<()> {
        let index = event.tab_index().unwrap_or(0);
        win.insert_tab(self.tab_id.clone(), index, event.time);

        let cause_descr = match &self.tab_open_cause {
            None => "unknown".to_string(),
            Some(c) if c.name == "window_onload" => "default".to_string(),
            Some(c) => {
                let mut descr = c.name.clone();
                if self.opened_new_tab_with {
                    descr.push_str("+openNewTabWith");
                }
                descr
            }
        };
        let tab_count = win.tab_count() as i64;
        let ev = Event::derived(event, "tab_open").set("cause", cause_descr).set("tab_count", tab_count);
        emitter.push(ev);
        self.tab_open_emitted = true;
        Ok(())
    }

    pub fn set_restored(&mut self, diag: &Diagnostics) {
        if self.has_navigated() {
            diag.warn("TabRestore on a tab that has already navigated");
        }
        self.restored = true;
    }

    /// Synthesizes a `keyDown` cause-event ahead of cause attribution when
    /// the navigation event reports a `lastKeyDownTime` more recent than
    /// anything the engine has actually observed yet, and attaches it to
    /// whichever tab was selected at that moment.
    fn maybe_synthesize_keydown(nav_event: &Event, win: &mut Window, last_event_time: i64) {
        if let Some(kdt) = nav_event.i64("lastKeyDownTime") {
            if kdt > last_event_time {
                let owner = win.get_selected_tab(Some(kdt));
                let synthetic = Rc::new(Event::new("keyDown", kdt));
                win.push_navigation_cause(owner, synthetic);
            }
        }
    }

    /// The cause-attribution heuristic: scans recent navigation causes
    /// newest-first, preferring an exact URL match over a same-tab
    /// fallback, then falls back to the tab's own open-cause for a
    /// first-ever navigation.
    fn get_navigation_cause(
        &self,
        nav_event: &Event,
        win: &Window,
        last_global_event: Option<&Event>,
        diag: &Diagnostics,
    ) -> (Option<Rc<Event>>, bool) {
        let url = nav_event.str("href").unwrap_or("");
        let mut javascript_used = nav_event
            .str("cause")
            .map(|c| c.starts_with("javascript:") || c.starts_with("http"))
            .unwrap_or(false);
        if matches!(last_global_event, Some(e) if e.name == "js_location_change") {
            javascript_used = true;
        }

        let mut fallback: Option<Rc<Event>> = None;
        let mut cause: Option<Rc<Event>> = None;
        for (owner, evt) in win.navigation_causes.iter().rev() {
            if evt.time < self.last_navigation_time || seconds_between(nav_event, evt) > 5.0 {
                break;
            }
            if evt.cause_url() == Some(url) {
                cause = Some(evt.clone());
                break;
            } else if owner.as_deref() == Some(self.tab_id.as_str()) && fallback.is_none() {
                fallback = Some(evt.clone());
            }
        }
        let mut cause = cause.or(fallback);

        if !self.has_navigated() && (cause.is_none() || self.restored) {
            cause = self.tab_open_cause.clone();
        }

        if let Some(c) = &cause {
            if let Some(cause_url) = c.cause_url() {
                if cause_url.starts_with("javascript:") {
                    javascript_used = true;
                } else if !javascript_used && cause_url != url {
                    diag.warn(format!(
                        "Nav cause {} ({}) doesn't match target URL {}",
                        c.name, cause_url, url
                    ));
                }
            }
        }
        (cause, javascript_used)
    }

    fn new_navigation_action(
        &mut self,
        nav_event: &Event,
        win: &mut Window,
        last_global_event: Option<&Event>,
        last_event_time: i64,
        diag: &Diagnostics,
    ) -> NavigationAction {
        Self::maybe_synthesize_keydown(nav_event, win, last_event_time);
        let url = nav_event.str("href").unwrap_or("").to_string();
        let (cause, js_used) = self.get_navigation_cause(nav_event, win, last_global_event, diag);
        self.last_navigation_time = nav_event.time;
        let win_id = nav_event.win().unwrap_or(&self.win_id).to_string();
        NavigationAction::new(self.tab_id.clone(), win_id, Some(url), self.current_url.clone(), cause, js_used)
    }

    pub fn load_start(
        &mut self,
        event: &Event,
        win: &mut Window,
        last_event: Option<&Event>,
        diag: &Diagnostics,
    ) -> Result<()> {
        let href = event.str("href").unwrap_or("").to_string();
        let last_event_time = last_event.map(|e| e.time).unwrap_or(i64::MIN);

        if let Some(nav) = &mut self.nav_action {
            if let Some(prev) = last_event {
                if prev.name == "load_start" && prev.tab_id() == event.tab_id() {
                    if nav.url.as_deref() == Some(href.as_str()) {
                        diag.info("Ignoring duplicate load_start event");
                    } else {
                        let from = nav.url.clone().unwrap_or_default();
                        nav.redirect(&from, &href, diag);
                    }
                    return Ok(());
                }
            }
        } else if !self.has_navigated() && href == "about:blank" {
            return Ok(());
        }

        let mut new_action = self.new_navigation_action(event, win, last_event, last_event_time, diag);
        let cause_descr = new_action.get_cause_descr();

        if let Some(nav) = &self.nav_action {
            if nav.shares_cause(Some(&new_action)) {
                if nav.url.as_deref() == Some(href.as_str()) {
                    diag.warn("Ignoring duplicate load_start (same URL and cause)");
                } else {
                    return Err(diag.error(format!(
                        "Different load_starts ({:?} vs. {}) share cause {}",
                        nav.url, href, cause_descr
                    )));
                }
                return Ok(());
            }
        }

        if let Some(nav) = self.nav_action.take() {
            if nav.url.as_deref() == Some(href.as_str()) {
                if nav.cause_name() == new_action.cause_name() {
                    let secs = nav
                        .cause
                        .as_ref()
                        .zip(new_action.cause.as_ref())
                        .map(|(a, b)| seconds_between(a, b))
                        .unwrap_or(0.0);
                    diag.info(format!("Duplicate load_starts caused by {cause_descr} {secs}s apart"));
                } else {
                    diag.info("Duplicate load_start events, but with different causes");
                }
            }
            self.last_nav_action = Some(nav);
        }

        // No cause was found for this load_start: it may be a redirect the
        // previous, already-closed-out action set in motion rather than a
        // fresh user action.
        if new_action.cause.is_none() {
            if let Some(prev) = &self.last_nav_action {
                if let Some(lt) = prev.load_time {
                    if (event.time - lt).abs() <= 150 {
                        new_action.cause = Some(Rc::new(Event::new("meta-redirect?", event.time)));
                        new_action.cause_time = Some(event.time);
                    }
                }
                if new_action.cause.is_none() {
                    if let Some(lct) = prev.location_change_time {
                        if (event.time - lct).abs() <= 150 {
                            new_action.cause = Some(Rc::new(Event::new("js-redirect?", event.time)));
                            new_action.cause_time = Some(event.time);
                        }
                    }
                }
            }
        }

        self.nav_action = Some(new_action);
        self.nav_action.as_mut().unwrap().load_start(&href, event.time, diag);
        Ok(())
    }

    pub fn redirect(&mut self, event: &Event, diag: &Diagnostics) -> Result<()> {
        let from = event.str("from_url").unwrap_or("").to_string();
        let to = event.str("to_url").unwrap_or("").to_string();
        match &mut self.nav_action {
            Some(nav) if nav.url.is_some() => {
                nav.redirect(&from, &to, diag);
                Ok(())
            }
            _ => Err(diag.error("redirect event without an in-flight load_start")),
        }
    }

    pub fn location_change(
        &mut self,
        event: &Event,
        win: &mut Window,
        last_event: Option<&Event>,
        emitter: &mut Emitter,
        diag: &Diagnostics,
    ) -> Result<()> {
        let href = event.str("href").unwrap_or("").to_string();
        let last_event_time = last_event.map(|e| e.time).unwrap_or(i64::MIN);

        if self.nav_action.is_none() {
            if !self.has_navigated() && href == "about:blank" {
                return Ok(());
            }

            let mut nav = self.new_navigation_action(event, win, last_event, last_event_time, diag);

            if !self.has_navigated() {
                if nav.cause.is_none() {
                    nav.cause = self.tab_open_cause.clone();
                    nav.cause_time = nav.cause.as_ref().map(|c| c.time);
                }
            } else if nav.shares_cause(self.last_nav_action.as_ref()) {
                let same_url = nav.url == self.last_nav_action.as_ref().and_then(|l| l.url.clone());
                if same_url {
                    diag.warn("Ignoring LocationChange with duplicate url and cause");
                    return Ok(());
                }
                nav.cause = None;
                nav.cause_time = None;
            }
            self.nav_action = Some(nav);
        }

        let mut nav = self.nav_action.take().unwrap();
        self.back_stack.process(&mut nav, diag);

        let tab_has_prior_nav = self.last_nav_action.is_some();
        let completed = nav.location_change(event, self.current_url.as_deref(), tab_has_prior_nav, emitter, diag);

        if completed {
            self.current_url = nav.url.clone();
            self.last_nav_action = Some(nav);
        } else {
            self.nav_action = Some(nav);
        }
        Ok(())
    }

    /// Updates the in-flight navigation's load completion time. Returns
    /// `false` when there was nothing to update (the caller drops the
    /// passthrough `load` event in that case).
    pub fn record_load(&mut self, url: &str, time: i64, diag: &Diagnostics) -> bool {
        match &mut self.last_nav_action {
            Some(nav) => {
                nav.load(url, time, diag);
                true
            }
            None => false,
        }
    }
}
