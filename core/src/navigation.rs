use std::rc::Rc;

use crate::diagnostics::Diagnostics;
use crate::emitter::Emitter;
use crate::event::Event;

/// Tracks a single in-progress (or just-completed) navigation within a tab,
/// from the moment a cause is attributed through `load_start`, any number of
/// `redirect`s, and the terminal `location_change` that turns it into an
/// output `navigation` record.
#[derive(Debug, Clone)]
pub struct NavigationAction {
    pub tab_id: String,
    pub win_id: String,
    pub url: Option<String>,
    pub original_url: Option<String>,
    pub from_url: Option<String>,
    pub cause: Option<Rc<Event>>,
    pub cause_time: Option<i64>,
    pub javascript_used: bool,
    pub start_time: Option<i64>,
    pub load_started: bool,
    pub location_change_time: Option<i64>,
    pub load_time: Option<i64>,
    pub back_distance: Option<i64>,
    pub forward_distance: Option<i64>,
    pub match_index: Option<i64>,
}

impl NavigationAction {
    pub fn new(
        tab_id: impl Into<String>,
        win_id: impl Into<String>,
        url: Option<String>,
        from_url: Option<String>,
        cause: Option<Rc<Event>>,
        javascript_used: bool,
    ) -> Self {
        let cause_time = cause.as_ref().map(|c| c.time);
        Self {
            tab_id: tab_id.into(),
            win_id: win_id.into(),
            url,
            original_url: None,
            from_url,
            cause,
            cause_time,
            javascript_used,
            start_time: None,
            load_started: false,
            location_change_time: None,
            load_time: None,
            back_distance: None,
            forward_distance: None,
            match_index: None,
        }
    }

    pub fn cause_name(&self) -> &str {
        self.cause.as_deref().map(|c| c.name.as_str()).unwrap_or("unknown")
    }

    pub fn shares_cause(&self, other: Option<&NavigationAction>) -> bool {
        match (&self.cause, other.and_then(|o| o.cause.as_ref())) {
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    pub fn is_started(&self) -> bool {
        self.start_time.is_some()
    }

    pub fn is_loaded(&self) -> bool {
        self.load_time.is_some()
    }

    fn is_hash_change_only(old: &str, new: &str) -> bool {
        let strip = |s: &str| s.split('#').next().unwrap_or("").to_string();
        strip(old) == strip(new)
    }

    /// Warns when `url` doesn't match the action's current URL, unless this
    /// is a `load` event that only changed the fragment.
    fn check_url(&self, url: &str, event_name: &str, diag: &Diagnostics) {
        if let Some(cur) = &self.url {
            if cur != url && !(event_name == "load" && Self::is_hash_change_only(cur, url)) {
                diag.warn(format!("{event_name} ({url}) doesn't match nav action ({cur})"));
            }
        }
    }

    pub fn load_start(&mut self, url: &str, time: i64, diag: &Diagnostics) {
        if self.load_started {
            diag.warn("Multiple load_start events for the same navigation");
        }
        self.check_url(url, "load_start", diag);
        self.load_started = true;
        self.url = Some(url.to_string());
        self.start_time = Some(time);
    }

    pub fn redirect(&mut self, from: &str, to: &str, diag: &Diagnostics) {
        self.check_url(from, "redirect", diag);
        if self.original_url.is_none() {
            self.original_url = self.url.clone();
        }
        self.url = Some(to.to_string());
    }

    pub fn load(&mut self, url: &str, time: i64, diag: &Diagnostics) {
        self.check_url(url, "load", diag);
        self.load_time = Some(time);
    }

    pub fn get_cause_descr(&self) -> String {
        let mut descr = self.cause_name().to_string();
        if self.javascript_used {
            descr.push_str("+js");
        }
        descr
    }

    /// Applies a `LocationChange` event. Returns `false` when the event's
    /// URL doesn't reconcile with the action's current URL beyond a hash
    /// change, in which case the caller should keep the action in flight
    /// and wait for a better match. Returns `true` (and emits the
    /// `navigation` record) otherwise.
    pub fn location_change(
        &mut self,
        event: &Event,
        tab_current_url: Option<&str>,
        tab_has_prior_nav: bool,
        emitter: &mut Emitter,
        diag: &Diagnostics,
    ) -> bool {
        let href = event.str("href").unwrap_or("");
        if let Some(cur) = &self.url {
            if cur != href && !Self::is_hash_change_only(cur, href) {
                diag.warn(format!("Ignoring LocationChange to {href}, expected {cur}"));
                return false;
            }
        }
        self.url = Some(href.to_string());

        let old_url = tab_current_url.unwrap_or("");
        if !self.is_started() && !Self::is_hash_change_only(old_url, href) && tab_has_prior_nav {
            diag.warn("LocationChange without a preceding load_start");
        }

        self.location_change_time = Some(event.time);
        if self.start_time.is_none() {
            self.start_time = self.location_change_time;
        }

        let nav_event = self.create_event();
        emitter.push(nav_event);
        true
    }

    fn create_event(&self) -> Event {
        let time = self.start_time.unwrap_or_else(|| self.location_change_time.unwrap_or(0));
        let mut ev = Event::new("navigation", time)
            .set("win", self.win_id.clone())
            .set("tabId", self.tab_id.clone())
            .set("url", self.url.clone().unwrap_or_default())
            .set("location_changed", self.location_change_time.is_some())
            .set("cause", self.get_cause_descr());

        if let Some(from) = &self.from_url {
            ev = ev.set("from_url", from.clone());
        }
        if let Some(ct) = self.cause_time {
            let secs = (time - ct) as f64 / 1000.0;
            ev = ev.set("secs_since_cause", secs);
        }
        if let Some(orig) = &self.original_url {
            ev = ev.set("original_url", orig.clone());
        }
        if let Some(d) = self.back_distance {
            ev = ev.set("back_distance", d);
        }
        if let Some(d) = self.forward_distance {
            ev = ev.set("forward_distance", d);
        }
        if let Some(m) = self.match_index {
            ev = ev.set("match_index", m);
        }
        ev
    }
}
