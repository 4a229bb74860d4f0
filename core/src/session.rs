use crate::browser_state::BrowserState;
use crate::diagnostics::Diagnostics;
use crate::emitter::Emitter;
use crate::errors::Result;
use crate::event::Event;
use crate::vocab::is_user_action;

/// Where the whole compile currently sits in the browser's lifecycle.
/// Stands in for the trampolined `AppClosed`/`AppStartup`/`AppOpen`
/// functions of the original tool: an explicit enum plays better with
/// Rust's ownership model than passing an iterator through a chain of
/// higher-order function calls.
pub enum SessionState {
    Closed,
    Startup(StartupState),
    Open(BrowserState),
}

pub struct StartupState {
    browser: BrowserState,
    output_start: usize,
    saw_restore: bool,
}

impl SessionState {
    pub fn new() -> Self {
        SessionState::Closed
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, SessionState::Closed)
    }

    pub fn step(&mut self, event: Event, emitter: &mut Emitter, diag: &Diagnostics) -> Result<()> {
        match self {
            SessionState::Closed => self.step_closed(event, emitter),
            SessionState::Startup(_) => self.step_startup(event, emitter, diag),
            SessionState::Open(_) => self.step_open(event, emitter, diag),
        }
    }

    fn step_closed(&mut self, event: Event, emitter: &mut Emitter) -> Result<()> {
        if event.name == "LOG_OPEN" {
            let version = event.str("version").unwrap_or("unknown").to_string();
            emitter.push(Event::new("browser_start", event.time).set("version", version));
            *self = SessionState::Startup(StartupState {
                browser: BrowserState::new(),
                output_start: emitter.len(),
                saw_restore: false,
            });
        }
        // Anything observed before the browser actually starts is noise.
        Ok(())
    }

    fn step_startup(&mut self, event: Event, emitter: &mut Emitter, diag: &Diagnostics) -> Result<()> {
        let startup = match self {
            SessionState::Startup(s) => s,
            _ => unreachable!("step_startup invoked outside of Startup"),
        };

        if event.name == "LOG_OPEN" {
            diag.warn("LOG_OPEN seen again before startup finished; treating as a crash restart");
            let output_start = emitter.len();
            *self = SessionState::Startup(StartupState {
                browser: BrowserState::new(),
                output_start,
                saw_restore: false,
            });
            return Ok(());
        }

        if event.name == "quit-application" {
            emitter.push(Event::derived(&event, "browser_quit"));
            *self = SessionState::Closed;
            return Ok(());
        }

        if startup.browser.window_count() == 0 && event.name != "window_onload" {
            diag.warn("expected window_onload as the first event of a new session");
        }

        if event.name == "TabRestore" {
            startup.saw_restore = true;
        }

        let win_id = event.win().map(str::to_string);

        if event.name == "gotoHistoryIndex" {
            if let Some(win_id) = &win_id {
                if startup.browser.has_goto_buffer(win_id) {
                    diag.warn("second gotoHistoryIndex arrived before the first was applied");
                    startup.browser.process_event(event, emitter, diag)?;
                } else {
                    startup.browser.set_goto_buffer(win_id, event);
                }
            } else {
                startup.browser.process_event(event, emitter, diag)?;
            }
            return Ok(());
        }

        if let Some(win_id) = &win_id {
            if let Some(pending) = startup.browser.take_goto_buffer(win_id) {
                startup.browser.process_event(pending, emitter, diag)?;
            }
        }

        let is_transition_action = is_user_action(&event.name)
            && !matches!(event.name.as_str(), "TabMove" | "TabSelect" | "gotoHistoryIndex");

        startup.browser.process_event(event, emitter, diag)?;

        if is_transition_action {
            self.finish_startup(emitter, diag)?;
        }
        Ok(())
    }

    /// Closes out the startup phase: the first window of a session is never
    /// "caused" by anything actionable, a session that restored any tab
    /// relabels every startup-phase cause as `restore`, and every tab
    /// registered during startup must have completed its `tab_open`.
    fn finish_startup(&mut self, emitter: &mut Emitter, diag: &Diagnostics) -> Result<()> {
        let startup = match std::mem::replace(self, SessionState::Closed) {
            SessionState::Startup(s) => s,
            other => {
                *self = other;
                return Ok(());
            }
        };

        let range_start = startup.output_start;

        if let Some(first_open) = emitter.iter_mut().skip(range_start).find(|e| e.name == "window_open") {
            first_open.fields.insert("cause".to_string(), "default".into());
        }

        if startup.saw_restore {
            for ev in emitter.iter_mut().skip(range_start) {
                if ev.name != "window_open" && ev.fields.contains_key("cause") {
                    ev.fields.insert("cause".to_string(), "restore".into());
                }
            }
        }

        for tab_id in startup.browser.registered_tab_ids() {
            let completed = startup.browser.tab(tab_id).map(|t| t.tab_open_emitted).unwrap_or(false);
            if !completed {
                return Err(diag.error(format!("tab {tab_id} never completed tab_open during startup")));
            }
        }

        if startup.saw_restore {
            for tab_id in startup.browser.registered_tab_ids() {
                if let Some(tab) = startup.browser.tab(tab_id) {
                    if !tab.restored {
                        diag.warn(format!(
                            "session looks like a restore but tab {tab_id} was never itself restored"
                        ));
                    }
                }
            }
        }

        *self = SessionState::Open(startup.browser);
        Ok(())
    }

    fn step_open(&mut self, event: Event, emitter: &mut Emitter, diag: &Diagnostics) -> Result<()> {
        if event.name == "quit-application" {
            emitter.push(Event::derived(&event, "browser_quit"));
            *self = SessionState::Closed;
            return Ok(());
        }
        if event.name == "LOG_OPEN" {
            diag.warn("LOG_OPEN seen while a session was already open; treating as a crash restart");
            *self = SessionState::Closed;
            return self.step(event, emitter, diag);
        }

        let browser = match self {
            SessionState::Open(b) => b,
            _ => unreachable!("step_open invoked outside of Open"),
        };
        browser.process_event(event, emitter, diag)
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}
