//! Event-name classification: which instrumentation events are user
//! gestures, which can serve as the attributed cause of a navigation, and
//! which are neither.

pub const USER_NAVIGATION_EVENTS: &[&str] = &[
    "NEW_WINDOW",
    "NEW_TAB",
    "URLBarCommand",
    "SearchBarSearch",
    "RightClickSearch",
    "LINK_CLICK",
    "RIGHT_CLICK",
    "GoHome",
    "BrowserHomeClick",
    "openOneBookmark",
    "history openURLIn",
    "DOCUMENT_CLICK",
    "window_mousedown",
    "document_mousedown",
];

pub const OTHER_NAVIGATION_EVENTS: &[&str] = &[
    "gotoHistoryIndex",
    "OnHistoryGoBack",
    "BrowserForward",
    "OnHistoryReload",
    "form_submit",
    "js_location_change",
];

pub const USER_NON_NAVIGATION_EVENTS: &[&str] =
    &["TabClose", "answer", "window_unload", "TabSelect", "TabMove"];

pub fn is_user_action(name: &str) -> bool {
    USER_NAVIGATION_EVENTS.contains(&name) || USER_NON_NAVIGATION_EVENTS.contains(&name)
}

pub fn is_navigation_cause(name: &str) -> bool {
    USER_NAVIGATION_EVENTS.contains(&name) || OTHER_NAVIGATION_EVENTS.contains(&name)
}
