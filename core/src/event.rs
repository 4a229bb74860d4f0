use serde_json::{Map, Value};

/// A single browsing-session record.
///
/// Both input and output records share this shape: a name, a millisecond
/// timestamp, and an open bag of additional fields. Keeping the field map
/// open (rather than a closed, per-event-type enum) mirrors the source log's
/// own schema-less JSON objects and avoids a combinatorial enum covering
/// every instrumentation event name in existence.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub name: String,
    pub time: i64,
    pub fields: Map<String, Value>,
}

impl Event {
    pub fn new(name: impl Into<String>, time: i64) -> Self {
        Self { name: name.into(), time, fields: Map::new() }
    }

    /// Parses a single JSON object into an `Event`. The object must carry an
    /// `event` string field; `time` is taken from the object itself when
    /// present and may be overridden by the caller (the reader does this
    /// when a line carries an explicit timestamp prefix).
    pub fn from_json(value: Value) -> Option<Self> {
        let mut fields = match value {
            Value::Object(map) => map,
            _ => return None,
        };
        let name = match fields.remove("event") {
            Some(Value::String(s)) => s,
            _ => return None,
        };
        let time = match fields.remove("time") {
            Some(v) => v.as_i64().unwrap_or(0),
            None => 0,
        };
        Some(Self { name, time, fields })
    }

    pub fn has_time_field(value: &Value) -> bool {
        matches!(value, Value::Object(m) if m.contains_key("time"))
    }

    /// Reconstructs the original JSON shape: `event`/`time` folded back into
    /// the field map.
    pub fn to_json(&self) -> Value {
        let mut map = self.fields.clone();
        map.insert("event".to_string(), Value::String(self.name.clone()));
        map.insert("time".to_string(), Value::from(self.time));
        Value::Object(map)
    }

    /// Builds a derived output event: copies every field from `orig`, keeps
    /// its time, and replaces the name.
    pub fn derived(orig: &Event, name: impl Into<String>) -> Self {
        Self { name: name.into(), time: orig.time, fields: orig.fields.clone() }
    }

    pub fn set(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    pub fn unset(mut self, key: &str) -> Self {
        self.fields.remove(key);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    pub fn i64(&self, key: &str) -> Option<i64> {
        self.fields.get(key).and_then(Value::as_i64)
    }

    pub fn bool_or(&self, key: &str, default: bool) -> bool {
        self.fields.get(key).and_then(Value::as_bool).unwrap_or(default)
    }

    pub fn win(&self) -> Option<&str> {
        self.str("win")
    }

    pub fn tab_id(&self) -> Option<&str> {
        self.str("tabId")
    }

    pub fn tab_index(&self) -> Option<i64> {
        self.i64("tabIndex")
    }

    /// `isTopLevel` defaults to true: most instrumentation events originate
    /// from the top frame and only iframe-sourced records set it to false.
    pub fn is_top_level(&self) -> bool {
        self.bool_or("isTopLevel", true)
    }

    /// The URL a navigation-cause event is "about", per the event's shape:
    /// a link click carries it in `href`, a form submission in `action`,
    /// and everything else in a plain `url` field.
    pub fn cause_url(&self) -> Option<&str> {
        match self.name.as_str() {
            "LINK_CLICK" => self.str("href"),
            "form_submit" => self.str("action"),
            _ => self.str("url"),
        }
    }
}

pub fn seconds_between(a: &Event, b: &Event) -> f64 {
    (a.time - b.time).unsigned_abs() as f64 / 1000.0
}
