use std::io::Write;

use serde_json::Value;

use crate::errors::Result;
use crate::event::Event;

/// Writes compiled events back out in the source log's own line format:
/// `<millis> <json object>`, folding `time` into the millisecond prefix
/// instead of duplicating it inside the object.
pub fn write_events<W: Write>(events: &[Event], mut out: W) -> Result<()> {
    for event in events {
        let mut value = event.to_json();
        if let Value::Object(map) = &mut value {
            map.remove("time");
        }
        writeln!(out, "{} {}", event.time, serde_json::to_string(&value)?)?;
    }
    Ok(())
}
