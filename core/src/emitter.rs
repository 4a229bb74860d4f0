use crate::event::Event;

/// Accumulates the output stream. Events are appended in the order they're
/// finalized; a handful of later passes (the bookmark-visit rewrite and the
/// startup session-restore relabeling) need to reach back and mutate an
/// already-emitted record, so the buffer is addressable by index rather than
/// write-only.
#[derive(Debug, Default)]
pub struct Emitter {
    events: Vec<Event>,
}

impl Emitter {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn push(&mut self, event: Event) -> usize {
        self.events.push(event);
        self.events.len() - 1
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn get_mut(&mut self, index: usize) -> &mut Event {
        &mut self.events[index]
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Event> {
        self.events.iter()
    }

    pub fn iter_mut(&mut self) -> impl DoubleEndedIterator<Item = &mut Event> {
        self.events.iter_mut()
    }

    pub fn as_slice(&self) -> &[Event] {
        &self.events
    }

    pub fn into_vec(self) -> Vec<Event> {
        self.events
    }
}
