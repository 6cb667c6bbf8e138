//! Non-empty, time-ordered event sequence for one symbol.

use super::error::ValidationError;
use super::event::Event;

#[derive(Debug, Clone, PartialEq)]
pub struct SymbolEvents {
    events: Vec<Event>,
}

impl SymbolEvents {
    /// The nominal symbol is taken from the first event. Later events are not
    /// checked against it: indicator outputs legitimately mix keys.
    pub fn new(events: Vec<Event>) -> Result<Self, ValidationError> {
        if events.is_empty() {
            return Err(ValidationError::EmptySequence);
        }
        Ok(SymbolEvents { events })
    }

    pub fn symbol(&self) -> &str {
        self.events[0].symbol()
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn last(&self) -> &Event {
        &self.events[self.events.len() - 1]
    }

    pub fn into_events(self) -> Vec<Event> {
        self.events
    }
}
