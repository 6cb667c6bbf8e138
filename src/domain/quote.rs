//! Cross-symbol snapshot for one bucket.

use chrono::NaiveDateTime;
use std::collections::BTreeMap;

use super::error::{EventKind, QuoteError};
use super::event::{CustomTagged, Event, IndicatorValue, PriceBar};
use super::frequency::{discrete_time, Frequency};

#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    events: BTreeMap<String, Event>,
}

impl Quote {
    pub fn new(events: BTreeMap<String, Event>) -> Result<Self, QuoteError> {
        if events.is_empty() {
            return Err(QuoteError::Empty);
        }
        Ok(Quote { events })
    }

    /// Keys each event by [`Event::symbol`]; a later duplicate replaces an earlier one.
    pub fn from_events(events: impl IntoIterator<Item = Event>) -> Result<Self, QuoteError> {
        let map = events
            .into_iter()
            .map(|e| (e.symbol().to_string(), e))
            .collect();
        Self::new(map)
    }

    /// Bucket timestamp. Every event in a quote shares one bucket, so any will do.
    pub fn time(&self, frequency: Frequency) -> NaiveDateTime {
        let any = self
            .events
            .values()
            .next()
            .map(Event::time)
            .unwrap_or(NaiveDateTime::MIN);
        discrete_time(any, frequency)
    }

    pub fn get(&self, key: &str) -> Option<&Event> {
        self.events.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.events.contains_key(key)
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.events.keys().map(String::as_str)
    }

    pub fn events(&self) -> &BTreeMap<String, Event> {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn price_bar(&self, key: &str) -> Result<&PriceBar, QuoteError> {
        match self.lookup(key, EventKind::PriceBar)? {
            Event::PriceBar(bar) => Ok(bar),
            other => Err(wrong_kind(key, EventKind::PriceBar, other)),
        }
    }

    pub fn indicator(&self, key: &str) -> Result<&IndicatorValue, QuoteError> {
        match self.lookup(key, EventKind::Indicator)? {
            Event::Indicator(ind) => Ok(ind),
            other => Err(wrong_kind(key, EventKind::Indicator, other)),
        }
    }

    pub fn custom(&self, key: &str) -> Result<&CustomTagged, QuoteError> {
        match self.lookup(key, EventKind::Custom)? {
            Event::Custom(custom) => Ok(custom),
            other => Err(wrong_kind(key, EventKind::Custom, other)),
        }
    }

    fn lookup(&self, key: &str, kind: EventKind) -> Result<&Event, QuoteError> {
        self.events.get(key).ok_or_else(|| QuoteError::Missing {
            kind,
            key: key.to_string(),
        })
    }
}

fn wrong_kind(key: &str, expected: EventKind, found: &Event) -> QuoteError {
    QuoteError::WrongKind {
        key: key.to_string(),
        expected,
        found: found.kind(),
    }
}
