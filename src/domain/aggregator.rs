//! Merges per-symbol event sequences into one time-ordered quote sequence.
//!
//! Events are bucketed with [`discrete_time`], buckets are sorted ascending,
//! and the result is rejected if any registered symbol is absent for more
//! than `max_gap` consecutive buckets.

use chrono::NaiveDateTime;
use std::collections::{BTreeMap, HashMap};

use super::error::DataQualityError;
use super::event::Event;
use super::frequency::{discrete_time, Frequency};
use super::quote::Quote;
use super::symbol_events::SymbolEvents;

#[derive(Debug, Clone)]
pub struct Aggregator {
    events: BTreeMap<String, SymbolEvents>,
    max_gap: usize,
    frequency: Frequency,
}

impl Aggregator {
    pub fn new(max_gap: usize, frequency: Frequency) -> Self {
        Aggregator {
            events: BTreeMap::new(),
            max_gap,
            frequency,
        }
    }

    /// Register a symbol's events, replacing any earlier sequence for it.
    pub fn add_events(mut self, events: SymbolEvents) -> Self {
        self.insert(events);
        self
    }

    pub fn add_all(mut self, events: impl IntoIterator<Item = SymbolEvents>) -> Self {
        for e in events {
            self.insert(e);
        }
        self
    }

    pub fn insert(&mut self, events: SymbolEvents) {
        self.events.insert(events.symbol().to_string(), events);
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.events.keys().map(String::as_str)
    }

    pub fn frequency(&self) -> Frequency {
        self.frequency
    }

    pub fn max_gap(&self) -> usize {
        self.max_gap
    }

    pub fn convert_to_quotes(&self) -> Result<Vec<Quote>, DataQualityError> {
        let mut buckets: BTreeMap<NaiveDateTime, Vec<&Event>> = BTreeMap::new();
        for event in self.events.values().flat_map(SymbolEvents::events) {
            buckets
                .entry(discrete_time(event.time(), self.frequency))
                .or_default()
                .push(event);
        }

        let mut quotes = Vec::with_capacity(buckets.len());
        for (time, events) in buckets {
            let mut by_symbol = BTreeMap::new();
            for event in events {
                let symbol = event.symbol();
                if by_symbol.contains_key(symbol) {
                    return Err(DataQualityError::DuplicateSymbol {
                        symbol: symbol.to_string(),
                        time,
                    });
                }
                by_symbol.insert(symbol.to_string(), event.clone());
            }
            let quote = Quote::new(by_symbol)
                .map_err(|source| DataQualityError::EmptyBucket { time, source })?;
            quotes.push(quote);
        }

        self.validate(&quotes)?;

        tracing::debug!(
            symbols = self.events.len(),
            quotes = quotes.len(),
            frequency = %self.frequency,
            "aggregated quotes"
        );
        Ok(quotes)
    }

    fn validate(&self, quotes: &[Quote]) -> Result<(), DataQualityError> {
        let mut consecutive_missing: HashMap<&str, usize> = HashMap::new();

        for quote in quotes {
            for symbol in self.events.keys() {
                let missing = consecutive_missing.entry(symbol.as_str()).or_insert(0);
                if quote.contains(symbol) {
                    *missing = 0;
                } else {
                    *missing += 1;
                    if *missing > self.max_gap {
                        return Err(DataQualityError::GapExceeded {
                            symbol: symbol.clone(),
                            missing: *missing,
                            max_gap: self.max_gap,
                        });
                    }
                }
            }
        }
        Ok(())
    }
}
