//! Bounded sliding window of the most recent quotes.

use std::collections::VecDeque;

use super::quote::Quote;

/// Holds at most `max_look_behind + 1` quotes: the current one plus history.
#[derive(Debug, Clone)]
pub struct Lookbehind {
    quotes: VecDeque<Quote>,
    max_look_behind: usize,
}

impl Lookbehind {
    pub fn new(max_look_behind: usize) -> Self {
        Lookbehind {
            quotes: VecDeque::with_capacity(max_look_behind.saturating_add(1).min(1024)),
            max_look_behind,
        }
    }

    pub fn push(&mut self, quote: Quote) {
        if self.quotes.len() > self.max_look_behind {
            self.quotes.pop_front();
        }
        self.quotes.push_back(quote);
    }

    pub fn clear(&mut self) {
        self.quotes.clear();
    }

    /// Oldest first; the last element is the newest quote.
    pub fn as_slice(&mut self) -> &[Quote] {
        self.quotes.make_contiguous()
    }

    pub fn latest(&self) -> Option<&Quote> {
        self.quotes.back()
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    pub fn max_look_behind(&self) -> usize {
        self.max_look_behind
    }
}
