//! Simulation driver: aggregate, derive indicators, replay quotes through a
//! strategy callback against one portfolio.

use std::collections::HashMap;

use chrono::NaiveDateTime;

use super::aggregator::Aggregator;
use super::error::{SignalsError, TradeError};
use super::frequency::Frequency;
use super::indicator::{Indicator, run_indicators};
use super::lookbehind::Lookbehind;
use super::portfolio::Portfolio;
use super::quote::Quote;
use super::symbol_events::SymbolEvents;

pub const DEFAULT_LOOKBEHIND: usize = 10;

/// What a strategy sees at each quote.
pub struct Context<'a> {
    pub portfolio: &'a mut Portfolio,
    /// Scratch state that survives across quotes.
    pub data: &'a mut HashMap<String, f64>,
    /// Oldest first; the last element is the current quote.
    pub lookbehind: &'a [Quote],
}

impl<'a> Context<'a> {
    pub fn quote(&self) -> Option<&'a Quote> {
        self.lookbehind.last()
    }

    /// The quote before the current one, if the window holds it.
    pub fn previous(&self) -> Option<&'a Quote> {
        let lookbehind = self.lookbehind;
        lookbehind.len().checked_sub(2).map(move |i| &lookbehind[i])
    }
}

pub struct Simulation {
    frequency: Frequency,
    events: Vec<SymbolEvents>,
    indicators: Vec<Box<dyn Indicator>>,
    portfolio: Option<(f64, f64)>,
    max_gap: usize,
    lookbehind: usize,
    from: Option<NaiveDateTime>,
    to: Option<NaiveDateTime>,
}

impl Simulation {
    pub fn new(frequency: Frequency, events: Vec<SymbolEvents>) -> Self {
        Simulation {
            frequency,
            events,
            indicators: Vec::new(),
            portfolio: None,
            max_gap: 0,
            lookbehind: DEFAULT_LOOKBEHIND,
            from: None,
            to: None,
        }
    }

    pub fn with_portfolio(mut self, cash: f64, fee: f64) -> Self {
        self.portfolio = Some((cash, fee));
        self
    }

    pub fn with_max_gap(mut self, max_gap: usize) -> Self {
        self.max_gap = max_gap;
        self
    }

    pub fn with_lookbehind(mut self, lookbehind: usize) -> Self {
        self.lookbehind = lookbehind;
        self
    }

    /// Inclusive lower bound on bucket time.
    pub fn with_from(mut self, from: NaiveDateTime) -> Self {
        self.from = Some(from);
        self
    }

    /// Inclusive upper bound on bucket time.
    pub fn with_to(mut self, to: NaiveDateTime) -> Self {
        self.to = Some(to);
        self
    }

    /// Indicator outputs are computed over the raw events and added to the
    /// event set before the replay.
    pub fn with_indicators(mut self, indicators: Vec<Box<dyn Indicator>>) -> Self {
        self.indicators.extend(indicators);
        self
    }

    /// Aggregate every event (raw plus derived) into the replay sequence,
    /// restricted to `[from, to]`.
    pub fn quotes(&mut self) -> Result<Vec<Quote>, SignalsError> {
        if !self.indicators.is_empty() {
            let base = Aggregator::new(self.max_gap, self.frequency)
                .add_all(self.events.iter().cloned())
                .convert_to_quotes()?;
            let derived = run_indicators(&base, std::mem::take(&mut self.indicators))?;
            self.events.extend(derived);
        }

        let quotes = Aggregator::new(self.max_gap, self.frequency)
            .add_all(self.events.iter().cloned())
            .convert_to_quotes()?;

        Ok(quotes
            .into_iter()
            .filter(|q| self.in_range(q.time(self.frequency)))
            .collect())
    }

    /// Replay every quote through `strategy` and return the final portfolio.
    /// A strategy error is logged and the replay continues.
    pub fn run<F>(mut self, mut strategy: F) -> Result<Portfolio, SignalsError>
    where
        F: FnMut(&mut Context<'_>) -> Result<(), TradeError>,
    {
        let (cash, fee) = self.portfolio.ok_or_else(|| SignalsError::ConfigMissing {
            section: "portfolio".into(),
            key: "cash".into(),
        })?;
        let mut portfolio = Portfolio::new(cash, fee)?;

        let quotes = self.quotes()?;
        tracing::info!(
            quotes = quotes.len(),
            frequency = %self.frequency,
            lookbehind = self.lookbehind,
            "simulation started"
        );

        let mut data = HashMap::new();
        let mut window = Lookbehind::new(self.lookbehind);
        let mut rejected = 0usize;

        for quote in quotes {
            let time = quote.time(self.frequency);
            window.push(quote);

            let mut ctx = Context {
                portfolio: &mut portfolio,
                data: &mut data,
                lookbehind: window.as_slice(),
            };
            if let Err(e) = strategy(&mut ctx) {
                tracing::warn!(%time, error = %e, "strategy step rejected");
                rejected += 1;
            }
        }

        tracing::info!(
            commits = portfolio.history().len() - 1,
            rejected,
            total_value = portfolio.current_valuation().total_value(),
            "simulation finished"
        );
        Ok(portfolio)
    }

    fn in_range(&self, time: NaiveDateTime) -> bool {
        self.from.is_none_or(|from| time >= from) && self.to.is_none_or(|to| time <= to)
    }
}
