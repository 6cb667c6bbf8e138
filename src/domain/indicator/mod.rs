//! Bounded-lookback indicator framework.
//!
//! - `Step`: per-quote outcome returned by an indicator
//! - `Indicator`: the transform over a lookbehind window
//! - `IndicatorEngine`: drives an indicator across a quote sequence, keeping
//!   the window and the log of recoverable failures

pub mod moving_average;

use super::error::IndicatorError;
use super::event::Event;
use super::lookbehind::Lookbehind;
use super::quote::Quote;
use super::symbol_events::SymbolEvents;

/// Outcome of one indicator step.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Append the event to the output.
    Emit(Event),
    /// Emit nothing, keep the window.
    Skip(String),
    /// Emit nothing and clear the window.
    Reset(String),
    /// Abort the run.
    Fatal(String),
}

pub trait Indicator {
    /// Output key of the produced events, used in logs.
    fn name(&self) -> String;

    /// Number of past quotes kept besides the current one.
    fn max_look_behind(&self) -> usize;

    /// `lookbehind` is oldest first and never empty; the last element is the
    /// quote being processed.
    fn process(&mut self, lookbehind: &[Quote]) -> Step;
}

impl<I: Indicator + ?Sized> Indicator for Box<I> {
    fn name(&self) -> String {
        (**self).name()
    }

    fn max_look_behind(&self) -> usize {
        (**self).max_look_behind()
    }

    fn process(&mut self, lookbehind: &[Quote]) -> Step {
        (**self).process(lookbehind)
    }
}

pub struct IndicatorEngine<I> {
    indicator: I,
    errors: Vec<String>,
}

impl<I: Indicator> IndicatorEngine<I> {
    pub fn new(indicator: I) -> Self {
        IndicatorEngine {
            indicator,
            errors: Vec::new(),
        }
    }

    /// Produce at most one event per quote. Skip and Reset reasons are kept in
    /// [`errors`](Self::errors); Fatal aborts with every reason seen so far.
    pub fn run(&mut self, quotes: &[Quote]) -> Result<SymbolEvents, IndicatorError> {
        self.errors.clear();
        let mut window = Lookbehind::new(self.indicator.max_look_behind());
        let mut events = Vec::with_capacity(quotes.len());
        let (mut skipped, mut resets) = (0usize, 0usize);

        for quote in quotes {
            window.push(quote.clone());

            match self.indicator.process(window.as_slice()) {
                Step::Emit(event) => events.push(event),
                Step::Skip(reason) => {
                    tracing::warn!(indicator = %self.indicator.name(), %reason, "step skipped");
                    self.errors.push(reason);
                    skipped += 1;
                }
                Step::Reset(reason) => {
                    tracing::warn!(indicator = %self.indicator.name(), %reason, "window reset");
                    self.errors.push(reason);
                    window.clear();
                    resets += 1;
                }
                Step::Fatal(reason) => {
                    return Err(IndicatorError::Failed {
                        reason,
                        errors: self.errors.clone(),
                    });
                }
            }
        }

        tracing::debug!(
            indicator = %self.indicator.name(),
            emitted = events.len(),
            skipped,
            resets,
            "indicator run finished"
        );

        SymbolEvents::new(events).map_err(|_| IndicatorError::NoOutput {
            errors: self.errors.clone(),
        })
    }

    /// Recoverable failures from the last run, in order.
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn indicator(&self) -> &I {
        &self.indicator
    }

    pub fn into_inner(self) -> I {
        self.indicator
    }
}

/// Run several indicators over the same quotes, stopping at the first fatal one.
pub fn run_indicators(
    quotes: &[Quote],
    indicators: Vec<Box<dyn Indicator>>,
) -> Result<Vec<SymbolEvents>, IndicatorError> {
    indicators
        .into_iter()
        .map(|indicator| IndicatorEngine::new(indicator).run(quotes))
        .collect()
}
