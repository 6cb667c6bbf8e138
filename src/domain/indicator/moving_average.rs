//! Window-blended moving average.
//!
//! Seed with the first close; afterwards `(mean(prev) * n + close) / (n + 1)`
//! where `prev` are the `n` older closes in the window. This is a
//! window-size-dependent blend, not a fixed-decay EMA.

use super::{Indicator, Step};
use crate::domain::error::QuoteError;
use crate::domain::event::IndicatorValue;
use crate::domain::frequency::Frequency;
use crate::domain::quote::Quote;

#[derive(Debug, Clone)]
pub struct MovingAverage {
    for_symbol: String,
    max_look_behind: usize,
    key: String,
}

impl MovingAverage {
    pub fn new(for_symbol: impl Into<String>, max_look_behind: usize) -> Self {
        let for_symbol = for_symbol.into();
        let key = Self::key_for(&for_symbol, max_look_behind);
        MovingAverage {
            for_symbol,
            max_look_behind,
            key,
        }
    }

    /// `EMA<n>.<symbol>`
    pub fn key_for(symbol: &str, max_look_behind: usize) -> String {
        format!("EMA{max_look_behind}.{symbol}")
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    fn closes(&self, lookbehind: &[Quote]) -> Result<Vec<f64>, QuoteError> {
        lookbehind
            .iter()
            .map(|q| q.price_bar(&self.for_symbol).map(|bar| bar.close()))
            .collect()
    }
}

impl Indicator for MovingAverage {
    fn name(&self) -> String {
        self.key.clone()
    }

    fn max_look_behind(&self) -> usize {
        self.max_look_behind
    }

    fn process(&mut self, lookbehind: &[Quote]) -> Step {
        let Some(newest) = lookbehind.last() else {
            return Step::Fatal("empty lookbehind".into());
        };

        let bar = match newest.price_bar(&self.for_symbol) {
            Ok(bar) => bar,
            Err(QuoteError::Missing { .. }) => {
                return Step::Reset(format!(
                    "{}: no price bar for {} at {}",
                    self.key,
                    self.for_symbol,
                    newest.time(Frequency::Tick)
                ));
            }
            Err(e) => return Step::Fatal(format!("{}: {e}", self.key)),
        };

        let value = if lookbehind.len() == 1 {
            bar.close()
        } else {
            let prev = match self.closes(&lookbehind[..lookbehind.len() - 1]) {
                Ok(prev) => prev,
                Err(e) => return Step::Fatal(format!("{}: {e}", self.key)),
            };
            let n = prev.len() as f64;
            let prev_avg = prev.iter().sum::<f64>() / n;
            (prev_avg * n + bar.close()) / (n + 1.0)
        };

        match IndicatorValue::single(self.for_symbol.as_str(), self.key.as_str(), bar.time(), value) {
            Ok(ind) => Step::Emit(ind.into()),
            Err(e) => Step::Skip(format!("{}: {e}", self.key)),
        }
    }
}
