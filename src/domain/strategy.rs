//! Moving-average crossover strategy.

use super::error::TradeError;
use super::event::Event;
use super::indicator::Indicator;
use super::indicator::moving_average::MovingAverage;
use super::quote::Quote;
use super::simulation::Context;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cross {
    /// Fast average moved from below the slow one to above it.
    Above,
    /// Fast average moved from above the slow one to below it.
    Below,
}

/// Buy `allocation` of a symbol when its fast average crosses above the slow
/// one; close the position when it crosses back below.
#[derive(Debug, Clone, PartialEq)]
pub struct MovingAverageCrossover {
    pub fast: usize,
    pub slow: usize,
    pub allocation: f64,
}

impl MovingAverageCrossover {
    /// The fast and slow averages for every symbol.
    pub fn indicators<S: AsRef<str>>(&self, symbols: &[S]) -> Vec<Box<dyn Indicator>> {
        symbols
            .iter()
            .flat_map(|s| {
                [
                    Box::new(MovingAverage::new(s.as_ref(), self.fast)) as Box<dyn Indicator>,
                    Box::new(MovingAverage::new(s.as_ref(), self.slow)),
                ]
            })
            .collect()
    }

    /// Crossing of `symbol`'s averages between `prev` and `quote`, if both
    /// quotes carry them.
    pub fn signal(&self, prev: &Quote, quote: &Quote, symbol: &str) -> Option<Cross> {
        let fast_key = MovingAverage::key_for(symbol, self.fast);
        let slow_key = MovingAverage::key_for(symbol, self.slow);
        let value = |q: &Quote, key: &str| q.indicator(key).ok().map(|i| i.value());

        let (prev_fast, prev_slow) = (value(prev, &fast_key)?, value(prev, &slow_key)?);
        let (fast, slow) = (value(quote, &fast_key)?, value(quote, &slow_key)?);

        if prev_fast < prev_slow && fast > slow {
            Some(Cross::Above)
        } else if prev_fast > prev_slow && fast < slow {
            Some(Cross::Below)
        } else {
            None
        }
    }

    pub fn on_quote(&self, ctx: &mut Context<'_>) -> Result<(), TradeError> {
        let (Some(prev), Some(quote)) = (ctx.previous(), ctx.quote()) else {
            return Ok(());
        };

        let symbols = quote.events().values().filter_map(|e| match e {
            Event::PriceBar(bar) => Some(bar.symbol()),
            _ => None,
        });

        for symbol in symbols {
            match self.signal(prev, quote, symbol) {
                Some(Cross::Above) => {
                    tracing::debug!(symbol, allocation = self.allocation, "crossed above, buying");
                    ctx.portfolio
                        .ops(quote)?
                        .buy(symbol, self.allocation)?
                        .commit(ctx.portfolio)?;
                }
                Some(Cross::Below)
                    if ctx.portfolio.current_valuation().position(symbol).is_some() =>
                {
                    tracing::debug!(symbol, "crossed below, closing");
                    ctx.portfolio.ops(quote)?.close(symbol)?.commit(ctx.portfolio)?;
                }
                _ => {}
            }
        }
        Ok(())
    }
}
