//! Portfolio ledger and the trade-proposal builder.
//!
//! The ledger holds one current [`Valuation`] plus an append-only history.
//! Trades are drafted on a [`Proposal`], an immutable value: every trade
//! returns a new proposal, and nothing reaches the ledger until
//! [`Proposal::commit`] replaces the current valuation and appends it to the
//! history in one step.

use super::error::{TradeError, ValidationError};
use super::position::{Position, Valuation};
use super::quote::Quote;

#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    current: Valuation,
    history: Vec<Valuation>,
    fee: f64,
}

impl Portfolio {
    /// Start with `cash`, no positions, and a flat `fee` per operation.
    pub fn new(cash: f64, fee: f64) -> Result<Self, ValidationError> {
        if fee < 0.0 {
            return Err(ValidationError::Negative {
                field: "fee",
                value: fee,
            });
        }
        let current = Valuation::new(cash, Vec::new())?;
        Ok(Portfolio {
            history: vec![current.clone()],
            current,
            fee,
        })
    }

    /// Draft trades against `quote`. Held positions are marked to its closes.
    pub fn ops<'q>(&self, quote: &'q Quote) -> Result<Proposal<'q>, TradeError> {
        let positions = self
            .current
            .positions()
            .iter()
            .map(|p| {
                let close = quote.price_bar(p.symbol())?.close();
                Ok(p.repriced(close)?)
            })
            .collect::<Result<Vec<_>, TradeError>>()?;

        Ok(Proposal {
            cash: self.current.cash(),
            positions,
            fee: self.fee,
            quote,
        })
    }

    pub fn current_valuation(&self) -> &Valuation {
        &self.current
    }

    /// Every committed valuation, starting with the initial cash.
    pub fn history(&self) -> &[Valuation] {
        &self.history
    }

    pub fn fee(&self) -> f64 {
        self.fee
    }

    fn apply(&mut self, valuation: Valuation) {
        self.history.push(valuation.clone());
        self.current = valuation;
    }
}

/// Hypothetical post-trade state bound to one quote.
#[derive(Debug, Clone, PartialEq)]
pub struct Proposal<'q> {
    cash: f64,
    positions: Vec<Position>,
    fee: f64,
    quote: &'q Quote,
}

impl<'q> Proposal<'q> {
    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    pub fn position(&self, symbol: &str) -> Option<&Position> {
        self.positions.iter().find(|p| p.symbol() == symbol)
    }

    pub fn quote(&self) -> &'q Quote {
        self.quote
    }

    pub fn total_value(&self) -> f64 {
        self.cash + self.positions.iter().map(Position::market_value).sum::<f64>()
    }

    pub fn can_buy(&self, _symbol: &str, amount: f64) -> bool {
        valid_amount(amount) && amount + self.fee <= self.cash
    }

    /// False for a symbol that is not held.
    pub fn can_sell(&self, symbol: &str, amount: f64) -> bool {
        match self.position(symbol) {
            Some(pos) => {
                valid_amount(amount)
                    && self.fee <= self.cash + amount
                    && amount <= pos.market_value()
            }
            None => false,
        }
    }

    /// Spend `amount` (plus the fee) on `symbol` at the quote's close.
    pub fn buy(&self, symbol: &str, amount: f64) -> Result<Self, TradeError> {
        check_amount(amount)?;
        if !self.can_buy(symbol, amount) {
            return Err(TradeError::InsufficientCash {
                required: amount + self.fee,
                available: self.cash,
            });
        }

        let price = self.close_of(symbol)?;
        let held = self.position(symbol).map_or(0.0, Position::units);
        let position = Position::new(symbol, held + amount / price, price)?;

        Ok(self.with(self.cash - (amount + self.fee), symbol, Some(position)))
    }

    /// Sell `amount` worth of an existing position at the quote's close.
    pub fn sell(&self, symbol: &str, amount: f64) -> Result<Self, TradeError> {
        check_amount(amount)?;
        let held = self.position(symbol).ok_or_else(|| TradeError::NoPosition {
            symbol: symbol.to_string(),
        })?;
        if self.fee > self.cash + amount {
            return Err(TradeError::InsufficientCash {
                required: self.fee,
                available: self.cash + amount,
            });
        }
        if amount > held.market_value() {
            return Err(TradeError::ExceedsPosition {
                symbol: symbol.to_string(),
                amount,
                value: held.market_value(),
            });
        }

        let price = self.close_of(symbol)?;
        let units = (held.units() - amount / price).max(0.0);
        let position = Position::new(symbol, units, price)?;

        Ok(self.with((self.cash + amount) - self.fee, symbol, Some(position)))
    }

    /// Liquidate every unit of `symbol`; the proceeds must cover the fee.
    pub fn close(&self, symbol: &str) -> Result<Self, TradeError> {
        let held = self.position(symbol).ok_or_else(|| TradeError::NoPosition {
            symbol: symbol.to_string(),
        })?;
        let price = self.close_of(symbol)?;
        let proceeds = self.cash + held.units() * price;
        if proceeds < self.fee {
            return Err(TradeError::InsufficientCash {
                required: self.fee,
                available: proceeds,
            });
        }

        Ok(self.with(proceeds - self.fee, symbol, None))
    }

    /// Replace the portfolio's current valuation with this proposal and
    /// append it to the history.
    pub fn commit<'p>(self, portfolio: &'p mut Portfolio) -> Result<&'p Valuation, TradeError> {
        let valuation = Valuation::new(self.cash, self.positions)?;
        tracing::debug!(
            cash = valuation.cash(),
            positions = valuation.positions().len(),
            total = valuation.total_value(),
            "committed valuation"
        );
        portfolio.apply(valuation);
        Ok(portfolio.current_valuation())
    }

    /// Alias of [`commit`](Self::commit).
    pub fn evaluate<'p>(self, portfolio: &'p mut Portfolio) -> Result<&'p Valuation, TradeError> {
        self.commit(portfolio)
    }

    fn close_of(&self, symbol: &str) -> Result<f64, TradeError> {
        let close = self.quote.price_bar(symbol)?.close();
        if !(close > 0.0 && close.is_finite()) {
            return Err(TradeError::InvalidPrice {
                symbol: symbol.to_string(),
                price: close,
            });
        }
        Ok(close)
    }

    /// Copy with new cash and `symbol`'s position replaced (moved to the end) or dropped.
    fn with(&self, cash: f64, symbol: &str, position: Option<Position>) -> Self {
        let mut positions: Vec<Position> = self
            .positions
            .iter()
            .filter(|p| p.symbol() != symbol)
            .cloned()
            .collect();
        positions.extend(position);
        Proposal {
            cash,
            positions,
            fee: self.fee,
            quote: self.quote,
        }
    }
}

fn valid_amount(amount: f64) -> bool {
    amount.is_finite() && amount > 0.0
}

fn check_amount(amount: f64) -> Result<(), TradeError> {
    if !valid_amount(amount) {
        return Err(TradeError::InvalidAmount { amount });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::{EventKind, QuoteError};
    use crate::domain::event::{Event, PriceBar};
    use approx::assert_relative_eq;
    use chrono::{NaiveDate, NaiveDateTime};

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn quote(prices: &[(&str, f64)]) -> Quote {
        Quote::from_events(prices.iter().map(|&(symbol, p)| -> Event {
            PriceBar::new(symbol, now(), p, p, p, p, p).unwrap().into()
        }))
        .unwrap()
    }

    #[test]
    fn new_portfolio_seeds_history() {
        let portfolio = Portfolio::new(1000.0, 2.5).unwrap();
        assert_eq!(portfolio.history().len(), 1);
        assert_relative_eq!(portfolio.current_valuation().cash(), 1000.0);
        assert!(portfolio.current_valuation().positions().is_empty());
    }

    #[test]
    fn new_portfolio_validates() {
        assert!(Portfolio::new(-1.0, 2.5).is_err());
        assert!(Portfolio::new(1.0, -2.5).is_err());
    }

    #[test]
    fn buy_two_symbols() {
        let q = quote(&[("AAPL", 1.0), ("TSLA", 1.0)]);
        let mut portfolio = Portfolio::new(1000.0, 2.5).unwrap();

        portfolio
            .ops(&q)
            .unwrap()
            .buy("AAPL", 10.0)
            .unwrap()
            .buy("TSLA", 10.0)
            .unwrap()
            .commit(&mut portfolio)
            .unwrap();

        let current = portfolio.current_valuation();
        assert_relative_eq!(current.cash(), 975.0);
        assert_relative_eq!(current.position("AAPL").unwrap().units(), 10.0);
        assert_relative_eq!(current.position("TSLA").unwrap().units(), 10.0);
        assert_eq!(portfolio.history().len(), 2);
    }

    #[test]
    fn too_much_buy_leaves_ledger_untouched() {
        let q = quote(&[("AAPL", 1.0), ("TSLA", 1.0)]);
        let portfolio = Portfolio::new(1000.0, 2.5).unwrap();

        let err = portfolio
            .ops(&q)
            .unwrap()
            .buy("AAPL", 997.5)
            .unwrap()
            .buy("TSLA", 10.0)
            .unwrap_err();

        assert!(matches!(err, TradeError::InsufficientCash { .. }));
        assert_eq!(portfolio.history().len(), 1);
        assert_relative_eq!(portfolio.current_valuation().cash(), 1000.0);
    }

    #[test]
    fn buy_then_sell() {
        let q = quote(&[("AAPL", 1.0)]);
        let mut portfolio = Portfolio::new(1000.0, 2.5).unwrap();

        portfolio.ops(&q).unwrap().buy("AAPL", 997.5).unwrap().commit(&mut portfolio).unwrap();
        portfolio.ops(&q).unwrap().sell("AAPL", 100.0).unwrap().commit(&mut portfolio).unwrap();

        let current = portfolio.current_valuation();
        assert_relative_eq!(current.cash(), 97.5);
        assert_relative_eq!(current.position("AAPL").unwrap().units(), 897.5);
    }

    #[test]
    fn round_trip_costs_two_fees() {
        let q = quote(&[("AAPL", 4.0)]);
        let mut portfolio = Portfolio::new(1000.0, 2.5).unwrap();

        portfolio
            .ops(&q)
            .unwrap()
            .buy("AAPL", 100.0)
            .unwrap()
            .sell("AAPL", 100.0)
            .unwrap()
            .commit(&mut portfolio)
            .unwrap();

        assert_relative_eq!(portfolio.current_valuation().cash(), 995.0);
    }

    #[test]
    fn buy_then_close() {
        let q = quote(&[("AAPL", 1.0)]);
        let mut portfolio = Portfolio::new(1000.0, 2.5).unwrap();

        portfolio.ops(&q).unwrap().buy("AAPL", 997.5).unwrap().commit(&mut portfolio).unwrap();
        portfolio.ops(&q).unwrap().close("AAPL").unwrap().commit(&mut portfolio).unwrap();

        let current = portfolio.current_valuation();
        assert_relative_eq!(current.cash(), 995.0);
        assert!(current.positions().is_empty());
    }

    #[test]
    fn close_with_profit_marks_to_new_quote() {
        let q1 = quote(&[("AAPL", 1.0), ("TSLA", 1.0)]);
        let q2 = quote(&[("AAPL", 2.0), ("TSLA", 2.0)]);
        let mut portfolio = Portfolio::new(1010.0, 2.5).unwrap();

        portfolio
            .ops(&q1)
            .unwrap()
            .buy("AAPL", 500.0)
            .unwrap()
            .buy("TSLA", 500.0)
            .unwrap()
            .commit(&mut portfolio)
            .unwrap();

        let proposal = portfolio.ops(&q2).unwrap();
        assert_relative_eq!(proposal.position("AAPL").unwrap().price(), 2.0);
        assert_relative_eq!(proposal.total_value(), 2005.0);

        proposal
            .close("AAPL")
            .unwrap()
            .close("TSLA")
            .unwrap()
            .commit(&mut portfolio)
            .unwrap();

        assert_relative_eq!(portfolio.current_valuation().cash(), 2000.0);
    }

    #[test]
    fn sell_unheld_symbol_fails() {
        let q = quote(&[("AAPL", 1.0), ("TSLA", 1.0)]);
        let portfolio = Portfolio::new(1010.0, 2.5).unwrap();
        let proposal = portfolio.ops(&q).unwrap().buy("AAPL", 500.0).unwrap();

        assert_eq!(
            proposal.sell("XXX", 600.0).unwrap_err(),
            TradeError::NoPosition {
                symbol: "XXX".into()
            }
        );
        assert!(!proposal.can_sell("XXX", 1.0));
        assert!(proposal.close("XXX").is_err());
    }

    #[test]
    fn buy_without_quote_fails() {
        let q = quote(&[("AAPL", 1.0), ("TSLA", 1.0)]);
        let portfolio = Portfolio::new(1010.0, 2.5).unwrap();

        let err = portfolio
            .ops(&q)
            .unwrap()
            .buy("AAPL", 500.0)
            .unwrap()
            .buy("XXX", 500.0)
            .unwrap_err();

        assert_eq!(
            err,
            TradeError::Quote(QuoteError::Missing {
                kind: EventKind::PriceBar,
                key: "XXX".into()
            })
        );
    }

    #[test]
    fn sell_more_than_held_fails() {
        let q = quote(&[("AAPL", 2.0)]);
        let portfolio = Portfolio::new(1000.0, 1.0).unwrap();
        let proposal = portfolio.ops(&q).unwrap().buy("AAPL", 100.0).unwrap();

        assert!(proposal.can_sell("AAPL", 100.0));
        assert!(!proposal.can_sell("AAPL", 100.5));
        assert!(matches!(
            proposal.sell("AAPL", 100.5).unwrap_err(),
            TradeError::ExceedsPosition { .. }
        ));
    }

    #[test]
    fn close_fails_when_proceeds_miss_fee() {
        let q1 = quote(&[("AAPL", 1.0)]);
        let q2 = quote(&[("AAPL", 0.001)]);
        let mut portfolio = Portfolio::new(11.0, 1.0).unwrap();
        portfolio.ops(&q1).unwrap().buy("AAPL", 10.0).unwrap().commit(&mut portfolio).unwrap();

        let err = portfolio.ops(&q2).unwrap().close("AAPL").unwrap_err();
        assert!(matches!(err, TradeError::InsufficientCash { .. }));
    }

    #[test]
    fn ops_requires_quote_for_held_positions() {
        let q1 = quote(&[("AAPL", 1.0)]);
        let q2 = quote(&[("TSLA", 1.0)]);
        let mut portfolio = Portfolio::new(100.0, 0.0).unwrap();
        portfolio.ops(&q1).unwrap().buy("AAPL", 10.0).unwrap().commit(&mut portfolio).unwrap();

        assert!(portfolio.ops(&q2).is_err());
    }

    #[test]
    fn discarded_chain_has_no_effect() {
        let q = quote(&[("AAPL", 1.0)]);
        let portfolio = Portfolio::new(100.0, 1.0).unwrap();
        let before = portfolio.clone();

        let draft = portfolio.ops(&q).unwrap();
        let bought = draft.buy("AAPL", 50.0).unwrap();
        drop(bought.close("AAPL").unwrap());

        assert_eq!(portfolio, before);
        assert_relative_eq!(draft.cash(), 100.0);
        assert_relative_eq!(bought.cash(), 49.0);
    }

    #[test]
    fn invalid_amounts_rejected() {
        let q = quote(&[("AAPL", 1.0)]);
        let portfolio = Portfolio::new(100.0, 1.0).unwrap();
        let draft = portfolio.ops(&q).unwrap();

        assert!(matches!(draft.buy("AAPL", 0.0), Err(TradeError::InvalidAmount { .. })));
        assert!(matches!(draft.buy("AAPL", -5.0), Err(TradeError::InvalidAmount { .. })));
        assert!(!draft.can_buy("AAPL", f64::NAN));
    }

    #[test]
    fn zero_price_rejected() {
        let q = quote(&[("AAPL", 0.0)]);
        let portfolio = Portfolio::new(100.0, 1.0).unwrap();
        assert!(matches!(
            portfolio.ops(&q).unwrap().buy("AAPL", 5.0),
            Err(TradeError::InvalidPrice { .. })
        ));
    }

    #[test]
    fn evaluate_is_commit() {
        let q = quote(&[("AAPL", 1.0)]);
        let mut portfolio = Portfolio::new(100.0, 1.0).unwrap();
        let valuation = portfolio
            .ops(&q)
            .unwrap()
            .buy("AAPL", 10.0)
            .unwrap()
            .evaluate(&mut portfolio)
            .unwrap()
            .clone();
        assert_eq!(portfolio.history().last(), Some(&valuation));
    }
}
