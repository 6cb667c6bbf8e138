//! Held units of one symbol and point-in-time ledger snapshots.

use super::error::ValidationError;

#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    symbol: String,
    units: f64,
    price: f64,
}

impl Position {
    pub fn new(symbol: impl Into<String>, units: f64, price: f64) -> Result<Self, ValidationError> {
        let symbol = symbol.into();
        for (field, value) in [("units", units), ("price", price)] {
            if !value.is_finite() {
                return Err(ValidationError::NotFinite { field, value });
            }
        }
        if units < 0.0 {
            return Err(ValidationError::Negative {
                field: "units",
                value: units,
            });
        }
        if price < 0.0 {
            return Err(ValidationError::Negative {
                field: "price",
                value: price,
            });
        }
        if symbol.trim().is_empty() {
            return Err(ValidationError::EmptySymbol { field: "symbol" });
        }
        Ok(Position {
            symbol,
            units,
            price,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn units(&self) -> f64 {
        self.units
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    pub fn market_value(&self) -> f64 {
        self.units * self.price
    }

    /// Same units marked to a new price.
    pub fn repriced(&self, price: f64) -> Result<Self, ValidationError> {
        Position::new(self.symbol.as_str(), self.units, price)
    }

    /// `units` of this symbol at this price; negative input clamps to zero.
    pub(crate) fn slice(&self, units: f64) -> Position {
        Position {
            symbol: self.symbol.clone(),
            units: units.max(0.0),
            price: self.price,
        }
    }
}

/// Cash plus positions at one point of a simulation.
#[derive(Debug, Clone, PartialEq)]
pub struct Valuation {
    cash: f64,
    positions: Vec<Position>,
}

impl Valuation {
    pub fn new(cash: f64, positions: Vec<Position>) -> Result<Self, ValidationError> {
        if !cash.is_finite() {
            return Err(ValidationError::NotFinite {
                field: "cash",
                value: cash,
            });
        }
        if cash < 0.0 {
            return Err(ValidationError::Negative {
                field: "cash",
                value: cash,
            });
        }
        Ok(Valuation { cash, positions })
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    pub fn position(&self, symbol: &str) -> Option<&Position> {
        self.positions.iter().find(|p| p.symbol() == symbol)
    }

    pub fn total_value(&self) -> f64 {
        self.cash + self.positions.iter().map(Position::market_value).sum::<f64>()
    }
}
