//! Per-symbol profit and loss over a valuation history.

use std::collections::BTreeMap;

use super::error::PnlError;
use super::position::{Position, Valuation};

/// Realised or unrealised gain of one symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct PnlResult {
    pub symbol: String,
    pub difference_cash: f64,
    pub difference_percent: f64,
}

/// One slice of a position compared at two snapshots.
#[derive(Debug, Clone, PartialEq)]
struct DifferencePair {
    start: Position,
    end: Position,
}

impl DifferencePair {
    fn cash(&self) -> f64 {
        self.end.market_value() - self.start.market_value()
    }

    fn percent(&self) -> Option<f64> {
        let base = self.start.market_value();
        (base != 0.0).then(|| self.cash() / base * 100.0)
    }
}

/// Walk `valuations` in order and sum the per-slice differences of every
/// symbol whose units changed, closing out still-held positions against the
/// last valuation. Results are sorted by symbol.
pub fn of(valuations: &[Valuation]) -> Result<Vec<PnlResult>, PnlError> {
    let [first, rest @ ..] = valuations else {
        return Err(PnlError::InsufficientHistory { count: 0 });
    };
    let Some(last) = rest.last() else {
        return Err(PnlError::InsufficientHistory { count: 1 });
    };

    let mut baseline: BTreeMap<&str, Position> = first
        .positions()
        .iter()
        .map(|p| (p.symbol(), p.clone()))
        .collect();
    let mut pairs: BTreeMap<String, Vec<DifferencePair>> = BTreeMap::new();

    for valuation in rest {
        for pos in valuation.positions() {
            let Some(prev) = baseline.get(pos.symbol()) else {
                baseline.insert(pos.symbol(), pos.clone());
                continue;
            };
            if prev.units() == pos.units() {
                continue;
            }

            let pair = if prev.units() < pos.units() {
                DifferencePair {
                    start: prev.clone(),
                    end: pos.slice(prev.units()),
                }
            } else {
                DifferencePair {
                    start: pos.slice(prev.units() - pos.units()),
                    end: prev.clone(),
                }
            };
            pairs.entry(pos.symbol().to_string()).or_default().push(pair);
            baseline.insert(pos.symbol(), pos.clone());
        }
    }

    for pos in last.positions() {
        if let Some(prev) = baseline.get(pos.symbol()) {
            pairs
                .entry(pos.symbol().to_string())
                .or_default()
                .push(DifferencePair {
                    start: prev.clone(),
                    end: pos.clone(),
                });
        }
    }

    Ok(pairs
        .into_iter()
        .map(|(symbol, pairs)| PnlResult {
            symbol,
            difference_cash: pairs.iter().map(DifferencePair::cash).sum(),
            difference_percent: pairs.iter().filter_map(DifferencePair::percent).sum(),
        })
        .collect())
}
