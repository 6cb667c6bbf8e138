//! Data access port trait.

use crate::domain::error::SignalsError;
use crate::domain::frequency::Frequency;
use crate::domain::symbol_events::SymbolEvents;

/// Source of per-symbol event sequences. Arrival order across symbols does
/// not matter; aggregation re-sorts by bucket time.
pub trait DataPort {
    fn fetch_events(&self, symbol: &str, frequency: Frequency) -> Result<SymbolEvents, SignalsError>;

    /// Fetch every symbol, collecting all failures before giving up.
    fn fetch_all(
        &self,
        symbols: &[String],
        frequency: Frequency,
    ) -> Result<Vec<SymbolEvents>, SignalsError> {
        let mut fetched = Vec::with_capacity(symbols.len());
        let mut failures = Vec::new();

        for symbol in symbols {
            match self.fetch_events(symbol, frequency) {
                Ok(events) => fetched.push(events),
                Err(e) => {
                    tracing::warn!(symbol = %symbol, error = %e, "fetch failed");
                    failures.push(format!("{symbol}: {e}"));
                }
            }
        }

        if failures.is_empty() {
            Ok(fetched)
        } else {
            Err(SignalsError::FetchFailed { failures })
        }
    }
}
