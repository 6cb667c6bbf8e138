//! CSV file data adapter.
//!
//! Reads `<base_path>/<SYMBOL>.csv` with header
//! `time,open,high,low,close,volume`.

use crate::domain::config_validation::parse_date_time;
use crate::domain::error::SignalsError;
use crate::domain::event::{Event, PriceBar};
use crate::domain::frequency::Frequency;
use crate::domain::symbol_events::SymbolEvents;
use crate::ports::data_port::DataPort;
use std::fs;
use std::path::PathBuf;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }
}

fn data_error(reason: String) -> SignalsError {
    SignalsError::Data { reason }
}

fn number(record: &csv::StringRecord, index: usize, name: &str) -> Result<f64, SignalsError> {
    record
        .get(index)
        .ok_or_else(|| data_error(format!("missing {} column", name)))?
        .trim()
        .parse()
        .map_err(|e| data_error(format!("invalid {} value: {}", name, e)))
}

impl DataPort for CsvAdapter {
    /// Every row becomes one price bar. The file's grain is taken as is;
    /// `frequency` only matters once the bars are aggregated.
    fn fetch_events(&self, symbol: &str, frequency: Frequency) -> Result<SymbolEvents, SignalsError> {
        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path)
            .map_err(|e| data_error(format!("failed to read {}: {}", path.display(), e)))?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| data_error(format!("CSV parse error: {}", e)))?;

            let time_str = record
                .get(0)
                .ok_or_else(|| data_error("missing time column".into()))?;
            let time = parse_date_time(time_str)
                .ok_or_else(|| data_error(format!("invalid time format: {}", time_str)))?;

            bars.push(PriceBar::new(
                symbol,
                time,
                number(&record, 1, "open")?,
                number(&record, 2, "high")?,
                number(&record, 3, "low")?,
                number(&record, 4, "close")?,
                number(&record, 5, "volume")?,
            )?);
        }

        if bars.is_empty() {
            return Err(data_error(format!("no rows in {}", path.display())));
        }

        bars.sort_by_key(|b| b.time());
        tracing::debug!(symbol, rows = bars.len(), %frequency, "loaded csv");
        Ok(SymbolEvents::new(bars.into_iter().map(Event::from).collect())?)
    }
}
