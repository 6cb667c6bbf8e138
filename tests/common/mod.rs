#![allow(dead_code)]

use chrono::{Duration, NaiveDate, NaiveDateTime};
use signals::domain::error::SignalsError;
use signals::domain::event::{Event, PriceBar};
use signals::domain::frequency::Frequency;
use signals::domain::symbol_events::SymbolEvents;
use signals::ports::data_port::DataPort;
use std::collections::HashMap;

/// Falls for eight days, rises for eight, falls for eight. With fast 2 /
/// slow 5 averages this crosses above on day 10 (close 99) and back below on
/// day 18 (close 106).
pub const V_SHAPE: [f64; 24] = [
    100.0, 99.0, 98.0, 97.0, 96.0, 95.0, 94.0, 93.0, 93.0, 96.0, 99.0, 102.0, 105.0, 108.0,
    111.0, 114.0, 114.0, 110.0, 106.0, 102.0, 98.0, 94.0, 90.0, 86.0,
];

pub struct MockDataPort {
    pub data: HashMap<String, SymbolEvents>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_events(mut self, symbol: &str, events: SymbolEvents) -> Self {
        self.data.insert(symbol.to_string(), events);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_events(&self, symbol: &str, _frequency: Frequency) -> Result<SymbolEvents, SignalsError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(SignalsError::Data {
                reason: reason.clone(),
            });
        }
        self.data.get(symbol).cloned().ok_or_else(|| SignalsError::Data {
            reason: format!("no data for {symbol}"),
        })
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

pub fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, min, s)
        .unwrap()
}

pub fn make_bar(symbol: &str, time: NaiveDateTime, close: f64) -> Event {
    PriceBar::new(symbol, time, close, close + 1.0, close - 1.0, close, 1000.0)
        .unwrap()
        .into()
}

/// One bar per step of `step` starting at `start`.
pub fn generate_events(
    symbol: &str,
    start: NaiveDateTime,
    step: Duration,
    closes: &[f64],
) -> SymbolEvents {
    SymbolEvents::new(
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| make_bar(symbol, start + step * i as i32, c))
            .collect(),
    )
    .unwrap()
}

pub fn daily(symbol: &str, closes: &[f64]) -> SymbolEvents {
    generate_events(symbol, date(2024, 1, 1), Duration::days(1), closes)
}

/// CSV body in the `time,open,high,low,close,volume` layout.
pub fn csv_body(start: NaiveDateTime, closes: &[f64]) -> String {
    let mut body = String::from("time,open,high,low,close,volume\n");
    for (i, c) in closes.iter().enumerate() {
        let time = start + Duration::days(i as i64);
        body.push_str(&format!(
            "{},{c},{},{},{c},1000\n",
            time.format("%Y-%m-%d %H:%M:%S"),
            c + 1.0,
            c - 1.0
        ));
    }
    body
}
