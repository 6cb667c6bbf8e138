//! Event model: price bars, indicator values and custom tagged records.
//!
//! All variants are immutable once built and validate their payload in the
//! constructor, so any `Event` in hand is well-formed.

use chrono::NaiveDateTime;

use super::error::{EventKind, ValidationError};

fn require_finite(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NotFinite { field, value });
    }
    Ok(())
}

fn require_symbol(value: &str, field: &'static str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptySymbol { field });
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriceBar {
    symbol: String,
    time: NaiveDateTime,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

impl PriceBar {
    /// Build a bar; open and close must lie within `[low, high]`.
    pub fn new(
        symbol: impl Into<String>,
        time: NaiveDateTime,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Result<Self, ValidationError> {
        let symbol = symbol.into();
        for (field, value) in [
            ("open", open),
            ("high", high),
            ("low", low),
            ("close", close),
            ("volume", volume),
        ] {
            require_finite(field, value)?;
        }
        if open > high || open < low || close > high || close < low {
            return Err(ValidationError::PriceOutOfRange {
                symbol,
                open,
                high,
                low,
                close,
            });
        }
        require_symbol(&symbol, "symbol")?;
        Ok(PriceBar {
            symbol,
            time,
            open,
            high,
            low,
            close,
            volume,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn time(&self) -> NaiveDateTime {
        self.time
    }

    pub fn open(&self) -> f64 {
        self.open
    }

    pub fn high(&self) -> f64 {
        self.high
    }

    pub fn low(&self) -> f64 {
        self.low
    }

    pub fn close(&self) -> f64 {
        self.close
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    /// (high + low + close) / 3
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }
}

/// Output of an indicator: up to four numeric slots, the first always set.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorValue {
    for_symbol: String,
    key: String,
    time: NaiveDateTime,
    values: [f64; 4],
}

impl IndicatorValue {
    pub fn new(
        for_symbol: impl Into<String>,
        key: impl Into<String>,
        time: NaiveDateTime,
        values: [f64; 4],
    ) -> Result<Self, ValidationError> {
        let for_symbol = for_symbol.into();
        let key = key.into();
        require_symbol(&for_symbol, "for_symbol")?;
        require_symbol(&key, "key")?;
        if values[0].is_nan() {
            return Err(ValidationError::NanValue {
                field: format!("{key} value"),
            });
        }
        Ok(IndicatorValue {
            for_symbol,
            key,
            time,
            values,
        })
    }

    /// Single-valued indicator; the remaining slots are NaN.
    pub fn single(
        for_symbol: impl Into<String>,
        key: impl Into<String>,
        time: NaiveDateTime,
        value: f64,
    ) -> Result<Self, ValidationError> {
        Self::new(for_symbol, key, time, [value, f64::NAN, f64::NAN, f64::NAN])
    }

    pub fn for_symbol(&self) -> &str {
        &self.for_symbol
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn time(&self) -> NaiveDateTime {
        self.time
    }

    pub fn value(&self) -> f64 {
        self.values[0]
    }

    pub fn values(&self) -> [f64; 4] {
        self.values
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeyValue {
    pub key: String,
    pub value: f64,
}

impl KeyValue {
    pub fn new(key: impl Into<String>, value: f64) -> Self {
        KeyValue {
            key: key.into(),
            value,
        }
    }
}

/// Free-form named values attached to a symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomTagged {
    for_symbol: String,
    key: String,
    time: NaiveDateTime,
    values: Vec<KeyValue>,
}

impl CustomTagged {
    pub fn new(
        for_symbol: impl Into<String>,
        key: impl Into<String>,
        time: NaiveDateTime,
        values: Vec<KeyValue>,
    ) -> Result<Self, ValidationError> {
        let for_symbol = for_symbol.into();
        let key = key.into();
        require_symbol(&for_symbol, "for_symbol")?;
        require_symbol(&key, "key")?;
        if values.is_empty() {
            return Err(ValidationError::EmptyValues { key });
        }
        for kv in &values {
            if kv.key.trim().is_empty() {
                return Err(ValidationError::BlankKey);
            }
            if kv.value.is_nan() {
                return Err(ValidationError::NanValue {
                    field: kv.key.clone(),
                });
            }
        }
        Ok(CustomTagged {
            for_symbol,
            key,
            time,
            values,
        })
    }

    pub fn for_symbol(&self) -> &str {
        &self.for_symbol
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn time(&self) -> NaiveDateTime {
        self.time
    }

    pub fn values(&self) -> &[KeyValue] {
        &self.values
    }

    /// First value stored under `key`.
    pub fn get(&self, key: &str) -> Option<f64> {
        self.values.iter().find(|kv| kv.key == key).map(|kv| kv.value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    PriceBar(PriceBar),
    Indicator(IndicatorValue),
    Custom(CustomTagged),
}

impl Event {
    pub fn time(&self) -> NaiveDateTime {
        match self {
            Event::PriceBar(bar) => bar.time(),
            Event::Indicator(ind) => ind.time(),
            Event::Custom(custom) => custom.time(),
        }
    }

    /// Key under which this event is stored in a quote: the bar's symbol, or
    /// the output key of an indicator or custom event.
    pub fn symbol(&self) -> &str {
        match self {
            Event::PriceBar(bar) => bar.symbol(),
            Event::Indicator(ind) => ind.key(),
            Event::Custom(custom) => custom.key(),
        }
    }

    /// Instrument the event describes.
    pub fn for_symbol(&self) -> &str {
        match self {
            Event::PriceBar(bar) => bar.symbol(),
            Event::Indicator(ind) => ind.for_symbol(),
            Event::Custom(custom) => custom.for_symbol(),
        }
    }

    pub fn kind(&self) -> EventKind {
        match self {
            Event::PriceBar(_) => EventKind::PriceBar,
            Event::Indicator(_) => EventKind::Indicator,
            Event::Custom(_) => EventKind::Custom,
        }
    }
}

impl From<PriceBar> for Event {
    fn from(bar: PriceBar) -> Self {
        Event::PriceBar(bar)
    }
}

impl From<IndicatorValue> for Event {
    fn from(value: IndicatorValue) -> Self {
        Event::Indicator(value)
    }
}

impl From<CustomTagged> for Event {
    fn from(custom: CustomTagged) -> Self {
        Event::Custom(custom)
    }
}
