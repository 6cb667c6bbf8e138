//! Domain error types.
//!
//! Each stage of the pipeline has its own error enum so callers can match on
//! exactly the failures a given operation can produce. [`SignalsError`] wraps
//! all of them for the binary and for ports.

use chrono::NaiveDateTime;
use std::fmt;

/// Which variant of [`crate::domain::event::Event`] a lookup expected or found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    PriceBar,
    Indicator,
    Custom,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::PriceBar => write!(f, "price bar"),
            EventKind::Indicator => write!(f, "indicator"),
            EventKind::Custom => write!(f, "custom event"),
        }
    }
}

/// A malformed value rejected by its constructor.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} cannot be empty")]
    EmptySymbol { field: &'static str },

    #[error("invalid price bar for {symbol}: open {open} / close {close} outside [{low}, {high}]")]
    PriceOutOfRange {
        symbol: String,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
    },

    #[error("{field} cannot be NaN")]
    NanValue { field: String },

    #[error("custom event key cannot be blank")]
    BlankKey,

    #[error("custom event for {key} has no values")]
    EmptyValues { key: String },

    #[error("{field} cannot be negative: {value}")]
    Negative { field: &'static str, value: f64 },

    #[error("{field} must be finite: {value}")]
    NotFinite { field: &'static str, value: f64 },

    #[error("event sequence cannot be empty")]
    EmptySequence,
}

/// Failed typed lookup on a [`crate::domain::quote::Quote`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QuoteError {
    #[error("{kind} not found for symbol: {key}")]
    Missing { kind: EventKind, key: String },

    #[error("event for {key} is a {found}, not a {expected}")]
    WrongKind {
        key: String,
        expected: EventKind,
        found: EventKind,
    },

    #[error("quote must contain at least one event")]
    Empty,
}

/// Aggregation rejected the input as incomplete or inconsistent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DataQualityError {
    #[error("multiple events for {symbol} in bucket {time}")]
    DuplicateSymbol { symbol: String, time: NaiveDateTime },

    #[error("too many missing buckets for symbol {symbol}: {missing} consecutive, max gap {max_gap}")]
    GapExceeded {
        symbol: String,
        missing: usize,
        max_gap: usize,
    },

    #[error("bucket {time} produced no quote: {source}")]
    EmptyBucket {
        time: NaiveDateTime,
        #[source]
        source: QuoteError,
    },
}

/// An indicator run aborted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IndicatorError {
    #[error("failed to process series: {reason} (previous errors: {errors:?})")]
    Failed { reason: String, errors: Vec<String> },

    #[error("indicator emitted no events (errors: {errors:?})")]
    NoOutput { errors: Vec<String> },
}

/// A trade proposal step was refused. The ledger is never touched.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TradeError {
    #[error("insufficient cash: need {required}, have {available}")]
    InsufficientCash { required: f64, available: f64 },

    #[error("position not found for symbol: {symbol}")]
    NoPosition { symbol: String },

    #[error("cannot sell {amount} of {symbol}: position worth {value}")]
    ExceedsPosition {
        symbol: String,
        amount: f64,
        value: f64,
    },

    #[error("trade amount must be positive and finite: {amount}")]
    InvalidAmount { amount: f64 },

    #[error("cannot trade {symbol} at non-positive price {price}")]
    InvalidPrice { symbol: String, price: f64 },

    #[error(transparent)]
    Quote(#[from] QuoteError),

    #[error(transparent)]
    Ledger(#[from] ValidationError),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PnlError {
    #[error("at least two valuations are required, got {count}")]
    InsufficientHistory { count: usize },
}

/// Top-level error type for signals.
#[derive(Debug, thiserror::Error)]
pub enum SignalsError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Quote(#[from] QuoteError),

    #[error(transparent)]
    DataQuality(#[from] DataQualityError),

    #[error(transparent)]
    Indicator(#[from] IndicatorError),

    #[error(transparent)]
    Trade(#[from] TradeError),

    #[error(transparent)]
    Pnl(#[from] PnlError),

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("failed to fetch {}", .failures.join("; "))]
    FetchFailed { failures: Vec<String> },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&SignalsError> for std::process::ExitCode {
    fn from(err: &SignalsError) -> Self {
        let code: u8 = match err {
            SignalsError::Io(_) => 1,
            SignalsError::ConfigParse { .. }
            | SignalsError::ConfigMissing { .. }
            | SignalsError::ConfigInvalid { .. } => 2,
            SignalsError::Data { .. } | SignalsError::FetchFailed { .. } => 3,
            SignalsError::DataQuality(_) => 4,
            SignalsError::Indicator(_) => 5,
            SignalsError::Trade(_) | SignalsError::Pnl(_) => 6,
            SignalsError::Validation(_) | SignalsError::Quote(_) => 7,
        };
        std::process::ExitCode::from(code)
    }
}
