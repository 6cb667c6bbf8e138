//! Configuration validation.
//!
//! Every field is checked before a run; the result is a typed [`RunConfig`].

use std::path::PathBuf;

use chrono::{NaiveDate, NaiveDateTime};

use crate::domain::error::SignalsError;
use crate::domain::frequency::Frequency;
use crate::domain::simulation::DEFAULT_LOOKBEHIND;
use crate::domain::strategy::MovingAverageCrossover;
use crate::ports::config_port::ConfigPort;

pub const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub data_path: PathBuf,
    pub symbols: Vec<String>,
    pub frequency: Frequency,
    pub max_gap: usize,
    pub cash: f64,
    pub fee: f64,
    pub lookbehind: usize,
    pub from: Option<NaiveDateTime>,
    pub to: Option<NaiveDateTime>,
    pub strategy: MovingAverageCrossover,
}

/// `YYYY-MM-DD HH:MM:SS`, or `YYYY-MM-DD` for midnight.
pub fn parse_date_time(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    NaiveDateTime::parse_from_str(value, DATE_TIME_FORMAT)
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(value, DATE_FORMAT)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

pub fn validate_run_config(config: &dyn ConfigPort) -> Result<(), SignalsError> {
    load_run_config(config).map(|_| ())
}

pub fn load_run_config(config: &dyn ConfigPort) -> Result<RunConfig, SignalsError> {
    let data_path = PathBuf::from(required(config, "data", "path")?);
    let symbols = validate_symbols(config)?;
    let frequency = validate_frequency(config)?;
    let max_gap = non_negative_int(config, "aggregation", "max_gap", 0)?;
    let cash = validate_cash(config)?;
    let fee = validate_fee(config)?;
    let lookbehind = validate_lookbehind(config)?;
    let (from, to) = validate_range(config)?;
    let strategy = validate_strategy(config)?;

    Ok(RunConfig {
        data_path,
        symbols,
        frequency,
        max_gap,
        cash,
        fee,
        lookbehind,
        from,
        to,
        strategy,
    })
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> SignalsError {
    SignalsError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn required(config: &dyn ConfigPort, section: &str, key: &str) -> Result<String, SignalsError> {
    match config.get_string(section, key) {
        Some(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        _ => Err(SignalsError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        }),
    }
}

fn non_negative_int(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: i64,
) -> Result<usize, SignalsError> {
    let value = config
        .get_int(section, key)
        .map_err(|_| invalid(section, key, format!("{key} must be an integer")))?
        .unwrap_or(default);
    usize::try_from(value).map_err(|_| invalid(section, key, format!("{key} must be non-negative")))
}

fn validate_symbols(config: &dyn ConfigPort) -> Result<Vec<String>, SignalsError> {
    let symbols: Vec<String> = required(config, "data", "symbols")?
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    if symbols.is_empty() {
        return Err(invalid("data", "symbols", "at least one symbol is required"));
    }
    Ok(symbols)
}

fn validate_frequency(config: &dyn ConfigPort) -> Result<Frequency, SignalsError> {
    required(config, "data", "frequency")?
        .parse()
        .map_err(|e| invalid("data", "frequency", format!("{e}")))
}

fn validate_cash(config: &dyn ConfigPort) -> Result<f64, SignalsError> {
    let value: f64 = required(config, "portfolio", "cash")?
        .parse()
        .map_err(|_| invalid("portfolio", "cash", "cash must be a number"))?;
    if !(value > 0.0 && value.is_finite()) {
        return Err(invalid("portfolio", "cash", "cash must be positive"));
    }
    Ok(value)
}

fn validate_fee(config: &dyn ConfigPort) -> Result<f64, SignalsError> {
    let value = config
        .get_double("portfolio", "fee")
        .map_err(|_| invalid("portfolio", "fee", "fee must be a number"))?
        .unwrap_or(0.0);
    if !(value >= 0.0 && value.is_finite()) {
        return Err(invalid("portfolio", "fee", "fee must be non-negative"));
    }
    Ok(value)
}

fn validate_lookbehind(config: &dyn ConfigPort) -> Result<usize, SignalsError> {
    let value = non_negative_int(config, "simulation", "lookbehind", DEFAULT_LOOKBEHIND as i64)?;
    if value < 1 {
        return Err(invalid(
            "simulation",
            "lookbehind",
            "lookbehind must be at least 1",
        ));
    }
    Ok(value)
}

fn parse_bound(config: &dyn ConfigPort, key: &str) -> Result<Option<NaiveDateTime>, SignalsError> {
    match config.get_string("simulation", key) {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => parse_date_time(&s).map(Some).ok_or_else(|| {
            invalid(
                "simulation",
                key,
                format!("invalid {key} format, expected YYYY-MM-DD HH:MM:SS"),
            )
        }),
    }
}

fn validate_range(
    config: &dyn ConfigPort,
) -> Result<(Option<NaiveDateTime>, Option<NaiveDateTime>), SignalsError> {
    let from = parse_bound(config, "from")?;
    let to = parse_bound(config, "to")?;
    if let (Some(from), Some(to)) = (from, to) {
        if from > to {
            return Err(invalid("simulation", "from", "from must not be after to"));
        }
    }
    Ok((from, to))
}

fn validate_strategy(config: &dyn ConfigPort) -> Result<MovingAverageCrossover, SignalsError> {
    let fast = non_negative_int(config, "strategy", "fast", 7)?;
    let slow = non_negative_int(config, "strategy", "slow", 24)?;
    if fast < 1 {
        return Err(invalid("strategy", "fast", "fast must be at least 1"));
    }
    if fast >= slow {
        return Err(invalid("strategy", "slow", "slow must be greater than fast"));
    }

    let allocation = config
        .get_double("strategy", "allocation")
        .map_err(|_| invalid("strategy", "allocation", "allocation must be a number"))?
        .unwrap_or(450_000.0);
    if !(allocation > 0.0 && allocation.is_finite()) {
        return Err(invalid(
            "strategy",
            "allocation",
            "allocation must be positive",
        ));
    }

    Ok(MovingAverageCrossover {
        fast,
        slow,
        allocation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    const VALID: &str = "
[data]
path = ./data
symbols = AAPL, TSLA
frequency = OneDay

[aggregation]
max_gap = 2

[portfolio]
cash = 1000000
fee = 2.5

[simulation]
lookbehind = 30
from = 2024-01-01 00:00:00
to = 2024-12-31

[strategy]
fast = 5
slow = 20
allocation = 1000
";

    fn make_config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    fn with(key_line: &str, replacement: &str) -> FileConfigAdapter {
        make_config(&VALID.replace(key_line, replacement))
    }

    fn invalid_key(err: SignalsError) -> String {
        match err {
            SignalsError::ConfigInvalid { key, .. } => key,
            other => panic!("expected ConfigInvalid, got {other:?}"),
        }
    }

    #[test]
    fn valid_config_loads() {
        let run = load_run_config(&make_config(VALID)).unwrap();
        assert_eq!(run.data_path, PathBuf::from("./data"));
        assert_eq!(run.symbols, vec!["AAPL", "TSLA"]);
        assert_eq!(run.frequency, Frequency::OneDay);
        assert_eq!(run.max_gap, 2);
        assert!((run.cash - 1_000_000.0).abs() < f64::EPSILON);
        assert!((run.fee - 2.5).abs() < f64::EPSILON);
        assert_eq!(run.lookbehind, 30);
        assert_eq!(run.from, parse_date_time("2024-01-01"));
        assert_eq!(run.to, parse_date_time("2024-12-31 00:00:00"));
        assert_eq!(
            run.strategy,
            MovingAverageCrossover {
                fast: 5,
                slow: 20,
                allocation: 1000.0
            }
        );
    }

    #[test]
    fn defaults_apply() {
        let config = make_config(
            "[data]\npath = d\nsymbols = AAPL\nfrequency = onehour\n[portfolio]\ncash = 10\n",
        );
        let run = load_run_config(&config).unwrap();
        assert_eq!(run.frequency, Frequency::OneHour);
        assert_eq!(run.max_gap, 0);
        assert_eq!(run.lookbehind, DEFAULT_LOOKBEHIND);
        assert_eq!(run.from, None);
        assert_eq!(run.strategy.fast, 7);
        assert_eq!(run.strategy.slow, 24);
        assert!(run.fee.abs() < f64::EPSILON);
    }

    #[test]
    fn missing_path() {
        let err = validate_run_config(&with("path = ./data\n", "")).unwrap_err();
        assert!(matches!(err, SignalsError::ConfigMissing { key, .. } if key == "path"));
    }

    #[test]
    fn empty_symbols() {
        let err = validate_run_config(&with("symbols = AAPL, TSLA", "symbols = ,")).unwrap_err();
        assert_eq!(invalid_key(err), "symbols");
    }

    #[test]
    fn unknown_frequency() {
        let err =
            validate_run_config(&with("frequency = OneDay", "frequency = Weekly")).unwrap_err();
        assert_eq!(invalid_key(err), "frequency");
    }

    #[test]
    fn cash_must_be_positive() {
        let err = validate_run_config(&with("cash = 1000000", "cash = 0")).unwrap_err();
        assert_eq!(invalid_key(err), "cash");
        let err = validate_run_config(&with("cash = 1000000", "cash = lots")).unwrap_err();
        assert_eq!(invalid_key(err), "cash");
    }

    #[test]
    fn negative_fee_and_gap() {
        let err = validate_run_config(&with("fee = 2.5", "fee = -1")).unwrap_err();
        assert_eq!(invalid_key(err), "fee");
        let err = validate_run_config(&with("max_gap = 2", "max_gap = -1")).unwrap_err();
        assert_eq!(invalid_key(err), "max_gap");
    }

    #[test]
    fn malformed_numbers_are_invalid() {
        let err = validate_run_config(&with("fee = 2.5", "fee = abc")).unwrap_err();
        assert_eq!(invalid_key(err), "fee");
        let err = validate_run_config(&with("max_gap = 2", "max_gap = x")).unwrap_err();
        assert_eq!(invalid_key(err), "max_gap");
        let err = validate_run_config(&with("fast = 5", "fast = five")).unwrap_err();
        assert_eq!(invalid_key(err), "fast");
        let err = validate_run_config(&with("allocation = 1000", "allocation = lots")).unwrap_err();
        assert_eq!(invalid_key(err), "allocation");
    }

    #[test]
    fn from_after_to() {
        let err = validate_run_config(&with("to = 2024-12-31", "to = 2023-12-31")).unwrap_err();
        assert_eq!(invalid_key(err), "from");
    }

    #[test]
    fn bad_date_format() {
        let err = validate_run_config(&with("to = 2024-12-31", "to = 31/12/2024")).unwrap_err();
        assert_eq!(invalid_key(err), "to");
    }

    #[test]
    fn fast_must_be_below_slow() {
        let err = validate_run_config(&with("slow = 20", "slow = 5")).unwrap_err();
        assert_eq!(invalid_key(err), "slow");
        let err = validate_run_config(&with("fast = 5", "fast = 0")).unwrap_err();
        assert_eq!(invalid_key(err), "fast");
    }

    #[test]
    fn allocation_must_be_positive() {
        let err =
            validate_run_config(&with("allocation = 1000", "allocation = -5")).unwrap_err();
        assert_eq!(invalid_key(err), "allocation");
    }

    #[test]
    fn parse_date_time_formats() {
        let midnight = NaiveDate::from_ymd_opt(2024, 2, 29)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(parse_date_time("2024-02-29"), Some(midnight));
        assert_eq!(parse_date_time(" 2024-02-29 00:00:00 "), Some(midnight));
        assert_eq!(parse_date_time("2024-02-30"), None);
        assert_eq!(parse_date_time("yesterday"), None);
    }
}
