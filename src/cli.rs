//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::aggregator::Aggregator;
use crate::domain::config_validation::{RunConfig, load_run_config};
use crate::domain::error::SignalsError;
use crate::domain::pnl::{self, PnlResult};
use crate::domain::portfolio::Portfolio;
use crate::domain::simulation::Simulation;
use crate::ports::data_port::DataPort;

#[derive(Parser, Debug)]
#[command(name = "signals", about = "Multi-symbol strategy simulator")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the moving-average crossover over the configured symbols
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Print the aggregated quote timeline
    Quotes {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let mut stdout = io::stdout().lock();
    let result = match cli.command {
        Command::Backtest { config } => run_backtest(&config, &mut stdout),
        Command::Validate { config } => run_validate(&config, &mut stdout),
        Command::Quotes { config } => run_quotes(&config, &mut stdout),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<RunConfig, SignalsError> {
    let adapter = FileConfigAdapter::from_file(path)?;
    load_run_config(&adapter)
}

/// Final portfolio and per-symbol PnL of one backtest.
#[derive(Debug)]
pub struct BacktestOutcome {
    pub portfolio: Portfolio,
    pub pnl: Vec<PnlResult>,
}

pub fn backtest(data: &dyn DataPort, config: &RunConfig) -> Result<BacktestOutcome, SignalsError> {
    let events = data.fetch_all(&config.symbols, config.frequency)?;
    let strategy = config.strategy.clone();

    let mut simulation = Simulation::new(config.frequency, events)
        .with_portfolio(config.cash, config.fee)
        .with_max_gap(config.max_gap)
        .with_lookbehind(config.lookbehind)
        .with_indicators(strategy.indicators(config.symbols.as_slice()));
    if let Some(from) = config.from {
        simulation = simulation.with_from(from);
    }
    if let Some(to) = config.to {
        simulation = simulation.with_to(to);
    }

    let portfolio = simulation.run(|ctx| strategy.on_quote(ctx))?;
    let pnl = if portfolio.history().len() < 2 {
        Vec::new()
    } else {
        pnl::of(portfolio.history())?
    };

    Ok(BacktestOutcome { portfolio, pnl })
}

fn run_backtest(config_path: &Path, out: &mut dyn Write) -> Result<(), SignalsError> {
    eprintln!("Loading config from {}", config_path.display());
    let config = load_config(config_path)?;
    let data = CsvAdapter::new(config.data_path.clone());

    let outcome = backtest(&data, &config)?;
    write_outcome(&outcome, out)?;
    Ok(())
}

pub fn write_outcome(outcome: &BacktestOutcome, out: &mut dyn Write) -> io::Result<()> {
    let current = outcome.portfolio.current_valuation();
    writeln!(out, "trades:      {}", outcome.portfolio.history().len() - 1)?;
    writeln!(out, "cash:        {:.2}", current.cash())?;
    writeln!(out, "total value: {:.2}", current.total_value())?;

    if !current.positions().is_empty() {
        writeln!(out, "positions:")?;
        for pos in current.positions() {
            writeln!(
                out,
                "  {:<10} {:>14.4} @ {:>10.4} = {:>14.2}",
                pos.symbol(),
                pos.units(),
                pos.price(),
                pos.market_value()
            )?;
        }
    }

    if !outcome.pnl.is_empty() {
        writeln!(out, "pnl:")?;
        for result in &outcome.pnl {
            writeln!(
                out,
                "  {:<10} {:>14.2} {:>9.2}%",
                result.symbol, result.difference_cash, result.difference_percent
            )?;
        }
    }
    Ok(())
}

fn run_validate(config_path: &Path, out: &mut dyn Write) -> Result<(), SignalsError> {
    let config = load_config(config_path)?;
    writeln!(
        out,
        "Config OK: {} symbol(s) at {}, fast {} / slow {}",
        config.symbols.len(),
        config.frequency,
        config.strategy.fast,
        config.strategy.slow
    )?;
    Ok(())
}

fn run_quotes(config_path: &Path, out: &mut dyn Write) -> Result<(), SignalsError> {
    let config = load_config(config_path)?;
    let data = CsvAdapter::new(config.data_path.clone());
    let events = data.fetch_all(&config.symbols, config.frequency)?;

    let quotes = Aggregator::new(config.max_gap, config.frequency)
        .add_all(events)
        .convert_to_quotes()?;

    for quote in &quotes {
        let symbols: Vec<&str> = quote.symbols().collect();
        writeln!(
            out,
            "{}  {}",
            quote.time(config.frequency).format("%Y-%m-%d %H:%M:%S"),
            symbols.join(",")
        )?;
    }
    eprintln!("{} quotes", quotes.len());
    Ok(())
}
