//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use log::info;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_report_adapter::JsonReportAdapter;
use crate::domain::backtest::{run_backtest, BacktestConfig};
use crate::domain::config_validation::{count, number, validate_backtest_config, validate_signal_config};
use crate::domain::error::SigtraderError;
use crate::domain::execution::ExecutionConfig;
use crate::domain::indicator::support_resistance::DEFAULT_LOOKBACK;
use crate::domain::metrics::BacktestReport;
use crate::domain::ohlcv::{validate_series, OhlcvBar};
use crate::domain::signal::detectors::DetectorKind;
use crate::domain::signal::recommendation::{recommend, TradingRecommendation};
use crate::domain::signal::{EnsembleConfig, MaKind};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

/// Bars needed before support/resistance levels can be found.
pub const MIN_SIGNAL_BARS: usize = 2 * DEFAULT_LOOKBACK + 1;

#[derive(Parser, Debug)]
#[command(name = "sigtrader", about = "Signal ensemble backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest over one symbol's bars
    Backtest {
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// CSV file with date,open,high,low,close,volume
        #[arg(short, long)]
        data: PathBuf,
        /// Write the JSON report here. Trade `capital_after` is margin
        /// cash: opens pay only commission, closes settle pnl - commission
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        symbol: Option<String>,
    },
    /// Print the trading recommendation for the latest bar
    Signals {
        #[arg(short, long)]
        data: PathBuf,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List symbols with a CSV file in a directory
    ListSymbols {
        #[arg(long)]
        dir: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match execute(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn execute(command: Command) -> Result<(), SigtraderError> {
    match command {
        Command::Backtest {
            config,
            data,
            output,
            symbol,
        } => run_backtest_command(config.as_deref(), &data, output.as_deref(), symbol.as_deref()),
        Command::Signals { data, config } => run_signals(&data, config.as_deref()),
        Command::Validate { config } => run_validate(&config),
        Command::ListSymbols { dir } => run_list_symbols(&dir),
    }
}

/// Load and validate a config file, or an empty config when none is given.
pub fn load_config(path: Option<&Path>) -> Result<FileConfigAdapter, SigtraderError> {
    let adapter = match path {
        Some(path) => {
            eprintln!("Loading config from {}", path.display());
            FileConfigAdapter::from_file(path)?
        }
        None => FileConfigAdapter::from_string("").map_err(|reason| SigtraderError::ConfigParse {
            file: "<defaults>".to_string(),
            reason,
        })?,
    };
    validate_backtest_config(&adapter)?;
    validate_signal_config(&adapter)?;
    Ok(adapter)
}

pub fn build_backtest_config(adapter: &dyn ConfigPort) -> Result<BacktestConfig, SigtraderError> {
    let defaults = ExecutionConfig::default();
    let execution = ExecutionConfig {
        commission: adapter.get_double("backtest", "commission", defaults.commission),
        slippage: adapter.get_double("backtest", "slippage", defaults.slippage),
        position_size_pct: adapter.get_double(
            "backtest",
            "position_size_pct",
            defaults.position_size_pct,
        ),
        risk_per_trade: adapter.get_double("backtest", "risk_per_trade", defaults.risk_per_trade),
        stop_atr_multiple: adapter.get_double(
            "backtest",
            "stop_atr_multiple",
            defaults.stop_atr_multiple,
        ),
        target_atr_multiple: adapter.get_double(
            "backtest",
            "target_atr_multiple",
            defaults.target_atr_multiple,
        ),
        stop_loss_pct: adapter.get_double("backtest", "stop_loss_pct", defaults.stop_loss_pct),
        take_profit_pct: adapter.get_double(
            "backtest",
            "take_profit_pct",
            defaults.take_profit_pct,
        ),
        trailing_atr_multiple: number(adapter, "backtest", "trailing_atr_multiple")?,
    };

    Ok(BacktestConfig {
        symbol: adapter
            .get_string("backtest", "symbol")
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| BacktestConfig::default().symbol),
        initial_capital: adapter.get_double("backtest", "initial_capital", 100_000.0),
        execution,
        max_holding_bars: count(adapter, "backtest", "max_holding_bars")?,
    })
}

pub fn build_ensemble_config(adapter: &dyn ConfigPort) -> Result<EnsembleConfig, SigtraderError> {
    let mut config = EnsembleConfig::default();
    for kind in DetectorKind::ALL {
        if let Some(weight) = number(adapter, "signals", kind.name())? {
            config.weights.set(kind, weight);
        }
    }
    if let Some(raw) = adapter.get_string("signals", "ma_type") {
        config.ma_kind = raw
            .parse::<MaKind>()
            .map_err(|reason| SigtraderError::invalid("signals", "ma_type", reason))?;
    }
    config.buy_threshold = adapter.get_double("signals", "buy_threshold", config.buy_threshold);
    config.strong_buy_threshold = adapter.get_double(
        "signals",
        "strong_buy_threshold",
        config.strong_buy_threshold,
    );
    config.sideways_dampening =
        adapter.get_double("signals", "sideways_dampening", config.sideways_dampening);
    config.volatility_dampening = adapter.get_double(
        "signals",
        "volatility_dampening",
        config.volatility_dampening,
    );
    config.high_volatility_ratio = adapter.get_double(
        "signals",
        "high_volatility_ratio",
        config.high_volatility_ratio,
    );
    if let Some(period) = count(adapter, "backtest", "atr_period")? {
        config.atr_period = period;
    }
    config.apply_risk_adjustment =
        adapter.get_bool("backtest", "apply_risk_adjustment", config.apply_risk_adjustment);
    Ok(config)
}

/// Load the bars in `data` through the CSV data port. The symbol is the
/// file stem.
pub fn load_bars(data: &Path) -> Result<(String, Vec<OhlcvBar>), SigtraderError> {
    let symbol = data
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .ok_or_else(|| SigtraderError::DataLoad {
            reason: format!("{} is not a file", data.display()),
        })?;
    let dir = data
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let bars = CsvAdapter::new(dir).fetch_bars(&symbol)?;
    validate_series(&bars)?;
    info!("Loaded {} bars for {}", bars.len(), symbol);
    Ok((symbol, bars))
}

fn run_backtest_command(
    config_path: Option<&Path>,
    data: &Path,
    output: Option<&Path>,
    symbol_override: Option<&str>,
) -> Result<(), SigtraderError> {
    let adapter = load_config(config_path)?;
    let mut bt_config = build_backtest_config(&adapter)?;
    let ensemble = build_ensemble_config(&adapter)?;

    let (file_symbol, bars) = load_bars(data)?;
    bt_config.symbol = match symbol_override {
        Some(s) => s.to_uppercase(),
        None if adapter.has_key("backtest", "symbol") => bt_config.symbol,
        None => file_symbol.to_uppercase(),
    };

    eprintln!(
        "Running backtest: {} ({} bars, {} to {})",
        bt_config.symbol,
        bars.len(),
        bars[0].date,
        bars[bars.len() - 1].date
    );
    let report = run_backtest(&bars, &bt_config, &ensemble)?;
    print_summary(&report);

    if let Some(path) = output {
        JsonReportAdapter::pretty().write(&report, path)?;
        eprintln!("\nReport written to: {}", path.display());
    }
    Ok(())
}

pub fn print_summary(report: &BacktestReport) {
    let s = &report.summary;
    eprintln!("\n=== {} Results ===", report.symbol);
    eprintln!("Initial Capital:  {:.2}", s.initial_capital);
    eprintln!("Final Capital:    {:.2}", s.final_capital);
    eprintln!("Total Return:     {:.2}%", s.total_return * 100.0);
    eprintln!("Annualized:       {:.2}%", s.annual_return * 100.0);
    eprintln!("Volatility:       {:.2}%", s.volatility * 100.0);
    eprintln!("Sharpe Ratio:     {:.2}", s.sharpe_ratio);
    eprintln!("Max Drawdown:     -{:.1}%", s.max_drawdown * 100.0);
    eprintln!("Total Trades:     {}", s.total_trades);
    eprintln!("Win Rate:         {:.1}%", s.win_rate * 100.0);
    eprintln!("Profit Factor:    {:.2}", s.profit_factor);
    eprintln!("Commission Paid:  {:.2}", s.total_commission);
}

fn run_signals(data: &Path, config_path: Option<&Path>) -> Result<(), SigtraderError> {
    let adapter = load_config(config_path)?;
    let ensemble = build_ensemble_config(&adapter)?;
    let (symbol, bars) = load_bars(data)?;
    if bars.len() < MIN_SIGNAL_BARS {
        return Err(SigtraderError::InsufficientData {
            symbol,
            bars: bars.len(),
            minimum: MIN_SIGNAL_BARS,
        });
    }

    let rec = recommend(&bars, &ensemble).ok_or_else(|| SigtraderError::NoData {
        symbol: symbol.clone(),
    })?;
    println!("{}", format_recommendation(&symbol, &bars[bars.len() - 1], &rec));
    Ok(())
}

pub fn format_recommendation(symbol: &str, last: &OhlcvBar, rec: &TradingRecommendation) -> String {
    let join = |levels: &[f64]| {
        levels
            .iter()
            .map(|l| format!("{:.2}", l))
            .collect::<Vec<_>>()
            .join(", ")
    };
    let mut lines = vec![
        format!("{} on {}", symbol, last.date),
        format!("  Recommendation: {} ({})", rec.recommendation, rec.recommendation.action()),
        format!("  Strength:       {:.3}", rec.signal_strength),
        format!("  Price:          {:.2}", rec.current_price),
        format!("  Regime:         {}", rec.market_regime),
        format!("  Support:        {}", join(&rec.support_levels)),
        format!("  Resistance:     {}", join(&rec.resistance_levels)),
    ];
    if let Some(poc) = rec.point_of_control {
        lines.push(format!("  Volume POC:     {:.2}", poc));
    }
    if !rec.indicators.is_empty() {
        lines.push("  Indicators:".to_string());
        for (name, value) in &rec.indicators {
            lines.push(format!("    {:<28} {:.4}", name, value));
        }
    }
    lines.join("\n")
}

fn run_validate(config_path: &Path) -> Result<(), SigtraderError> {
    let adapter = load_config(Some(config_path))?;
    let bt_config = build_backtest_config(&adapter)?;
    let ensemble = build_ensemble_config(&adapter)?;

    eprintln!("\nBacktest:");
    eprintln!("  symbol:            {}", bt_config.symbol);
    eprintln!("  initial_capital:   {:.2}", bt_config.initial_capital);
    eprintln!("  commission:        {}", bt_config.execution.commission);
    eprintln!("  slippage:          {}", bt_config.execution.slippage);
    eprintln!("  position_size_pct: {}", bt_config.execution.position_size_pct);
    if let Some(m) = bt_config.execution.trailing_atr_multiple {
        eprintln!("  trailing stop:     {} x ATR", m);
    }
    if let Some(n) = bt_config.max_holding_bars {
        eprintln!("  max holding:       {} bars", n);
    }

    eprintln!("\nSignal weights:");
    for kind in DetectorKind::ALL {
        eprintln!("  {:<20} {}", kind.name(), ensemble.weights.weight(kind));
    }
    eprintln!(
        "  thresholds: buy {} / strong {}",
        ensemble.buy_threshold, ensemble.strong_buy_threshold
    );

    eprintln!("\nConfiguration is valid.");
    Ok(())
}

fn run_list_symbols(dir: &Path) -> Result<(), SigtraderError> {
    let symbols = CsvAdapter::new(dir.to_path_buf()).list_symbols()?;
    if symbols.is_empty() {
        eprintln!("No symbols found in {}", dir.display());
    } else {
        for symbol in &symbols {
            println!("{}", symbol);
        }
        eprintln!("{} symbols found", symbols.len());
    }
    Ok(())
}
