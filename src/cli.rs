//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::order_log_adapter::{OrderIntent, RecordingOrderAdapter};
use crate::domain::allocation::{target_allocations, OrderRouter};
use crate::domain::backtest::{self as backtest_engine, BacktestConfig, BacktestResult};
use crate::domain::config_validation::{
    parse_bound, validate_backtest_config, validate_strategy_config,
};
use crate::domain::error::BacktestError;
use crate::domain::indicator::MomentumKind;
use crate::domain::metrics::DEFAULT_PERIODS_PER_YEAR;
use crate::domain::resample::resample;
use crate::domain::strategy::Strategy;
use crate::domain::timeframe::Timeframe;
use crate::domain::universe::{load_universe, parse_instruments, Universe};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(
    name = "metaltrend",
    about = "Momentum/trend backtester for correlated metal price series"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Per-instrument input file, overriding the config
        #[arg(short = 'i', long = "input", value_name = "CODE=PATH")]
        inputs: Vec<String>,
        /// Initial capital, overriding [backtest] initial_capital
        #[arg(long)]
        capital: Option<f64>,
        /// Write the equity path as CSV
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Print target-percent orders sent on signal transitions
        #[arg(long)]
        orders: bool,
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show bar counts and date range per instrument
    Info {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short = 'i', long = "input", value_name = "CODE=PATH")]
        inputs: Vec<String>,
    },
}

/// Log to stderr; `RUST_LOG` overrides the default `info` level.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Backtest {
            config,
            inputs,
            capital,
            output,
            orders,
            dry_run,
        } => {
            let options = BacktestOptions {
                inputs,
                capital,
                output,
                orders,
            };
            if dry_run {
                run_dry_run(&config, &options)
            } else {
                run_backtest(&config, &options)
            }
        }
        Command::Validate { config } => run_validate(&config),
        Command::Info { config, inputs } => run_info(&config, &inputs),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

/// Command-line overrides for a backtest run.
#[derive(Debug, Clone, Default)]
pub struct BacktestOptions {
    pub inputs: Vec<String>,
    pub capital: Option<f64>,
    pub output: Option<PathBuf>,
    pub orders: bool,
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, BacktestError> {
    let config = FileConfigAdapter::from_file(path)?;
    validate_backtest_config(&config)?;
    validate_strategy_config(&config)?;
    Ok(config)
}

pub fn build_backtest_config(config: &dyn ConfigPort) -> Result<BacktestConfig, BacktestError> {
    let timeframe = match config.get_nonempty("data", "timeframe") {
        Some(s) => s
            .parse::<Timeframe>()
            .map_err(|e| BacktestError::ConfigInvalid {
                section: "data".into(),
                key: "timeframe".into(),
                reason: e.to_string(),
            })?,
        None => Timeframe::FOUR_HOURS,
    };

    Ok(BacktestConfig {
        timeframe,
        start: parse_bound(config, "start")?,
        end: parse_bound(config, "end")?,
        initial_capital: config.get_f64("backtest", "initial_capital", 100_000.0)?,
        periods_per_year: config.get_f64(
            "backtest",
            "periods_per_year",
            DEFAULT_PERIODS_PER_YEAR,
        )?,
        evaluation_fraction: config.get_f64("backtest", "evaluation_fraction", 1.0)?,
    })
}

pub fn build_strategy(config: &dyn ConfigPort) -> Result<Strategy, BacktestError> {
    let defaults = Strategy::default();

    let momentum_kind = match config.get_nonempty("strategy", "momentum") {
        Some(s) => s
            .parse::<MomentumKind>()
            .map_err(|reason| BacktestError::ConfigInvalid {
                section: "strategy".into(),
                key: "momentum".into(),
                reason,
            })?,
        None => defaults.momentum_kind,
    };

    let period = |key: &str, default: usize| -> Result<usize, BacktestError> {
        let value = config.get_i64("strategy", key, default as i64)?;
        usize::try_from(value)
            .ok()
            .filter(|&p| p > 0)
            .ok_or_else(|| BacktestError::ConfigInvalid {
                section: "strategy".into(),
                key: key.into(),
                reason: format!("{key} must be a positive integer"),
            })
    };

    Ok(Strategy {
        name: config
            .get_nonempty("strategy", "name")
            .unwrap_or(defaults.name),
        sma_period: period("sma_period", defaults.sma_period)?,
        momentum_period: period("momentum_period", defaults.momentum_period)?,
        momentum_kind,
        allocation: config.get_f64("backtest", "allocation", defaults.allocation)?,
    })
}

pub fn build_universe(config: &dyn ConfigPort) -> Result<Universe, BacktestError> {
    let instruments = config.get_nonempty("backtest", "instruments").ok_or_else(|| {
        BacktestError::ConfigMissing {
            section: "backtest".into(),
            key: "instruments".into(),
        }
    })?;
    Ok(Universe {
        codes: parse_instruments(&instruments)?,
    })
}

/// Parse `CODE=PATH` overrides from the command line.
pub fn parse_inputs(inputs: &[String]) -> Result<Vec<(String, PathBuf)>, BacktestError> {
    inputs
        .iter()
        .map(|raw| match raw.split_once('=') {
            Some((code, path)) if !code.trim().is_empty() && !path.trim().is_empty() => {
                Ok((code.trim().to_uppercase(), PathBuf::from(path.trim())))
            }
            _ => Err(BacktestError::ConfigInvalid {
                section: "cli".into(),
                key: "input".into(),
                reason: format!("expected CODE=PATH, got '{raw}'"),
            }),
        })
        .collect()
}

/// Data adapter for `universe`. Relative config paths resolve against
/// `config_dir`; `--input` paths are taken as given.
pub fn build_data_adapter(
    config: &dyn ConfigPort,
    config_dir: &Path,
    universe: &Universe,
    inputs: &[String],
) -> Result<CsvAdapter, BacktestError> {
    let resolve = |p: &str| {
        let path = PathBuf::from(p);
        if path.is_absolute() {
            path
        } else {
            config_dir.join(path)
        }
    };

    let directory = config
        .get_nonempty("data", "directory")
        .map(|d| resolve(&d))
        .unwrap_or_else(|| config_dir.to_path_buf());

    let mut adapter = CsvAdapter::new(directory)
        .has_headers(config.get_flag("data", "has_headers", false)?)
        .strict(config.get_flag("data", "strict", false)?);

    for code in &universe.codes {
        if let Some(path) = config.get_nonempty("files", &code.to_lowercase()) {
            adapter = adapter.with_file(code, resolve(&path));
        }
    }

    for (code, path) in parse_inputs(inputs)? {
        if !universe.codes.contains(&code) {
            return Err(BacktestError::ConfigInvalid {
                section: "cli".into(),
                key: "input".into(),
                reason: format!("{code} is not in the instrument list"),
            });
        }
        adapter = adapter.with_file(&code, path);
    }

    Ok(adapter)
}

fn config_dir(path: &Path) -> PathBuf {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

fn run_backtest(config_path: &Path, options: &BacktestOptions) -> Result<(), BacktestError> {
    tracing::info!(path = %config_path.display(), "loading config");
    let config = load_config(config_path)?;

    let strategy = build_strategy(&config)?;
    let mut bt_config = build_backtest_config(&config)?;
    if let Some(capital) = options.capital {
        if !capital.is_finite() || capital <= 0.0 {
            return Err(BacktestError::ConfigInvalid {
                section: "cli".into(),
                key: "capital".into(),
                reason: "capital must be positive".into(),
            });
        }
        bt_config.initial_capital = capital;
    }

    let universe = build_universe(&config)?;
    let data_port =
        build_data_adapter(&config, &config_dir(config_path), &universe, &options.inputs)?;

    let result = run_backtest_pipeline(&data_port, &universe, &strategy, &bt_config)?;
    println!("{}", format_summary(&result, &strategy, &bt_config));

    if !result.faults.is_empty() {
        println!("\n=== Faults ===");
        for fault in &result.faults {
            println!("  {} {}: {}", fault.timestamp, fault.instrument, fault.reason);
        }
    }

    if options.orders {
        let intents = route_orders(&result, &strategy);
        println!("\n=== Orders ({}) ===", intents.len());
        for intent in &intents {
            println!(
                "  {} {} -> {:.0}%",
                intent.timestamp,
                intent.instrument,
                intent.fraction * 100.0
            );
        }
    }

    let output = options.output.clone().or_else(|| {
        config
            .get_nonempty("report", "equity_path")
            .map(|p| config_dir(config_path).join(p))
    });
    if let Some(path) = output {
        CsvReportAdapter::new().write(&result, &path)?;
        eprintln!("Equity path written to: {}", path.display());
    }

    Ok(())
}

/// Load, window, resample, align and simulate every instrument in `universe`.
pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    universe: &Universe,
    strategy: &Strategy,
    bt_config: &BacktestConfig,
) -> Result<BacktestResult, BacktestError> {
    let loaded = load_universe(data_port, universe, bt_config.start, bt_config.end)?;
    let series: Vec<_> = loaded.into_iter().map(|l| l.series).collect();
    backtest_engine::run_backtest(&series, strategy, bt_config)
}

/// Replay the evaluated signals through an order router, recording the
/// orders it would send.
pub fn route_orders(result: &BacktestResult, strategy: &Strategy) -> Vec<OrderIntent> {
    let targets = target_allocations(&result.signals, strategy.allocation);
    let mut port = RecordingOrderAdapter::new();
    let report = OrderRouter::new().route(&mut port, &targets);
    for fault in &report.faults {
        tracing::warn!(
            timestamp = %fault.timestamp,
            instrument = %fault.instrument,
            reason = %fault.reason,
            "order rejected"
        );
    }
    port.into_intents()
}

pub fn format_summary(
    result: &BacktestResult,
    strategy: &Strategy,
    bt_config: &BacktestConfig,
) -> String {
    let [sma, momentum] = strategy.indicators();
    let m = &result.metrics;
    let mut out = String::new();

    out.push_str(&format!(
        "=== {}: {} + {}, {} bars ===\n",
        strategy.name, sma, momentum, bt_config.timeframe
    ));
    if let (Some(first), Some(last)) = (
        result.equity.points.first(),
        result.equity.points.last(),
    ) {
        out.push_str(&format!(
            "Period:           {} to {}\n",
            first.timestamp, last.timestamp
        ));
    }
    out.push_str(&format!(
        "Bars:             {} aligned, {} evaluated\n",
        result.aligned_bars,
        result.signals.len()
    ));
    out.push_str(&format!(
        "Initial Capital:  {:.2}\n",
        result.equity.initial().unwrap_or(bt_config.initial_capital)
    ));
    out.push_str(&format!(
        "Final Capital:    {:.2}\n",
        result
            .equity
            .final_capital()
            .unwrap_or(bt_config.initial_capital)
    ));
    out.push_str(&format!("Total Return:     {:.2}%\n", m.total_return * 100.0));
    out.push_str(&format!("Annual Return:    {:.2}%\n", m.annual_return * 100.0));
    out.push_str(&format!("Volatility:       {:.2}%\n", m.volatility * 100.0));
    out.push_str(&format!("Sharpe Ratio:     {:.2}\n", m.sharpe_ratio));
    out.push_str(&format!("Max Drawdown:     {:.2}%\n", m.max_drawdown * 100.0));
    out.push_str(&format!("Win Rate:         {:.1}%\n", m.win_rate * 100.0));

    out.push_str("\n=== Signals ===");
    for s in &result.summaries {
        out.push_str(&format!(
            "\n  {}: {}/{} bars active ({:.1}%)",
            s.code,
            s.active_bars,
            s.total_bars,
            s.active_share() * 100.0
        ));
    }
    out
}

pub fn run_dry_run(config_path: &Path, options: &BacktestOptions) -> Result<(), BacktestError> {
    eprintln!("Loading config from {}", config_path.display());
    let config = load_config(config_path)?;
    let strategy = build_strategy(&config)?;
    let bt_config = build_backtest_config(&config)?;
    let universe = build_universe(&config)?;
    let adapter =
        build_data_adapter(&config, &config_dir(config_path), &universe, &options.inputs)?;

    println!("Strategy: {}", strategy.name);
    for indicator in strategy.indicators() {
        println!("  {}", indicator);
    }
    println!("  warm-up: {} bars", strategy.warmup());
    println!("  allocation: {:.0}% per instrument", strategy.allocation * 100.0);

    println!("\nBacktest:");
    println!("  timeframe: {}", bt_config.timeframe);
    println!(
        "  capital: {:.2}",
        options.capital.unwrap_or(bt_config.initial_capital)
    );
    println!("  periods/year: {}", bt_config.periods_per_year);
    println!("  evaluation fraction: {}", bt_config.evaluation_fraction);
    if let Some(start) = bt_config.start {
        println!("  start: {start}");
    }
    if let Some(end) = bt_config.end {
        println!("  end: {end}");
    }

    println!("\nUniverse:");
    for code in &universe.codes {
        println!("  {}: {}", code, adapter.csv_path(code).display());
    }

    eprintln!("\nDry run complete: configuration is valid");
    Ok(())
}

fn run_validate(config_path: &Path) -> Result<(), BacktestError> {
    eprintln!("Validating config: {}", config_path.display());
    let config = load_config(config_path)?;
    let strategy = build_strategy(&config)?;
    let universe = build_universe(&config)?;

    println!(
        "{}: {} instruments, {} + {}",
        strategy.name,
        universe.count(),
        strategy.indicators()[0],
        strategy.indicators()[1]
    );
    eprintln!("Configuration is valid.");
    Ok(())
}

fn run_info(config_path: &Path, inputs: &[String]) -> Result<(), BacktestError> {
    let config = load_config(config_path)?;
    let bt_config = build_backtest_config(&config)?;
    let universe = build_universe(&config)?;
    let adapter = build_data_adapter(&config, &config_dir(config_path), &universe, inputs)?;

    for code in &universe.codes {
        let loaded = adapter.load_observations(code)?;
        let series = loaded.series.within(bt_config.start, bt_config.end);
        let resampled = resample(&series, bt_config.timeframe);
        match (series.first_timestamp(), series.last_timestamp()) {
            (Some(first), Some(last)) => println!(
                "{}: {} raw bars, {} {} bars, {} to {} ({} rejected, {} duplicates)",
                code,
                series.len(),
                resampled.len(),
                bt_config.timeframe,
                first,
                last,
                loaded.rejected.len(),
                loaded.duplicates
            ),
            _ => println!("{}: no data in window ({})", code, loaded.source),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    #[test]
    fn parse_inputs_splits_code_and_path() {
        let parsed = parse_inputs(&["xau=data/gold.csv".into(), " XAG = silver.csv".into()])
            .unwrap();
        assert_eq!(
            parsed,
            vec![
                ("XAU".to_string(), PathBuf::from("data/gold.csv")),
                ("XAG".to_string(), PathBuf::from("silver.csv")),
            ]
        );
    }

    #[test]
    fn parse_inputs_rejects_missing_separator() {
        let err = parse_inputs(&["gold.csv".into()]).unwrap_err();
        assert!(matches!(err, BacktestError::ConfigInvalid { key, .. } if key == "input"));
        assert!(parse_inputs(&["XAU=".into()]).is_err());
    }

    #[test]
    fn build_strategy_defaults() {
        let strategy = build_strategy(&make_config("[backtest]\ninstruments = XAU\n")).unwrap();
        assert_eq!(strategy, Strategy::default());
    }

    #[test]
    fn build_strategy_reads_overrides() {
        let config = make_config(
            "[backtest]\nallocation = 0.37\n[strategy]\nname = Daily\nsma_period = 5\nmomentum_period = 3\nmomentum = difference\n",
        );
        let strategy = build_strategy(&config).unwrap();
        assert_eq!(strategy.name, "Daily");
        assert_eq!(strategy.sma_period, 5);
        assert_eq!(strategy.momentum_period, 3);
        assert_eq!(strategy.momentum_kind, MomentumKind::Difference);
        assert_eq!(strategy.allocation, 0.37);
    }

    #[test]
    fn build_strategy_rejects_zero_period() {
        let err = build_strategy(&make_config("[strategy]\nsma_period = 0\n")).unwrap_err();
        assert!(matches!(err, BacktestError::ConfigInvalid { key, .. } if key == "sma_period"));
    }

    #[test]
    fn build_backtest_config_defaults() {
        let bt = build_backtest_config(&make_config("[backtest]\n")).unwrap();
        assert_eq!(bt.timeframe, Timeframe::FOUR_HOURS);
        assert_eq!(bt.initial_capital, 100_000.0);
        assert_eq!(bt.periods_per_year, 252.0);
        assert_eq!(bt.evaluation_fraction, 1.0);
        assert!(bt.start.is_none());
    }

    #[test]
    fn build_backtest_config_reads_values() {
        let bt = build_backtest_config(&make_config(
            "[data]\ntimeframe = 1d\nstart = 2020-01-01\n[backtest]\ninitial_capital = 5000\nevaluation_fraction = 0.15\n",
        ))
        .unwrap();
        assert_eq!(bt.timeframe, Timeframe::DAILY);
        assert_eq!(bt.initial_capital, 5000.0);
        assert_eq!(bt.evaluation_fraction, 0.15);
        assert!(bt.start.is_some());
    }

    #[test]
    fn build_universe_requires_instruments() {
        let err = build_universe(&make_config("[backtest]\n")).unwrap_err();
        assert!(matches!(err, BacktestError::ConfigMissing { key, .. } if key == "instruments"));
    }

    #[test]
    fn data_adapter_resolves_paths() {
        let config = make_config(
            "[data]\ndirectory = bars\n[files]\nxag = /abs/silver.csv\n[backtest]\ninstruments = XAU,XAG,XPT\n",
        );
        let universe = build_universe(&config).unwrap();
        let adapter = build_data_adapter(
            &config,
            Path::new("/cfg"),
            &universe,
            &["XPT=plat.csv".into()],
        )
        .unwrap();

        assert_eq!(adapter.csv_path("XAU"), PathBuf::from("/cfg/bars/XAU.csv"));
        assert_eq!(adapter.csv_path("XAG"), PathBuf::from("/abs/silver.csv"));
        assert_eq!(adapter.csv_path("XPT"), PathBuf::from("plat.csv"));
    }

    #[test]
    fn data_adapter_rejects_unknown_input_code() {
        let config = make_config("[backtest]\ninstruments = XAU\n");
        let universe = build_universe(&config).unwrap();
        let err = build_data_adapter(&config, Path::new("."), &universe, &["XPD=p.csv".into()])
            .unwrap_err();
        assert!(matches!(err, BacktestError::ConfigInvalid { key, .. } if key == "input"));
    }

    #[test]
    fn data_adapter_rejects_bad_strict_flag() {
        let config = make_config("[data]\nstrict = sometimes\n[backtest]\ninstruments = XAU\n");
        let universe = build_universe(&config).unwrap();
        let err = build_data_adapter(&config, Path::new("."), &universe, &[]).unwrap_err();
        assert!(matches!(err, BacktestError::ConfigInvalid { key, .. } if key == "strict"));
    }

    #[test]
    fn config_dir_of_bare_file_is_current_dir() {
        assert_eq!(config_dir(Path::new("run.ini")), PathBuf::from("."));
        assert_eq!(config_dir(Path::new("/etc/run.ini")), PathBuf::from("/etc"));
    }
}
