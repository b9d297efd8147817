use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use quantsim::data::CsvSource;
use quantsim::pipeline::{self, BatchReport, RunReport};
use quantsim::portfolio::CancellationToken;
use quantsim::store::{SqliteStore, Store};
use quantsim::Config;

#[derive(Parser)]
#[command(
    name = "quantsim",
    version,
    about = "Feature engineering and Monte Carlo portfolio simulation",
    propagate_version = true
)]
struct Cli {
    /// TOML configuration file. Built-in defaults when omitted.
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// SQLite database path (overrides config and QUANTSIM_DB).
    #[arg(long, global = true, value_name = "PATH")]
    db: Option<PathBuf>,

    /// Directory of <TICKER>.csv input files (overrides config and QUANTSIM_DATA_DIR).
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load raw bars for every configured ticker into the database.
    Ingest,
    /// Engineer features from stored raw bars.
    Transform,
    /// Simulate every portfolio over every horizon and store the runs.
    Simulate(SimulateArgs),
    /// Engineer features for a tree of CSV datasets without a database.
    Process {
        #[arg(long, value_name = "DIR")]
        input: PathBuf,
        #[arg(long, value_name = "DIR")]
        output: PathBuf,
    },
    /// Ingest, transform and simulate.
    Run(SimulateArgs),
    /// List stored simulation runs.
    Runs,
}

#[derive(Args, Clone)]
struct SimulateArgs {
    /// Override the number of trials.
    #[arg(long)]
    trials: Option<usize>,

    /// Override the random seed.
    #[arg(long)]
    seed: Option<u64>,

    /// Print run summaries as JSON.
    #[arg(long, default_value_t = false)]
    json: bool,
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => {
            let mut config = Config::default();
            config.apply_env();
            config
        }
    };
    if let Some(db) = &cli.db {
        config.database = db.clone();
    }
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    Ok(config)
}

fn open_store(config: &Config) -> Result<SqliteStore> {
    SqliteStore::open(&config.database).with_context(|| format!("opening {}", config.database.display()))
}

fn print_batch(stage: &str, report: &BatchReport) {
    for p in &report.processed {
        println!("{stage:<10} {:<24} {:>8} rows", p.name, p.rows);
    }
    for s in &report.skipped {
        println!("{stage:<10} {:<24} skipped: {}", s.name, s.error);
    }
}

fn print_runs(reports: &[RunReport], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(reports)?);
        return Ok(());
    }
    for r in reports {
        let s = &r.summary;
        println!(
            "run {:>4}  portfolio {:<8} {:>3}y  initial {:>12.2}  mean {:>14.2}  median {:>14.2}  \
             p5 {:>14.2}  p95 {:>14.2}  mean return {:>8.2}%",
            r.run.run_id,
            r.run.portfolio,
            r.run.horizon_years,
            r.initial_value,
            s.mean,
            s.median,
            s.p5,
            s.p95,
            s.mean_return
        );
    }
    Ok(())
}

fn ingest(store: &mut dyn Store, config: &Config) -> Result<BatchReport> {
    let source = CsvSource::new(&config.data_dir);
    let report = pipeline::ingest(
        store,
        &source,
        &config.tickers(),
        config.fetch.history_years,
        &config.retry_policy(),
    )?;
    print_batch("ingest", &report);
    Ok(report)
}

fn transform(store: &mut dyn Store, config: &Config) -> Result<BatchReport> {
    let report = pipeline::transform(store, &config.tickers())?;
    print_batch("transform", &report);
    Ok(report)
}

fn simulate(store: &mut dyn Store, config: &Config, args: &SimulateArgs) -> Result<()> {
    let mut config = config.clone();
    if let Some(trials) = args.trials {
        config.trials = trials;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    config.validate()?;

    let reports = pipeline::simulate(store, &config, &CancellationToken::new())?;
    if reports.is_empty() {
        bail!("no portfolio could be simulated; run ingest and transform first");
    }
    print_runs(&reports, args.json)
}

fn process(input: &Path, output: &Path) -> Result<()> {
    if !input.is_dir() {
        bail!("input directory {} does not exist", input.display());
    }
    let report = pipeline::process_csv_dir(input, output)?;
    print_batch("process", &report);
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    config.validate()?;

    match &cli.command {
        Commands::Ingest => {
            ingest(&mut open_store(&config)?, &config)?;
        }
        Commands::Transform => {
            transform(&mut open_store(&config)?, &config)?;
        }
        Commands::Simulate(args) => simulate(&mut open_store(&config)?, &config, args)?,
        Commands::Process { input, output } => process(input, output)?,
        Commands::Run(args) => {
            let mut store = open_store(&config)?;
            ingest(&mut store, &config)?;
            transform(&mut store, &config)?;
            simulate(&mut store, &config, args)?;
        }
        Commands::Runs => {
            let store = open_store(&config)?;
            for run in store.list_runs()? {
                println!(
                    "run {:>4}  portfolio {:<8} {:>3}y  {:>6} trials",
                    run.run_id, run.portfolio, run.horizon_years, run.n_trials
                );
            }
        }
    }

    info!(database = %config.database.display(), "done");
    Ok(())
}
