use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use group_tally::calendar::MonthEndPolicy;
use group_tally::config::Config;
use group_tally::io::sheets::{Credentials, GoogleSheetsSource, SheetSource, WorkbookSource};
use group_tally::job::{Job, RunOutcome};
use group_tally::ledger::MonthlyLedger;
use group_tally::model::Month;
use group_tally::schedule::{DailyTrigger, run_forever};
use group_tally::{Result, TallyError, logging};
use tracing::{error, info};

fn main() {
    let cli = Cli::parse();
    if let Err(error) = run(cli) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    let today = Local::now().date_naive();
    let log_path = logging::init(&config.log_dir, today)?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        log = %log_path.display(),
        "group-tally started"
    );

    match cli.command {
        Command::Run(args) => execute_run(&config, args, today),
        Command::Serve(args) => execute_serve(&config, args),
        Command::Fold(args) => execute_fold(&config, args, today),
    }
}

fn execute_run(config: &Config, args: RunArgs, today: NaiveDate) -> Result<()> {
    let date = args.date.unwrap_or(today);
    let mut job = Job::new(config);
    if let Some(kind) = args.month_end {
        job = job.with_month_end(kind.into());
    }
    let mut source = open_source(config, args.source)?;

    match job.run(date, source.as_mut()) {
        Ok(RunOutcome::Skipped) => Ok(()),
        Ok(RunOutcome::Completed {
            groups,
            daily_path,
            monthly_path,
            ..
        }) => {
            println!("{groups} groups written to {}", daily_path.display());
            if let Some(path) = monthly_path {
                println!("monthly totals written to {}", path.display());
            }
            Ok(())
        }
        Err(failure) => {
            error!(%date, error = %failure, "job failed");
            Err(failure)
        }
    }
}

fn execute_serve(config: &Config, args: ServeArgs) -> Result<()> {
    let job = Job::new(config);
    let mut source = open_source(config, args.source)?;
    let trigger = DailyTrigger::new(config.run_at()?, Local::now().naive_local());

    run_forever(trigger, config.poll_interval(), |now| {
        job.run_logged(now.date(), source.as_mut());
    })
}

fn execute_fold(config: &Config, args: FoldArgs, today: NaiveDate) -> Result<()> {
    let month = args.month.unwrap_or_else(|| Month::of(today));
    let ledger = MonthlyLedger::fold(&config.export_dir, month)?;
    let path = ledger.save(&config.export_dir)?;
    println!(
        "{} monthly records written to {}",
        ledger.records().len(),
        path.display()
    );
    Ok(())
}

fn open_source(config: &Config, local: Option<PathBuf>) -> Result<Box<dyn SheetSource>> {
    if let Some(path) = local {
        return Ok(Box::new(WorkbookSource::open(path)?));
    }
    if config.spreadsheet.trim().is_empty() {
        return Err(TallyError::Configuration(
            "no spreadsheet configured; set `spreadsheet` or pass --source".into(),
        ));
    }
    let credentials = Credentials::from_env(
        &config.credentials.token_env,
        &config.credentials.api_key_env,
    )?;
    Ok(Box::new(GoogleSheetsSource::new(
        &config.spreadsheet,
        credentials,
    )?))
}

fn parse_month(value: &str) -> std::result::Result<Month, String> {
    value.parse::<Month>().map_err(|error| error.to_string())
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Pull grouped daily totals from a shared spreadsheet and fold them monthly."
)]
struct Cli {
    /// JSON configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the daily job once.
    Run(RunArgs),
    /// Keep running and trigger the daily job at the configured time.
    Serve(ServeArgs),
    /// Rebuild the monthly ledger from the daily ledgers on disk.
    Fold(FoldArgs),
}

#[derive(clap::Args)]
struct RunArgs {
    /// Date to run for, YYYY-MM-DD. Defaults to today.
    #[arg(long)]
    date: Option<NaiveDate>,

    /// Read a local workbook instead of the remote spreadsheet.
    #[arg(long)]
    source: Option<PathBuf>,

    /// Override the configured month-end policy for this run.
    #[arg(long, value_enum)]
    month_end: Option<MonthEndKind>,
}

#[derive(clap::Args)]
struct ServeArgs {
    /// Read a local workbook instead of the remote spreadsheet.
    #[arg(long)]
    source: Option<PathBuf>,
}

#[derive(clap::Args)]
struct FoldArgs {
    /// Month to fold, YYYY-MM. Defaults to the current month.
    #[arg(long, value_parser = parse_month)]
    month: Option<Month>,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum MonthEndKind {
    Calendar,
    Always,
    Never,
}

impl From<MonthEndKind> for MonthEndPolicy {
    fn from(kind: MonthEndKind) -> Self {
        match kind {
            MonthEndKind::Calendar => MonthEndPolicy::Calendar,
            MonthEndKind::Always => MonthEndPolicy::Always,
            MonthEndKind::Never => MonthEndPolicy::Never,
        }
    }
}
