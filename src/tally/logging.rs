use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::NaiveDate;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::tally::error::{Result, TallyError};

/// Log file opened for a process started on `date`, e.g. `Log_2025-01-20.txt`.
pub fn log_file_path(dir: &Path, date: NaiveDate) -> PathBuf {
    dir.join(format!("Log_{}.txt", date.format("%Y-%m-%d")))
}

/// Installs the process-wide subscriber: human-readable events on stderr and
/// an appended plain-text copy in the day's log file.
///
/// The filter honours `RUST_LOG` and defaults to `info`.
pub fn init(log_dir: &Path, today: NaiveDate) -> Result<PathBuf> {
    fs::create_dir_all(log_dir)?;
    let path = log_file_path(log_dir, today);
    let file = File::options().create(true).append(true).open(&path)?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        .try_init()
        .map_err(|error| TallyError::Logging(error.to_string()))?;

    Ok(path)
}
