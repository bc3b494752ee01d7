use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::tally::calendar::MonthEndPolicy;
use crate::tally::error::{Result, TallyError};
use crate::tally::ledger::RerunPolicy;
use crate::tally::model::GroupLayout;
use crate::tally::schedule::parse_time_of_day;

/// Runtime settings, read from a JSON document. Every field has a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Share link or bare id of the remote spreadsheet.
    pub spreadsheet: String,
    pub credentials: CredentialsConfig,
    /// Directory holding the daily and monthly workbooks.
    pub export_dir: PathBuf,
    /// Directory receiving the per-start log files.
    pub log_dir: PathBuf,
    pub layout: GroupLayout,
    /// Local time of day of the scheduled run, `HH:MM`.
    pub run_at: String,
    pub poll_interval_secs: u64,
    pub rerun_policy: RerunPolicy,
    pub month_end: MonthEndPolicy,
}

/// Names of the environment variables holding remote credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialsConfig {
    pub token_env: String,
    pub api_key_env: String,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            token_env: "GOOGLE_SHEETS_TOKEN".to_string(),
            api_key_env: "GOOGLE_SHEETS_API_KEY".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            spreadsheet: String::new(),
            credentials: CredentialsConfig::default(),
            export_dir: PathBuf::from("Export"),
            log_dir: PathBuf::from("Logger"),
            layout: GroupLayout::default(),
            run_at: "11:29".to_string(),
            poll_interval_secs: 30,
            rerun_policy: RerunPolicy::default(),
            month_end: MonthEndPolicy::default(),
        }
    }
}

impl Config {
    /// Reads and validates the configuration at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(TallyError::MissingInput(path.to_path_buf()));
        }
        let source = fs::read_to_string(path)?;
        Self::from_json(&source)
    }

    pub fn from_json(source: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.layout.validate()?;
        self.run_at()?;
        if self.poll_interval_secs == 0 {
            return Err(TallyError::Configuration(
                "poll_interval_secs must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn run_at(&self) -> Result<NaiveTime> {
        parse_time_of_day(&self.run_at)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}
