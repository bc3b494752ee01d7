use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;

use chrono::NaiveDate;
use tracing::{error, info, instrument, warn};

use crate::tally::aggregate::aggregate_groups;
use crate::tally::calendar::{MonthEndPolicy, is_weekend};
use crate::tally::coerce::coerce_window;
use crate::tally::config::Config;
use crate::tally::error::Result;
use crate::tally::io::sheets::{SheetSource, select_worksheet};
use crate::tally::ledger::{DailyLedger, MonthlyLedger, RerunPolicy};
use crate::tally::model::{AggregationRecord, GroupLayout, Month};

/// Result of one invocation of [`Job::run`].
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// Weekend; nothing was read or written.
    Skipped,
    Completed {
        worksheet: String,
        groups: usize,
        daily_path: PathBuf,
        monthly_path: Option<PathBuf>,
    },
}

/// One daily pull-aggregate-persist cycle.
#[derive(Debug, Clone)]
pub struct Job {
    export_dir: PathBuf,
    layout: GroupLayout,
    rerun_policy: RerunPolicy,
    month_end: MonthEndPolicy,
}

impl Job {
    pub fn new(config: &Config) -> Self {
        Self {
            export_dir: config.export_dir.clone(),
            layout: config.layout,
            rerun_policy: config.rerun_policy,
            month_end: config.month_end,
        }
    }

    pub fn with_month_end(mut self, policy: MonthEndPolicy) -> Self {
        self.month_end = policy;
        self
    }

    pub fn with_rerun_policy(mut self, policy: RerunPolicy) -> Self {
        self.rerun_policy = policy;
        self
    }

    /// Runs the job for `today`. Weekends are skipped without touching the
    /// source or the ledgers.
    #[instrument(level = "info", skip(self, source))]
    pub fn run(&self, today: NaiveDate, source: &mut dyn SheetSource) -> Result<RunOutcome> {
        if is_weekend(today) {
            info!("weekend, job skipped");
            return Ok(RunOutcome::Skipped);
        }

        info!("job started");
        self.layout.validate()?;
        let titles = source.worksheet_titles()?;
        let worksheet = select_worksheet(&titles, today)?;
        info!(%worksheet, "selected worksheet");

        let records = self.collect(today, source, &worksheet)?;

        let mut ledger = DailyLedger::open(&self.export_dir, today)?;
        let dropped = ledger.record(&records, self.rerun_policy);
        if dropped > 0 {
            warn!(dropped, "replaced rows left by an earlier run for the same date");
        }
        for record in &records {
            info!(
                group = record.group_id,
                member = %record.member_name,
                rows = %format!("{}-{}", record.start_row, record.end_row),
                metric_a = record.metric_a_sum,
                metric_b = record.metric_b_sum,
                "group totals"
            );
        }
        ledger.save()?;
        info!(path = %ledger.path().display(), "daily ledger saved");

        let monthly_path = if self.month_end.applies(today) {
            info!(policy = ?self.month_end, "month end, folding monthly ledger");
            let monthly = MonthlyLedger::fold(&self.export_dir, Month::of(today))?;
            Some(monthly.save(&self.export_dir)?)
        } else {
            None
        };

        info!("job finished");
        Ok(RunOutcome::Completed {
            worksheet,
            groups: records.len(),
            daily_path: ledger.path().to_path_buf(),
            monthly_path,
        })
    }

    /// Fetches the three configured columns of `worksheet` and sums them per
    /// group.
    pub fn collect(
        &self,
        today: NaiveDate,
        source: &mut dyn SheetSource,
        worksheet: &str,
    ) -> Result<Vec<AggregationRecord>> {
        let layout = &self.layout;
        let total = layout.total_rows();

        let raw_a = source.column_values(worksheet, layout.metric_a_column)?;
        let raw_b = source.column_values(worksheet, layout.metric_b_column)?;
        let members = source.column_values(worksheet, layout.member_column)?;

        let metric_a = coerce_window(&raw_a, layout.start_row, total);
        let metric_b = coerce_window(&raw_b, layout.start_row, total);

        Ok(aggregate_groups(today, layout, &metric_a, &metric_b, &members))
    }

    /// Runs the job and reports any failure, panics included, through the
    /// log instead of returning it. Used by the scheduler loop.
    pub fn run_logged(&self, today: NaiveDate, source: &mut dyn SheetSource) -> Option<RunOutcome> {
        match panic::catch_unwind(AssertUnwindSafe(|| self.run(today, source))) {
            Ok(Ok(outcome)) => Some(outcome),
            Ok(Err(failure)) => {
                error!(%today, error = %failure, details = ?failure, "job failed");
                None
            }
            Err(payload) => {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|text| text.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                error!(%today, panic = %message, "job panicked");
                None
            }
        }
    }
}
