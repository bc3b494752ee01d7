//! Day-level policy: weekends, and when the month-end fold runs.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// True on Saturday and Sunday (weekday index 5 and 6, Monday = 0).
pub fn is_weekend(date: NaiveDate) -> bool {
    date.weekday().num_days_from_monday() >= 5
}

/// True when `today` is a weekday and tomorrow falls in another month.
pub fn is_month_end(today: NaiveDate) -> bool {
    let next_month = match today.succ_opt() {
        Some(tomorrow) => tomorrow.month() != today.month(),
        None => true,
    };
    next_month && !is_weekend(today)
}

/// Decides whether a run folds the monthly ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonthEndPolicy {
    /// Fold on the last day of the month, when it is a weekday.
    #[default]
    Calendar,
    /// Fold on every run.
    Always,
    /// Never fold.
    Never,
}

impl MonthEndPolicy {
    pub fn applies(&self, today: NaiveDate) -> bool {
        match self {
            MonthEndPolicy::Calendar => is_month_end(today),
            MonthEndPolicy::Always => true,
            MonthEndPolicy::Never => false,
        }
    }
}
