//! Once-a-day trigger polled by the long-running `serve` loop.

use std::time::Duration;

use chrono::{Local, NaiveDateTime, NaiveTime, TimeDelta};
use tracing::info;

use crate::tally::error::{Result, TallyError};

/// Fires once per day at a fixed local time of day.
///
/// A trigger created after today's slot has passed first fires tomorrow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyTrigger {
    next_run: NaiveDateTime,
}

impl DailyTrigger {
    pub fn new(at: NaiveTime, now: NaiveDateTime) -> Self {
        let today = now.date().and_time(at);
        let next_run = if today > now {
            today
        } else {
            today + TimeDelta::days(1)
        };
        Self { next_run }
    }

    pub fn next_run(&self) -> NaiveDateTime {
        self.next_run
    }

    pub fn is_due(&self, now: NaiveDateTime) -> bool {
        now >= self.next_run
    }

    /// Moves the trigger to the first slot strictly after `now`.
    pub fn advance(&mut self, now: NaiveDateTime) {
        while self.next_run <= now {
            self.next_run += TimeDelta::days(1);
        }
    }
}

/// Parses an `HH:MM` (or `HH:MM:SS`) time of day.
pub fn parse_time_of_day(value: &str) -> Result<NaiveTime> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|_| TallyError::Configuration(format!("'{value}' is not an HH:MM time")))
}

/// Polls `trigger` forever, calling `job` with the local time whenever it is
/// due. Jobs run to completion before the next poll.
pub fn run_forever<F>(mut trigger: DailyTrigger, poll_interval: Duration, mut job: F) -> !
where
    F: FnMut(NaiveDateTime),
{
    info!(next_run = %trigger.next_run(), "scheduler started");
    loop {
        let now = Local::now().naive_local();
        if trigger.is_due(now) {
            job(now);
            let finished = Local::now().naive_local();
            trigger.advance(finished);
            info!(next_run = %trigger.next_run(), "next run scheduled");
        }
        std::thread::sleep(poll_interval.max(Duration::from_secs(1)));
    }
}
