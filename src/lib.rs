//! Core library for the group-tally command line application.
//!
//! A run pulls a fixed block of rows from a shared spreadsheet, sums two
//! metrics per fixed-size group and appends the sums to a daily workbook; at
//! month end the daily workbooks are folded into per-(group, member) totals.
//! Remote and local spreadsheet access lives under [`tally::io`], the pure
//! steps in [`tally::coerce`] and [`tally::aggregate`], persistence in
//! [`tally::ledger`], and the orchestration in [`tally::job`].

pub mod tally;

pub use tally::{
    Result, TallyError, aggregate, calendar, coerce, config, error, io, job, ledger, logging,
    model, schedule,
};
