pub mod aggregate;
pub mod calendar;
pub mod coerce;
pub mod config;
pub mod error;
pub mod io;
pub mod job;
pub mod ledger;
pub mod logging;
pub mod model;
pub mod schedule;

pub use error::{Result, TallyError};
