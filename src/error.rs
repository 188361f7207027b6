use std::path::PathBuf;

use era_types::{CalendarStream, DynastyId};
use thiserror::Error;

/// Failures that stop a run: unreadable or inconsistent reference data.
///
/// Mismatches while solving a date are never errors; they travel as
/// [`era_types::Diagnostic`] values on the output rows.
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("missing reference table: {0}")]
    MissingTable(PathBuf),
    #[error("dynasty {0} is part of itself through its parents")]
    DynastyCycle(DynastyId),
    #[error("dynasty {dynasty} names unknown parent {parent}")]
    UnknownParent { dynasty: DynastyId, parent: DynastyId },
    #[error(
        "duplicate lunation: stream {stream}, year {year}, month {month}, intercalary {intercalary}"
    )]
    DuplicateLunation {
        stream: CalendarStream,
        year: i32,
        month: u8,
        intercalary: bool,
    },
}

pub type Result<T> = std::result::Result<T, ResolveError>;
