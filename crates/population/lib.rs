//! Lithuania's yearly population, loaded from a Eurostat SDMX-CSV extract.
//!
//! The pipeline runs once, in order: [`loader`] reads and filters the raw
//! observations, [`change::add_change_columns`] derives the year-over-year
//! columns, and [`summary::Summary`] reduces the table to three statistics.

pub mod change;
pub mod loader;
pub mod summary;
pub mod table;

pub use change::add_change_columns;
pub use loader::{load_from_reader, load_lithuania_population, Selection, YearValue};
pub use summary::{format_thousands, Summary, WorstYear};
pub use table::{PopulationRecord, PopulationTable};

use polars::prelude::PolarsError;
use std::io;
use std::path::PathBuf;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("cannot open {path:?}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error(transparent)]
    Polars(#[from] PolarsError),
    #[error("missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
    #[error("no rows left after filtering to {geo} / {sex} / {age} for {first_year}-{last_year}")]
    EmptySelection {
        geo: String,
        sex: String,
        age: String,
        first_year: i32,
        last_year: i32,
    },
    #[error("population table is empty")]
    EmptyTable,
}

pub type Result<T> = std::result::Result<T, Error>;
