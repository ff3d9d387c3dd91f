use crate::{Error, Result};
use log::{debug, info, warn};
use polars::io::mmap::MmapBytesReader;
use polars::prelude::*;
use std::fs::File;
use std::path::Path;

/// Eurostat column -> name used from here on.
const RENAME_MAP: [(&str, &str); 2] = [("TIME_PERIOD", "year"), ("OBS_VALUE", "population")];
const REQUIRED_COLUMNS: [&str; 5] = ["TIME_PERIOD", "OBS_VALUE", "geo", "sex", "age"];

/// Which slice of the extract counts as "Lithuania, total population".
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub geo: Vec<String>,
    pub sex: Vec<String>,
    pub age: Vec<String>,
    pub first_year: i32,
    pub last_year: i32,
}

impl Default for Selection {
    fn default() -> Self {
        Selection {
            geo: vec!["LT".to_string(), "Lithuania".to_string()],
            sex: vec!["T".to_string(), "Total".to_string()],
            age: vec!["TOTAL".to_string(), "Total".to_string()],
            first_year: 1990,
            last_year: 2024,
        }
    }
}

impl Selection {
    fn filter_expr(&self) -> Expr {
        any_of("geo", &self.geo)
            .and(any_of("sex", &self.sex))
            .and(any_of("age", &self.age))
            .and(col("year").gt_eq(lit(self.first_year)))
            .and(col("year").lt_eq(lit(self.last_year)))
            .and(col("population").is_not_null())
    }

    pub fn period(&self) -> (i32, i32) {
        (self.first_year, self.last_year)
    }

    fn empty_error(&self) -> Error {
        Error::EmptySelection {
            geo: self.geo.join("|"),
            sex: self.sex.join("|"),
            age: self.age.join("|"),
            first_year: self.first_year,
            last_year: self.last_year,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YearValue {
    pub year: i32,
    pub population: f64,
}

fn any_of(column: &str, labels: &[String]) -> Expr {
    labels
        .iter()
        .fold(lit(false), |acc, label| acc.or(col(column).eq(lit(label.as_str()))))
}

/// Text cell to `Float64`, ignoring surrounding whitespace; anything unparseable becomes null.
fn numeric(column: &str) -> Expr {
    col(column)
        .str()
        .strip_chars(lit(NULL))
        .cast(DataType::Float64)
}

fn check_columns(df: &DataFrame) -> Result<()> {
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|name| df.get_column_index(name).is_none())
        .map(|name| name.to_string())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(Error::MissingColumns(missing))
    }
}

/// Load the selected series from an SDMX-CSV file.
pub fn load_lithuania_population<P: AsRef<Path>>(
    path: P,
    selection: &Selection,
) -> Result<Vec<YearValue>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    info!("loading population csv: {:?}", path);
    load_from_reader(file, selection)
}

/// Same as [`load_lithuania_population`] for any reader polars can scan.
///
/// Every column is read as text first; `year` and `population` are then
/// coerced to numbers and rows that fail the coercion are dropped. The result
/// is sorted by year with at most one entry per year.
pub fn load_from_reader<R: MmapBytesReader>(
    reader: R,
    selection: &Selection,
) -> Result<Vec<YearValue>> {
    let raw = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .into_reader_with_file_handle(reader)
        .finish()?;
    check_columns(&raw)?;
    let raw_rows = raw.height();

    let [(time_col, year_col), (value_col, population_col)] = RENAME_MAP;
    let df = raw
        .lazy()
        .select([
            numeric(time_col).cast(DataType::Int32).alias(year_col),
            numeric(value_col).alias(population_col),
            col("geo"),
            col("sex"),
            col("age"),
        ])
        .filter(selection.filter_expr())
        .select([col(year_col), col(population_col)])
        .collect()?;

    let years = df.column(year_col)?.i32()?;
    let values = df.column(population_col)?.f64()?;
    let mut observed: Vec<YearValue> = years
        .into_iter()
        .zip(values.into_iter())
        .filter_map(|pair| match pair {
            (Some(year), Some(population)) if population.is_finite() => {
                Some(YearValue { year, population })
            }
            _ => None,
        })
        .collect();
    // stable, so the first observation of a year stays in front
    observed.sort_by_key(|r| r.year);

    let mut rows: Vec<YearValue> = Vec::with_capacity(observed.len());
    for YearValue { year, population } in observed {
        if rows.last().is_some_and(|last| last.year == year) {
            warn!("duplicate observation for {}, keeping the first", year);
            continue;
        }
        rows.push(YearValue { year, population });
    }

    debug!(
        "raw rows: {}, kept: {}, dropped: {}",
        raw_rows,
        rows.len(),
        raw_rows - rows.len()
    );
    if rows.is_empty() {
        return Err(selection.empty_error());
    }
    info!(
        "loaded {} years ({}-{})",
        rows.len(),
        rows[0].year,
        rows[rows.len() - 1].year
    );
    Ok(rows)
}
