use crate::loader::YearValue;
use crate::table::{PopulationRecord, PopulationTable};

/// First-order differencing over rows already sorted by year.
pub fn add_change_columns(rows: Vec<YearValue>) -> PopulationTable {
    let mut previous: Option<f64> = None;
    let records = rows
        .into_iter()
        .map(|row| {
            let abs_change = previous.map(|p| row.population - p);
            let pct_change = match (abs_change, previous) {
                (Some(diff), Some(p)) if p != 0.0 => Some(diff / p * 100.0),
                _ => None,
            };
            previous = Some(row.population);
            PopulationRecord {
                year: row.year,
                population: row.population,
                abs_change,
                pct_change,
            }
        })
        .collect();
    PopulationTable::new(records)
}
