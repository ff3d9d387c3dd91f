use polars::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PopulationRecord {
    pub year: i32,
    pub population: f64,
    /// `None` on the first row.
    pub abs_change: Option<f64>,
    /// `None` on the first row or when the previous year is zero.
    pub pct_change: Option<f64>,
}

/// Year-indexed table, ascending and unique by year.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PopulationTable {
    records: Vec<PopulationRecord>,
}

impl PopulationTable {
    pub(crate) fn new(records: Vec<PopulationRecord>) -> Self {
        PopulationTable { records }
    }

    pub fn records(&self) -> &[PopulationRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn first(&self) -> Option<&PopulationRecord> {
        self.records.first()
    }

    pub fn last(&self) -> Option<&PopulationRecord> {
        self.records.last()
    }

    pub fn years(&self) -> Vec<i32> {
        self.records.iter().map(|r| r.year).collect()
    }

    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let year: Vec<i32> = self.years();
        let population: Vec<f64> = self.records.iter().map(|r| r.population).collect();
        let abs_change: Vec<Option<f64>> = self.records.iter().map(|r| r.abs_change).collect();
        let pct_change: Vec<Option<f64>> = self.records.iter().map(|r| r.pct_change).collect();
        df!(
            "year" => year,
            "population" => population,
            "abs_change" => abs_change,
            "pct_change" => pct_change
        )
    }
}
