use crate::table::PopulationTable;
use crate::{Error, Result};
use std::fmt;

const RULE: &str = "======================================";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorstYear {
    pub year: i32,
    pub abs_change: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub first_year: i32,
    pub last_year: i32,
    pub total_change: f64,
    /// mean of the defined percentage changes
    pub avg_pct_change: Option<f64>,
    /// smallest absolute change, earliest year on ties
    pub worst: Option<WorstYear>,
}

impl Summary {
    /// `period` is the (first, last) year named in the header.
    pub fn from_table(table: &PopulationTable, period: (i32, i32)) -> Result<Summary> {
        let (first, last) = match (table.first(), table.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Err(Error::EmptyTable),
        };

        let pct: Vec<f64> = table.records().iter().filter_map(|r| r.pct_change).collect();
        let avg_pct_change = if pct.is_empty() {
            None
        } else {
            Some(pct.iter().sum::<f64>() / pct.len() as f64)
        };

        let mut worst: Option<WorstYear> = None;
        for r in table.records() {
            let Some(abs_change) = r.abs_change else {
                continue;
            };
            if worst.map_or(true, |w| abs_change < w.abs_change) {
                worst = Some(WorstYear {
                    year: r.year,
                    abs_change,
                });
            }
        }

        Ok(Summary {
            first_year: period.0,
            last_year: period.1,
            total_change: last.population - first.population,
            avg_pct_change,
            worst,
        })
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", RULE)?;
        writeln!(
            f,
            "SUMMARY STATISTICS ({}–{})",
            self.first_year, self.last_year
        )?;
        writeln!(f, "{}", RULE)?;
        writeln!(
            f,
            "Total population change: {} people",
            format_thousands(self.total_change)
        )?;
        match self.avg_pct_change {
            Some(avg) => writeln!(f, "Average yearly % change: {:.3}%", avg)?,
            None => writeln!(f, "Average yearly % change: n/a")?,
        }
        match self.worst {
            Some(w) => writeln!(
                f,
                "Worst year of population loss: {} ({} people)",
                w.year,
                format_thousands(w.abs_change)
            )?,
            None => writeln!(f, "Worst year of population loss: n/a")?,
        }
        write!(f, "{}", RULE)
    }
}

/// Rounds to a whole number and groups digits by thousands: `-1234567.4` -> `-1,234,567`.
pub fn format_thousands(value: f64) -> String {
    let rounded = format!("{:.0}", value);
    let (sign, digits) = match rounded.strip_prefix('-') {
        Some(digits) => ("-", digits),
        None => ("", rounded.as_str()),
    };
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return rounded;
    }
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    grouped.push_str(sign);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}
