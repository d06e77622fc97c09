use crate::assets;
use crate::config::AppConfig;
use crate::data;
use crate::error::DataError;
use crate::processing;
use crate::types::Year;
use anyhow::Result;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct YearCheck {
    pub year: Year,
    pub rows: usize,
    pub duplicates: Vec<String>,
    /// Boundary provinces with no row for the year.
    pub unmatched: Vec<String>,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct CheckReport {
    pub years: Vec<YearCheck>,
    pub missing_years: Vec<Year>,
    pub missing_assets: Vec<PathBuf>,
}

impl CheckReport {
    /// Every year loads with unique provinces.
    pub fn is_clean(&self) -> bool {
        self.missing_years.is_empty() && self.years.iter().all(|y| y.duplicates.is_empty())
    }
}

/// Loads every year against the boundaries and lists absent assets.
///
/// Missing years are collected rather than aborting; any other failure aborts.
pub fn run(config: &AppConfig) -> Result<CheckReport> {
    let mut report = CheckReport::default();

    for year in Year::all() {
        let table = match data::load_year_stats(config, year) {
            Ok(table) => table,
            Err(err) if matches!(err.downcast_ref::<DataError>(), Some(DataError::ResourceNotFound(_))) => {
                warn!(year = year.value(), "{}", err);
                report.missing_years.push(year);
                continue;
            }
            Err(err) => return Err(err),
        };

        let shapes = data::load_boundaries(config)?;
        let (_, join) = processing::enrich(shapes, &table);
        report.years.push(YearCheck {
            year,
            rows: table.len(),
            duplicates: table.duplicate_provinces(),
            unmatched: join.unmatched,
        });
    }

    report.missing_assets = assets::missing_assets(&config.input.data_dir);
    info!(
        years = report.years.len(),
        missing_years = report.missing_years.len(),
        missing_assets = report.missing_assets.len(),
        "check complete"
    );

    Ok(report)
}
