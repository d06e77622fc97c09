use crate::error::DataError;
use geo::MultiPolygon;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const FIRST_YEAR: u16 = 2011;
pub const LAST_YEAR: u16 = 2023;
/// First year in which Venezuela is reported as its own column.
pub const VENEZUELA_FROM: u16 = 2014;

/// A school year with published statistics (2011..=2023).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct Year(u16);

impl Year {
    pub fn new(value: u16) -> Result<Self, DataError> {
        if (FIRST_YEAR..=LAST_YEAR).contains(&value) {
            Ok(Year(value))
        } else {
            Err(DataError::InvalidYear(value))
        }
    }

    pub fn value(self) -> u16 {
        self.0
    }

    pub fn all() -> impl Iterator<Item = Year> {
        (FIRST_YEAR..=LAST_YEAR).map(Year)
    }

    /// First option of every year selector.
    pub fn first() -> Self {
        Year(FIRST_YEAR)
    }

    pub fn schema(self) -> Schema {
        if self.0 >= VENEZUELA_FROM {
            Schema::WithVenezuela
        } else {
            Schema::Legacy
        }
    }
}

impl TryFrom<u16> for Year {
    type Error = DataError;
    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Year::new(value)
    }
}

impl From<Year> for u16 {
    fn from(year: Year) -> u16 {
        year.0
    }
}

impl fmt::Display for Year {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Column layout of a year's CSV.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schema {
    /// Venezuela folded into "Otros".
    Legacy,
    WithVenezuela,
}

impl Schema {
    pub fn nationalities(self) -> &'static [Nationality] {
        match self {
            Schema::Legacy => &[
                Nationality::Bolivia,
                Nationality::Paraguay,
                Nationality::Peru,
                Nationality::Otros,
            ],
            Schema::WithVenezuela => &[
                Nationality::Bolivia,
                Nationality::Paraguay,
                Nationality::Peru,
                Nationality::Venezuela,
                Nationality::Otros,
            ],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Nationality {
    Bolivia,
    Paraguay,
    #[serde(rename = "Perú")]
    Peru,
    Venezuela,
    Otros,
}

impl Nationality {
    /// Column header used in the CSV files for the count.
    pub fn label(self) -> &'static str {
        match self {
            Nationality::Bolivia => "Bolivia",
            Nationality::Paraguay => "Paraguay",
            Nationality::Peru => "Perú",
            Nationality::Venezuela => "Venezuela",
            Nationality::Otros => "Otros",
        }
    }

    pub fn percentage_column(self) -> String {
        format!("porcentaje_{}", self.label())
    }
}

/// A province boundary, keyed by name.
#[derive(Debug, Clone)]
pub struct ProvinceShape {
    pub name: String,
    pub geometry: MultiPolygon<f64>,
}

/// One row of `porcentaje_extranjeros_por_provincia_<year>.csv`.
///
/// `venezuela` and `porcentaje_venezuela` are `None` for legacy years.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProvinceYearStats {
    pub provincia: String,
    pub total_extranjeros: u64,
    #[serde(rename = "Bolivia")]
    pub bolivia: u64,
    #[serde(rename = "Paraguay")]
    pub paraguay: u64,
    #[serde(rename = "Perú")]
    pub peru: u64,
    #[serde(rename = "Venezuela", default)]
    pub venezuela: Option<u64>,
    #[serde(rename = "Otros")]
    pub otros: u64,
    #[serde(rename = "porcentaje_Bolivia")]
    pub porcentaje_bolivia: f64,
    #[serde(rename = "porcentaje_Paraguay")]
    pub porcentaje_paraguay: f64,
    #[serde(rename = "porcentaje_Perú")]
    pub porcentaje_peru: f64,
    #[serde(rename = "porcentaje_Venezuela", default)]
    pub porcentaje_venezuela: Option<f64>,
    #[serde(rename = "porcentaje_Otros")]
    pub porcentaje_otros: f64,
}

impl ProvinceYearStats {
    pub fn count(&self, nationality: Nationality) -> Option<u64> {
        match nationality {
            Nationality::Bolivia => Some(self.bolivia),
            Nationality::Paraguay => Some(self.paraguay),
            Nationality::Peru => Some(self.peru),
            Nationality::Venezuela => self.venezuela,
            Nationality::Otros => Some(self.otros),
        }
    }

    pub fn percentage(&self, nationality: Nationality) -> Option<f64> {
        match nationality {
            Nationality::Bolivia => Some(self.porcentaje_bolivia),
            Nationality::Paraguay => Some(self.porcentaje_paraguay),
            Nationality::Peru => Some(self.porcentaje_peru),
            Nationality::Venezuela => self.porcentaje_venezuela,
            Nationality::Otros => Some(self.porcentaje_otros),
        }
    }
}

/// Percentages copied from a matched row, in schema order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Enrichment {
    pub percentages: Vec<(Nationality, f64)>,
}

impl Enrichment {
    pub fn get(&self, nationality: Nationality) -> Option<f64> {
        self.percentages
            .iter()
            .find(|(n, _)| *n == nationality)
            .map(|(_, p)| *p)
    }
}

/// A shape together with its enrichment, `None` when the join found no row.
#[derive(Debug, Clone)]
pub struct EnrichedFeature {
    pub shape: ProvinceShape,
    pub enrichment: Option<Enrichment>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn year_range_is_enforced() {
        assert!(Year::new(2010).is_err());
        assert!(Year::new(2011).is_ok());
        assert!(Year::new(2023).is_ok());
        assert!(Year::new(2024).is_err());
        assert_eq!(Year::all().count(), 13);
    }

    #[test]
    fn schema_switches_at_2014() {
        assert_eq!(Year::new(2013).unwrap().schema(), Schema::Legacy);
        assert_eq!(Year::new(2014).unwrap().schema(), Schema::WithVenezuela);
        assert!(!Schema::Legacy.nationalities().contains(&Nationality::Venezuela));
        assert_eq!(Schema::WithVenezuela.nationalities().len(), 5);
    }

    #[test]
    fn percentage_column_keeps_accent() {
        assert_eq!(Nationality::Peru.percentage_column(), "porcentaje_Perú");
    }
}
