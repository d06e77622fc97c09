use crate::data::StatsTable;
use crate::types::{EnrichedFeature, Enrichment, ProvinceShape, ProvinceYearStats, Schema};
use tracing::{debug, warn};

/// Names matched and missed by one join.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct JoinReport {
    pub matched: Vec<String>,
    /// Shapes with no row for the year (partial join).
    pub unmatched: Vec<String>,
}

/// Left join of shapes onto the year's rows by exact province name.
///
/// Each shape is kept; its enrichment is either the full field set for the
/// table's schema or absent.
pub fn enrich(shapes: Vec<ProvinceShape>, table: &StatsTable) -> (Vec<EnrichedFeature>, JoinReport) {
    let schema = table.year.schema();
    let mut report = JoinReport::default();

    let features = shapes
        .into_iter()
        .map(|shape| {
            let enrichment = table.find(&shape.name).and_then(|row| enrichment_for(row, schema));
            if enrichment.is_some() {
                report.matched.push(shape.name.clone());
            } else {
                report.unmatched.push(shape.name.clone());
            }
            EnrichedFeature { shape, enrichment }
        })
        .collect();

    if !report.unmatched.is_empty() {
        warn!(year = table.year.value(), unmatched = ?report.unmatched, "provinces without stats");
    }
    debug!(year = table.year.value(), matched = report.matched.len(), "join complete");

    (features, report)
}

/// Field set for `schema`, or `None` if the row cannot supply all of it.
pub fn enrichment_for(row: &ProvinceYearStats, schema: Schema) -> Option<Enrichment> {
    let percentages = schema
        .nationalities()
        .iter()
        .map(|&n| row.percentage(n).map(|p| (n, p)))
        .collect::<Option<Vec<_>>>()?;
    Some(Enrichment { percentages })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Nationality, Year};
    use geo::{MultiPolygon, polygon};

    fn shape(name: &str) -> ProvinceShape {
        let p = polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0)];
        ProvinceShape { name: name.to_string(), geometry: MultiPolygon::new(vec![p]) }
    }

    fn row(name: &str, venezuela: Option<f64>) -> ProvinceYearStats {
        ProvinceYearStats {
            provincia: name.to_string(),
            total_extranjeros: 100,
            bolivia: 40,
            paraguay: 30,
            peru: 10,
            venezuela: venezuela.map(|v| v as u64),
            otros: 20,
            porcentaje_bolivia: 40.0,
            porcentaje_paraguay: 30.0,
            porcentaje_peru: 10.0,
            porcentaje_venezuela: venezuela,
            porcentaje_otros: 20.0,
        }
    }

    #[test]
    fn unmatched_shapes_are_kept_unenriched() {
        let table = StatsTable { year: Year::new(2012).unwrap(), rows: vec![row("Salta", None)] };
        let (features, report) = enrich(vec![shape("Salta"), shape("Tucumán")], &table);

        assert_eq!(features.len(), 2);
        assert!(features[0].enrichment.is_some());
        assert!(features[1].enrichment.is_none());
        assert_eq!(report.unmatched, vec!["Tucumán".to_string()]);
    }

    #[test]
    fn match_is_accent_sensitive() {
        let table = StatsTable { year: Year::new(2012).unwrap(), rows: vec![row("Tucuman", None)] };
        let (features, _) = enrich(vec![shape("Tucumán")], &table);
        assert!(features[0].enrichment.is_none());
    }

    #[test]
    fn legacy_years_omit_venezuela() {
        let table = StatsTable { year: Year::new(2013).unwrap(), rows: vec![row("Salta", None)] };
        let (features, _) = enrich(vec![shape("Salta")], &table);
        let e = features[0].enrichment.as_ref().unwrap();
        assert_eq!(e.percentages.len(), 4);
        assert_eq!(e.get(Nationality::Venezuela), None);
        assert_eq!(e.get(Nationality::Otros), Some(20.0));
    }

    #[test]
    fn recent_years_carry_venezuela_apart_from_otros() {
        let table = StatsTable { year: Year::new(2019).unwrap(), rows: vec![row("Salta", Some(5.0))] };
        let (features, _) = enrich(vec![shape("Salta")], &table);
        let e = features[0].enrichment.as_ref().unwrap();
        assert_eq!(e.percentages.len(), 5);
        assert_eq!(e.get(Nationality::Venezuela), Some(5.0));
        assert_eq!(e.get(Nationality::Otros), Some(20.0));
    }

    #[test]
    fn incomplete_row_yields_no_partial_enrichment() {
        assert!(enrichment_for(&row("Salta", None), Schema::WithVenezuela).is_none());
    }
}
