use crate::data::StatsTable;
use crate::format::{percent, thousands};
use crate::session::{Selection, Session};
use crate::types::ProvinceYearStats;
use serde::Serialize;
use tracing::debug;

pub const DESCRIPTION: &str = "Este mapa muestra la distribución de nacionalidades extranjeras en \
cada provincia de Argentina para el año seleccionado. Al pasar el mouse sobre una provincia, se \
despliega información detallada con los porcentajes correspondientes a cada nacionalidad en ese \
territorio. Al hacer clic en una provincia, se especificarán los valores totales en relación con \
esos porcentajes.";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metric {
    pub label: &'static str,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentage: Option<String>,
}

impl Metric {
    /// `"Bolivia: 1,000"`
    pub fn line(&self) -> String {
        format!("{}: {}", self.label, self.value)
    }
}

/// Side panel next to the province map.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "estado", rename_all = "snake_case")]
pub enum Panel {
    /// No province clicked yet.
    Description { text: &'static str },
    Metrics { text: &'static str, heading: String, metrics: Vec<Metric> },
    /// Selected province has no row for this year; nothing to show.
    Stale { text: &'static str, provincia: String },
}

impl Panel {
    pub fn metrics(&self) -> &[Metric] {
        match self {
            Panel::Metrics { metrics, .. } => metrics,
            _ => &[],
        }
    }
}

pub fn build(session: &Session, table: &StatsTable) -> Panel {
    let province = match &session.selection {
        Selection::Unselected => return Panel::Description { text: DESCRIPTION },
        Selection::Selected(name) => name,
    };

    match table.find(province) {
        Some(row) => Panel::Metrics {
            text: DESCRIPTION,
            heading: format!("Datos para {} en el año {}", province, session.year),
            metrics: metrics_for(row),
        },
        None => {
            debug!(provincia = %province, year = session.year.value(), "stale selection");
            Panel::Stale { text: DESCRIPTION, provincia: province.clone() }
        }
    }
}

fn metrics_for(row: &ProvinceYearStats) -> Vec<Metric> {
    let mut metrics = vec![Metric {
        label: "Total Extranjeros",
        value: thousands(row.total_extranjeros),
        percentage: None,
    }];

    let mut push = |label, count, pct| {
        metrics.push(Metric { label, value: thousands(count), percentage: Some(percent(pct)) });
    };
    push("Bolivia", row.bolivia, row.porcentaje_bolivia);
    push("Paraguay", row.paraguay, row.porcentaje_paraguay);
    push("Perú", row.peru, row.porcentaje_peru);
    if let (Some(count), Some(pct)) = (row.venezuela, row.porcentaje_venezuela) {
        push("Venezuela", count, pct);
    }
    push("Otros", row.otros, row.porcentaje_otros);

    metrics
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Year;

    fn table(year: u16, venezuela: Option<u64>) -> StatsTable {
        StatsTable {
            year: Year::new(year).unwrap(),
            rows: vec![ProvinceYearStats {
                provincia: "Córdoba".to_string(),
                total_extranjeros: 5000,
                bolivia: 1000,
                paraguay: 1500,
                peru: 500,
                venezuela,
                otros: 1200,
                porcentaje_bolivia: 20.0,
                porcentaje_paraguay: 30.0,
                porcentaje_peru: 10.0,
                porcentaje_venezuela: venezuela.map(|_| 16.0),
                porcentaje_otros: 24.0,
            }],
        }
    }

    #[test]
    fn unselected_shows_description_only() {
        let session = Session::new(Year::new(2020).unwrap());
        assert_eq!(build(&session, &table(2020, Some(800))), Panel::Description { text: DESCRIPTION });
    }

    #[test]
    fn cordoba_2020_metrics() {
        let session = Session::from_parts(Year::new(2020).unwrap(), Some("Córdoba"));
        let panel = build(&session, &table(2020, Some(800)));
        let metrics = panel.metrics();

        assert_eq!(metrics[0].line(), "Total Extranjeros: 5,000");
        assert_eq!(metrics[1].line(), "Bolivia: 1,000");
        assert_eq!(metrics[1].percentage.as_deref(), Some("20.0 %"));
        let labels: Vec<_> = metrics.iter().map(|m| m.label).collect();
        assert_eq!(labels, ["Total Extranjeros", "Bolivia", "Paraguay", "Perú", "Venezuela", "Otros"]);
        match panel {
            Panel::Metrics { heading, .. } => assert_eq!(heading, "Datos para Córdoba en el año 2020"),
            other => panic!("unexpected panel {:?}", other),
        }
    }

    #[test]
    fn legacy_year_has_no_venezuela_metric() {
        let session = Session::from_parts(Year::new(2012).unwrap(), Some("Córdoba"));
        let panel = build(&session, &table(2012, None));
        assert!(panel.metrics().iter().all(|m| m.label != "Venezuela"));
        assert_eq!(panel.metrics().last().unwrap().label, "Otros");
    }

    #[test]
    fn stale_selection_is_empty_not_error() {
        let session = Session::from_parts(Year::new(2020).unwrap(), Some("Atlántida"));
        let panel = build(&session, &table(2020, Some(800)));
        assert!(panel.metrics().is_empty());
        assert!(matches!(panel, Panel::Stale { .. }));
    }

    #[test]
    fn padded_name_agrees_with_map_join() {
        use crate::processing::enrich;
        use crate::types::ProvinceShape;
        use geo::{MultiPolygon, polygon};

        let table = table(2020, Some(800));
        let p = polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0)];
        let shape = ProvinceShape { name: "Córdoba ".to_string(), geometry: MultiPolygon::new(vec![p]) };
        let (features, _) = enrich(vec![shape], &table);
        assert!(features[0].enrichment.is_none());

        let session = Session::from_parts(Year::new(2020).unwrap(), Some("Córdoba "));
        let panel = build(&session, &table);
        assert!(matches!(panel, Panel::Stale { ref provincia, .. } if provincia == "Córdoba "));
    }
}
