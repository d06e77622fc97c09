use crate::config::MapConfig;
use crate::format::localized;
use crate::types::{EnrichedFeature, Year};
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, JsonValue};
use serde::Serialize;

/// Leaflet path options applied uniformly to every province.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapStyle {
    pub fill_color: String,
    pub color: String,
    pub weight: u8,
    pub fill_opacity: f64,
}

impl From<&MapConfig> for MapStyle {
    fn from(config: &MapConfig) -> Self {
        Self {
            fill_color: config.fill_color.clone(),
            color: config.line_color.clone(),
            weight: config.line_weight,
            fill_opacity: config.fill_opacity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TooltipRow {
    pub label: String,
    pub value: String,
}

/// Everything the front end needs to draw the choropleth.
///
/// `year` is `None` for the plain boundary map.
#[derive(Debug, Clone, Serialize)]
pub struct MapView {
    pub year: Option<Year>,
    pub center: [f64; 2],
    pub zoom: u8,
    pub style: MapStyle,
    pub data: FeatureCollection,
}

pub fn map_view(config: &MapConfig, year: Option<Year>, features: &[EnrichedFeature]) -> MapView {
    MapView {
        year,
        center: config.center,
        zoom: config.zoom,
        style: MapStyle::from(config),
        data: feature_collection(features),
    }
}

/// Plain boundary map, centred on the whole country.
pub fn boundary_view(config: &MapConfig, features: &[EnrichedFeature]) -> MapView {
    MapView { center: config.overview_center, ..map_view(config, None, features) }
}

/// Province name followed by one localized row per enriched percentage.
pub fn tooltip_rows(feature: &EnrichedFeature) -> Vec<TooltipRow> {
    let mut rows = vec![TooltipRow {
        label: "Provincia".to_string(),
        value: feature.shape.name.clone(),
    }];
    if let Some(enrichment) = &feature.enrichment {
        rows.extend(enrichment.percentages.iter().map(|(nationality, pct)| TooltipRow {
            label: format!("% {}:", nationality.label()),
            value: localized(*pct),
        }));
    }
    rows
}

pub fn feature_collection(features: &[EnrichedFeature]) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features: features.iter().map(to_feature).collect(),
        foreign_members: None,
    }
}

fn to_feature(feature: &EnrichedFeature) -> Feature {
    let mut properties = JsonObject::new();
    properties.insert("nombre".to_string(), JsonValue::from(feature.shape.name.clone()));
    if let Some(enrichment) = &feature.enrichment {
        for (nationality, pct) in &enrichment.percentages {
            properties.insert(nationality.percentage_column(), JsonValue::from(*pct));
        }
    }
    let tooltip = serde_json::to_value(tooltip_rows(feature)).unwrap_or(JsonValue::Null);
    properties.insert("tooltip".to_string(), tooltip);

    Feature {
        bbox: None,
        geometry: Some(Geometry::new(geojson::Value::from(&feature.shape.geometry))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Enrichment, Nationality, ProvinceShape};
    use geo::{MultiPolygon, polygon};

    fn feature(name: &str, enrichment: Option<Enrichment>) -> EnrichedFeature {
        let p = polygon![(x: -65.0, y: -24.0), (x: -64.0, y: -24.0), (x: -64.0, y: -23.0)];
        EnrichedFeature {
            shape: ProvinceShape { name: name.to_string(), geometry: MultiPolygon::new(vec![p]) },
            enrichment,
        }
    }

    #[test]
    fn style_matches_config() {
        let style = MapStyle::from(&MapConfig::default());
        let json = serde_json::to_value(&style).unwrap();
        assert_eq!(json["fillColor"], "#ff1493");
        assert_eq!(json["color"], "black");
        assert_eq!(json["weight"], 1);
        assert_eq!(json["fillOpacity"], 0.4);
    }

    #[test]
    fn tooltip_lists_percentages_in_spanish() {
        let e = Enrichment {
            percentages: vec![(Nationality::Bolivia, 12.5), (Nationality::Peru, 3.0)],
        };
        let rows = tooltip_rows(&feature("Jujuy", Some(e)));
        assert_eq!(rows[0], TooltipRow { label: "Provincia".into(), value: "Jujuy".into() });
        assert_eq!(rows[1], TooltipRow { label: "% Bolivia:".into(), value: "12,5".into() });
        assert_eq!(rows[2].label, "% Perú:");
    }

    #[test]
    fn unenriched_feature_keeps_only_name() {
        let fc = feature_collection(&[feature("Jujuy", None)]);
        let props = fc.features[0].properties.as_ref().unwrap();
        assert_eq!(props.len(), 2);
        assert_eq!(props["nombre"], "Jujuy");
        assert_eq!(props["tooltip"].as_array().unwrap().len(), 1);
        assert!(fc.features[0].geometry.is_some());
    }

    #[test]
    fn enriched_feature_exposes_numeric_fields() {
        let e = Enrichment { percentages: vec![(Nationality::Otros, 20.0)] };
        let fc = feature_collection(&[feature("Jujuy", Some(e))]);
        let props = fc.features[0].properties.as_ref().unwrap();
        assert_eq!(props["porcentaje_Otros"], 20.0);
    }

    #[test]
    fn boundary_view_uses_overview_center() {
        let config = MapConfig::default();
        let view = boundary_view(&config, &[feature("Jujuy", None)]);
        assert_eq!(view.center, [-38.4161, -63.6167]);
        assert!(view.year.is_none());
        assert_eq!(map_view(&config, None, &[]).center, [-40.4161, -63.6167]);
    }

    #[test]
    fn map_view_serializes_center_and_year() {
        let view = map_view(&MapConfig::default(), Some(Year::new(2020).unwrap()), &[]);
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["year"], 2020);
        assert_eq!(json["zoom"], 4);
        assert_eq!(json["data"]["type"], "FeatureCollection");
    }
}
