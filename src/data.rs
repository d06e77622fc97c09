use crate::config::AppConfig;
use crate::error::DataError;
use crate::types::{ProvinceShape, ProvinceYearStats, Schema, Year};
use anyhow::{Context, Result, anyhow, bail};
use csv::{ReaderBuilder, StringRecord};
use geo::MultiPolygon;
use shapefile::Reader;
use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const STATS_DIR: &str = "extranjeros_por_provincia";
const STATS_COLUMN: &str = "provincia";

/// Rows of one year's CSV, in file order.
#[derive(Debug, Clone)]
pub struct StatsTable {
    pub year: Year,
    pub rows: Vec<ProvinceYearStats>,
}

impl StatsTable {
    /// First row whose province equals `name` exactly.
    pub fn find(&self, name: &str) -> Option<&ProvinceYearStats> {
        self.rows.iter().find(|row| row.provincia == name)
    }

    /// Province names appearing on more than one row.
    pub fn duplicate_provinces(&self) -> Vec<String> {
        let mut seen: HashMap<&str, usize> = HashMap::new();
        for row in &self.rows {
            *seen.entry(row.provincia.as_str()).or_default() += 1;
        }
        let mut dups: Vec<String> = seen
            .into_iter()
            .filter(|(_, n)| *n > 1)
            .map(|(name, _)| name.to_string())
            .collect();
        dups.sort();
        dups
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

pub fn stats_path(data_dir: &Path, year: Year) -> PathBuf {
    data_dir
        .join(STATS_DIR)
        .join(format!("porcentaje_extranjeros_por_provincia_{}.csv", year))
}

/// Reads the year's CSV. An absent file is a `DataError::ResourceNotFound`.
pub fn load_year_stats(config: &AppConfig, year: Year) -> Result<StatsTable> {
    let path = stats_path(&config.input.data_dir, year);
    if !path.is_file() {
        return Err(DataError::ResourceNotFound(path).into());
    }

    let file = File::open(&path)
        .with_context(|| format!("Failed to open CSV file: {:?}", path))?;
    let mut rdr = ReaderBuilder::new().from_reader(file);
    let headers = rdr.headers()?.clone();

    let join_col = &config.input.join_column_csv;
    if !headers.iter().any(|h| h == join_col) {
        bail!("Join column '{}' not found in {:?}", join_col, path);
    }
    if join_col != STATS_COLUMN {
        let renamed: StringRecord = headers
            .iter()
            .map(|h| if h == join_col { STATS_COLUMN } else { h })
            .collect();
        rdr.set_headers(renamed);
    }

    let schema = year.schema();
    let mut rows = Vec::new();
    for (line, result) in rdr.deserialize::<ProvinceYearStats>().enumerate() {
        let mut row = result
            .with_context(|| format!("Malformed row {} in {:?}", line + 1, path))?;
        match schema {
            Schema::Legacy => {
                row.venezuela = None;
                row.porcentaje_venezuela = None;
            }
            Schema::WithVenezuela => {
                if row.venezuela.is_none() || row.porcentaje_venezuela.is_none() {
                    bail!(
                        "Row for '{}' in {:?} lacks Venezuela columns required since 2014",
                        row.provincia,
                        path
                    );
                }
            }
        }
        rows.push(row);
    }

    let table = StatsTable { year, rows };
    let dups = table.duplicate_provinces();
    if !dups.is_empty() {
        warn!(year = year.value(), ?dups, "duplicate provinces, first row wins");
    }
    debug!(year = year.value(), rows = table.len(), "loaded province stats");

    Ok(table)
}

/// Loads province boundaries from GeoJSON or Shapefile, keyed by the configured name property.
pub fn load_boundaries(config: &AppConfig) -> Result<Vec<ProvinceShape>> {
    let path = config.boundaries_path();
    let extension = path.extension()
        .and_then(|e| e.to_str())
        .map(|s: &str| s.to_lowercase())
        .ok_or_else(|| anyhow!("Boundary file has no extension: {:?}", path))?;

    let shapes = match extension.as_str() {
        "shp" => load_shapefile(&path, &config.input.join_column_shape)?,
        "json" | "geojson" => load_geojson(&path, &config.input.join_column_shape)?,
        _ => return Err(anyhow!("Unsupported geometry format: {}", extension)),
    };

    debug!(count = shapes.len(), ?path, "loaded province boundaries");
    Ok(shapes)
}

fn load_shapefile(path: &Path, name_column: &str) -> Result<Vec<ProvinceShape>> {
    let mut reader = Reader::from_path(path)
        .with_context(|| format!("Failed to open Shapefile: {:?}", path))?;

    let mut shapes = Vec::new();

    for result in reader.iter_shapes_and_records() {
        let (shape, record) = result?;

        let name_value = record.get(name_column)
            .ok_or_else(|| anyhow!("Name column '{}' not found in Shapefile", name_column))?;

        let name = match name_value {
            shapefile::dbase::FieldValue::Character(Some(s)) => s.trim().to_string(),
            shapefile::dbase::FieldValue::Character(None) => continue,
            _ => return Err(anyhow!("Shapefile name column must be a string")),
        };

        let geometry: MultiPolygon<f64> = match shape {
            shapefile::Shape::Polygon(polygon) => polygon.try_into()
                .map_err(|e| anyhow!("Failed to convert polygon: {:?}", e))?,
            shapefile::Shape::PolygonM(polygon) => polygon.try_into()
                .map_err(|e| anyhow!("Failed to convert polygonM: {:?}", e))?,
            shapefile::Shape::PolygonZ(polygon) => polygon.try_into()
                .map_err(|e| anyhow!("Failed to convert polygonZ: {:?}", e))?,
            _ => continue,
        };

        shapes.push(ProvinceShape { name, geometry });
    }

    Ok(shapes)
}

fn load_geojson(path: &Path, name_property: &str) -> Result<Vec<ProvinceShape>> {
    use geojson::GeoJson;
    use std::io::BufReader;

    let file = File::open(path)
        .with_context(|| format!("Failed to open GeoJSON file: {:?}", path))?;
    let geojson = GeoJson::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse GeoJSON: {:?}", path))?;
    parse_boundaries(geojson, name_property)
}

/// Extracts named polygon features. Unnamed or non-polygon features are skipped.
pub fn parse_boundaries(geojson: geojson::GeoJson, name_property: &str) -> Result<Vec<ProvinceShape>> {
    use geojson::GeoJson;

    let collection = match geojson {
        GeoJson::FeatureCollection(fc) => fc,
        _ => return Err(anyhow!("Boundary GeoJSON must be a FeatureCollection")),
    };

    let mut shapes = Vec::new();

    for feature in collection.features {
        let name = match feature.properties.as_ref().and_then(|p| p.get(name_property)) {
            Some(serde_json::Value::String(s)) => s.clone(),
            _ => continue,
        };

        let geometry = match feature.geometry {
            Some(geom) => {
                let geo_geom: geo::Geometry<f64> = geom.value.try_into()
                    .map_err(|e| anyhow!("Failed to convert geometry of '{}': {:?}", name, e))?;
                match geo_geom {
                    geo::Geometry::MultiPolygon(mp) => mp,
                    geo::Geometry::Polygon(p) => MultiPolygon::new(vec![p]),
                    _ => continue,
                }
            }
            None => continue,
        };

        shapes.push(ProvinceShape { name, geometry });
    }

    Ok(shapes)
}
