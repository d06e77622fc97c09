use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::fs;
use anyhow::{Context, Result};

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub input: InputConfig,
    #[serde(default)]
    pub map: MapConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InputConfig {
    /// Root of the pre-baked CSV/PNG assets.
    pub data_dir: PathBuf,
    /// Province boundaries, GeoJSON or Shapefile. Relative paths resolve against `data_dir`.
    pub boundaries: PathBuf,
    #[serde(default = "default_join_column_shape")]
    pub join_column_shape: String,
    #[serde(default = "default_join_column_csv")]
    pub join_column_csv: String,
}

fn default_join_column_shape() -> String {
    "nombre".to_string()
}

fn default_join_column_csv() -> String {
    "provincia".to_string()
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct MapConfig {
    /// Centre of the province-statistics map.
    pub center: [f64; 2],
    /// Centre of the plain boundary map on the preferences page.
    #[serde(default = "default_overview_center")]
    pub overview_center: [f64; 2],
    pub zoom: u8,
    pub fill_color: String,
    pub line_color: String,
    pub line_weight: u8,
    pub fill_opacity: f64,
}

fn default_overview_center() -> [f64; 2] {
    [-38.4161, -63.6167]
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            center: [-40.4161, -63.6167],
            overview_center: default_overview_center(),
            zoom: 4,
            fill_color: "#ff1493".to_string(),
            line_color: "black".to_string(),
            line_weight: 1,
            fill_opacity: 0.4,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: [u8; 4],
    pub port: u16,
}

fn default_host() -> [u8; 4] {
    [127, 0, 0, 1]
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(content)
            .with_context(|| "Failed to parse TOML configuration")?;
        Ok(config)
    }

    pub fn boundaries_path(&self) -> PathBuf {
        if self.input.boundaries.is_absolute() {
            self.input.boundaries.clone()
        } else {
            self.input.data_dir.join(&self.input.boundaries)
        }
    }
}
