//! Pre-rendered resources addressed by typed selector tuples.

use crate::types::{VENEZUELA_FROM, Year};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Countries with their own distribution chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Country {
    Bolivia,
    Paraguay,
    #[serde(rename = "Perú")]
    Peru,
    Venezuela,
}

impl Country {
    pub const ALL: [Country; 4] = [Country::Bolivia, Country::Paraguay, Country::Peru, Country::Venezuela];

    pub fn name(self) -> &'static str {
        match self {
            Country::Bolivia => "Bolivia",
            Country::Paraguay => "Paraguay",
            Country::Peru => "Perú",
            Country::Venezuela => "Venezuela",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Inicial,
    Primario,
    Secundario,
}

impl Level {
    pub const ALL: [Level; 3] = [Level::Inicial, Level::Primario, Level::Secundario];

    fn slug(self) -> &'static str {
        match self {
            Level::Inicial => "inicial",
            Level::Primario => "primario",
            Level::Secundario => "secundario",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Level::Inicial => "Nivel inicial",
            Level::Primario => "Nivel primario",
            Level::Secundario => "Nivel secundario",
        }
    }
}

/// Which schools a chart aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchoolType {
    ConExtranjeros,
    SinExtranjeros,
    Totales,
}

impl SchoolType {
    pub const ALL: [SchoolType; 3] = [SchoolType::ConExtranjeros, SchoolType::SinExtranjeros, SchoolType::Totales];

    fn slug(self) -> &'static str {
        match self {
            SchoolType::ConExtranjeros => "con_extranjeros",
            SchoolType::SinExtranjeros => "sin_extranjeros",
            SchoolType::Totales => "totales",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SchoolType::ConExtranjeros => "Escuelas con alumnos extranjeros",
            SchoolType::SinExtranjeros => "Escuelas sin alumnos extranjeros",
            SchoolType::Totales => "Total de escuelas",
        }
    }
}

/// School infrastructure resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    Agua,
    Electricidad,
    Gas,
    Internet,
    Biblioteca,
    Computadoras,
}

impl Resource {
    pub const ALL: [Resource; 6] = [
        Resource::Agua,
        Resource::Electricidad,
        Resource::Gas,
        Resource::Internet,
        Resource::Biblioteca,
        Resource::Computadoras,
    ];

    fn slug(self) -> &'static str {
        match self {
            Resource::Agua => "agua",
            Resource::Electricidad => "electricidad",
            Resource::Gas => "gas",
            Resource::Internet => "internet",
            Resource::Biblioteca => "biblioteca",
            Resource::Computadoras => "computadoras",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Resource::Agua => "Agua de red",
            Resource::Electricidad => "Electricidad",
            Resource::Gas => "Gas",
            Resource::Internet => "Internet",
            Resource::Biblioteca => "Biblioteca",
            Resource::Computadoras => "Computadoras",
        }
    }
}

/// Every selector combination a page can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKey {
    Distribution { year: Year, country: Country },
    Infrastructure { year: Year, level: Level, school_type: SchoolType, resource: Resource },
    FoodBenefits { year: Year, level: Level, school_type: SchoolType },
    Sectors { year: Year, level: Level, school_type: SchoolType },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Asset {
    /// Path relative to the data directory.
    File(PathBuf),
    /// No data exists for the combination; the page shows this message.
    NoData(String),
}

impl AssetKey {
    pub fn resolve(self) -> Asset {
        match self {
            AssetKey::Distribution { year, country } => {
                if country == Country::Venezuela && year.value() < VENEZUELA_FROM {
                    return Asset::NoData(format!("Sin datos para el año {}", year));
                }
                Asset::File(
                    PathBuf::from("distribucion")
                        .join(year.to_string())
                        .join(format!("distribucion_{}_en_el_pais_{}.png", country.name(), year)),
                )
            }
            AssetKey::Infrastructure { year, level, school_type, resource } => Asset::File(
                PathBuf::from("infraestructura")
                    .join(year.to_string())
                    .join(level.slug())
                    .join(format!("{}_{}_{}.png", resource.slug(), school_type.slug(), year)),
            ),
            AssetKey::FoodBenefits { year, level, school_type } => Asset::File(
                PathBuf::from("beneficios")
                    .join(level.slug())
                    .join(format!("beneficios_{}_{}.csv", school_type.slug(), year)),
            ),
            AssetKey::Sectors { year, level, school_type } => Asset::File(
                PathBuf::from("sectores")
                    .join(level.slug())
                    .join(format!("sectores_{}_{}.csv", school_type.slug(), year)),
            ),
        }
    }

    /// Every key the dashboard can produce.
    pub fn all() -> Vec<AssetKey> {
        let mut keys = Vec::new();
        for year in Year::all() {
            for country in Country::ALL {
                keys.push(AssetKey::Distribution { year, country });
            }
            for level in Level::ALL {
                for school_type in SchoolType::ALL {
                    keys.push(AssetKey::FoodBenefits { year, level, school_type });
                    keys.push(AssetKey::Sectors { year, level, school_type });
                    for resource in Resource::ALL {
                        keys.push(AssetKey::Infrastructure { year, level, school_type, resource });
                    }
                }
            }
        }
        keys
    }
}

/// Table entries whose file is absent under `data_dir`.
pub fn missing_assets(data_dir: &Path) -> Vec<PathBuf> {
    AssetKey::all()
        .into_iter()
        .filter_map(|key| match key.resolve() {
            Asset::File(path) if !data_dir.join(&path).is_file() => Some(path),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn y(v: u16) -> Year {
        Year::new(v).unwrap()
    }

    #[test]
    fn distribution_path_follows_naming_convention() {
        let asset = AssetKey::Distribution { year: y(2018), country: Country::Peru }.resolve();
        assert_eq!(
            asset,
            Asset::File(PathBuf::from("distribucion/2018/distribucion_Perú_en_el_pais_2018.png"))
        );
    }

    #[test]
    fn venezuela_before_2014_has_no_data() {
        let asset = AssetKey::Distribution { year: y(2013), country: Country::Venezuela }.resolve();
        assert_eq!(asset, Asset::NoData("Sin datos para el año 2013".into()));
        let asset = AssetKey::Distribution { year: y(2014), country: Country::Venezuela }.resolve();
        assert!(matches!(asset, Asset::File(_)));
    }

    #[test]
    fn every_key_maps_to_a_distinct_path() {
        let keys = AssetKey::all();
        let paths: HashSet<PathBuf> = keys
            .iter()
            .filter_map(|k| match k.resolve() {
                Asset::File(p) => Some(p),
                Asset::NoData(_) => None,
            })
            .collect();
        // 3 Venezuela years without data
        assert_eq!(paths.len(), keys.len() - 3);
    }

    #[test]
    fn infrastructure_path() {
        let key = AssetKey::Infrastructure {
            year: y(2022),
            level: Level::Primario,
            school_type: SchoolType::SinExtranjeros,
            resource: Resource::Internet,
        };
        assert_eq!(
            key.resolve(),
            Asset::File(PathBuf::from("infraestructura/2022/primario/internet_sin_extranjeros_2022.png"))
        );
    }

    #[test]
    fn missing_assets_reports_absent_files() {
        let dir = tempfile::tempdir().unwrap();
        let before = missing_assets(dir.path()).len();
        let present = PathBuf::from("distribucion/2020/distribucion_Bolivia_en_el_pais_2020.png");
        std::fs::create_dir_all(dir.path().join(present.parent().unwrap())).unwrap();
        std::fs::write(dir.path().join(&present), b"png").unwrap();
        let after = missing_assets(dir.path());
        assert_eq!(after.len(), before - 1);
        assert!(!after.contains(&present));
    }
}
