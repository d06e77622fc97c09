//! Menu routing and HTML for each dashboard page.

use crate::assets::{Asset, AssetKey, Country, Level, Resource, SchoolType};
use crate::config::AppConfig;
use crate::data;
use crate::panel::{self, Panel};
use crate::session::Session;
use crate::types::Year;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::fs::File;
use std::path::Path;

pub const APP_TITLE: &str = "Calidad de Escuelas en Argentina";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Page {
    Inicio,
    Distribucion,
    EstudiantesPorProvincia,
    Beneficios,
    Sectores,
    Preferencias,
    AnalisisPorAnio,
    Contacto,
}

impl Page {
    /// Menu order.
    pub const ALL: [Page; 8] = [
        Page::Inicio,
        Page::Distribucion,
        Page::EstudiantesPorProvincia,
        Page::Beneficios,
        Page::Sectores,
        Page::Preferencias,
        Page::AnalisisPorAnio,
        Page::Contacto,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Page::Inicio => "Inicio",
            Page::Distribucion => "Distribución de Nacionalidades Extranjeras en Argentina",
            Page::EstudiantesPorProvincia => "Estudiantes Extranjeros por Provincia",
            Page::Beneficios => "Beneficios Alimenticios",
            Page::Sectores => "Sectores Público y Privado",
            Page::Preferencias => "Preferencias por Provincia",
            Page::AnalisisPorAnio => "Análisis por Año",
            Page::Contacto => "Contacto",
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            Page::Inicio => "inicio",
            Page::Distribucion => "distribucion",
            Page::EstudiantesPorProvincia => "estudiantes-por-provincia",
            Page::Beneficios => "beneficios",
            Page::Sectores => "sectores",
            Page::Preferencias => "preferencias",
            Page::AnalisisPorAnio => "analisis-por-anio",
            Page::Contacto => "contacto",
        }
    }

    /// Unknown labels land on the home page.
    pub fn from_label(label: &str) -> Page {
        Page::ALL.into_iter().find(|p| p.label() == label).unwrap_or(Page::Inicio)
    }

    pub fn from_slug(slug: &str) -> Option<Page> {
        Page::ALL.into_iter().find(|p| p.slug() == slug)
    }

    pub fn href(self) -> String {
        format!("/pagina/{}", self.slug())
    }
}

/// Selector values carried in the query string. Missing values take page defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    pub anio: Option<u16>,
    pub provincia: Option<String>,
    pub nivel: Option<Level>,
    pub tipo: Option<SchoolType>,
    pub recurso: Option<Resource>,
}

impl PageQuery {
    pub fn year(&self) -> Result<Year> {
        match self.anio {
            Some(v) => Ok(Year::new(v)?),
            None => Ok(Year::first()),
        }
    }

    fn level(&self) -> Level {
        self.nivel.unwrap_or(Level::Primario)
    }

    fn school_type(&self) -> SchoolType {
        self.tipo.unwrap_or(SchoolType::Totales)
    }

    fn resource(&self) -> Resource {
        self.recurso.unwrap_or(Resource::Agua)
    }
}

pub fn render_page(page: Page, query: &PageQuery, config: &AppConfig) -> Result<String> {
    let body = match page {
        Page::Inicio => home(),
        Page::Distribucion => distribution(query)?,
        Page::EstudiantesPorProvincia => students_by_province(query, config)?,
        Page::Beneficios => table_page(
            page,
            query,
            config,
            "Información sobre los beneficios alimenticios disponibles en las escuelas.",
            |year, level, school_type| AssetKey::FoodBenefits { year, level, school_type },
        )?,
        Page::Sectores => table_page(
            page,
            query,
            config,
            "Comparación de la cantidad de escuelas en el sector público versus el privado.",
            |year, level, school_type| AssetKey::Sectors { year, level, school_type },
        )?,
        Page::Preferencias => preferences(),
        Page::AnalisisPorAnio => year_analysis(query)?,
        Page::Contacto => contact(),
    };
    Ok(layout(page, &body))
}

fn layout(active: Page, body: &str) -> String {
    let mut menu = String::new();
    for page in Page::ALL {
        let class = if page == active { " class=\"activo\"" } else { "" };
        let _ = write!(menu, "<li><a href=\"{}\"{}>{}</a></li>", page.href(), class, esc(page.label()));
    }
    format!(
        r#"<!DOCTYPE html>
<html lang="es">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css">
<script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>
<style>{css}</style>
</head>
<body>
<nav class="sidebar">
<img src="/static/logo.jpg" width="250" alt="">
<hr>
<p>Selecciona una página:</p>
<ul>{menu}</ul>
</nav>
<main>{body}</main>
</body>
</html>"#,
        title = APP_TITLE,
        css = CSS,
        menu = menu,
        body = body,
    )
}

fn home() -> String {
    "<h1>Bienvenido a la App de Calidad de Escuelas en Argentina</h1>\
     <p>Esta aplicación explora la calidad de las escuelas a las que asisten niños/as y adolescentes \
     extranjeros en Argentina, con un enfoque particular en los cuatro países con mayor cantidad de \
     migrantes: <b>Bolivia,</b> <b>Paraguay,</b> <b>Perú</b> y <b>Venezuela</b>. Aquí podrás encontrar \
     datos sobre infraestructura, beneficios alimenticios, y otros factores relevantes para estos grupos.</p>"
        .to_string()
}

fn distribution(query: &PageQuery) -> Result<String> {
    let year = query.year()?;
    let mut out = String::from("<h1>Distribución de Nacionalidades Extranjeras en Argentina</h1><hr>");
    out.push_str(
        "<p>Conocé cómo se distribuyen los alumnos extranjeros en Argentina mediante gráficos de barras. \
         Nos enfocaremos en las nacionalidades más representativas: Bolivia, Paraguay, Perú y Venezuela, \
         y su presencia en las diversas provincias del país.</p>",
    );
    out.push_str("<form method=\"get\">");
    out.push_str(&year_select(year));
    out.push_str("</form><div class=\"grilla\">");
    for country in Country::ALL {
        let _ = write!(out, "<section><h3>{}</h3>", esc(country.name()));
        match (AssetKey::Distribution { year, country }).resolve() {
            Asset::File(path) => {
                let caption = format!("Distribución de {} en el año {}", country.name(), year);
                out.push_str(&figure(&path, &caption));
            }
            Asset::NoData(msg) => {
                let _ = write!(out, "<p>{}</p>", esc(&msg));
            }
        }
        out.push_str("</section>");
    }
    out.push_str("</div>");
    Ok(out)
}

fn students_by_province(query: &PageQuery, config: &AppConfig) -> Result<String> {
    let year = query.year()?;
    let session = Session::from_parts(year, query.provincia.as_deref());
    let table = data::load_year_stats(config, year)?;
    let panel = panel::build(&session, &table);

    let mut out = String::from("<h1>Estudiantes Extranjeros por provincia</h1>");
    // Submitting drops `provincia`, so a new year starts unselected.
    out.push_str("<form method=\"get\">");
    out.push_str(&year_select(year));
    out.push_str("</form><hr><div class=\"columnas\">");
    out.push_str("<div id=\"mapa\" style=\"width:400px;height:600px\"></div>");
    let _ = write!(out, "<div id=\"panel\">{}</div></div>", panel_html(&panel));
    let _ = write!(
        out,
        "<script>const ANIO = {}; const MAPA_URL = '/api/mapa?anio={}';</script><script>{}</script>",
        year, year, MAP_JS
    );
    Ok(out)
}

fn preferences() -> String {
    let mut out = String::from("<h1>Preferencias por Provincia</h1>");
    out.push_str("<div id=\"mapa\" style=\"width:700px;height:500px\"></div>");
    let _ = write!(
        out,
        "<script>const ANIO = null; const MAPA_URL = '/api/provincias';</script><script>{}</script>",
        MAP_JS
    );
    out
}

fn year_analysis(query: &PageQuery) -> Result<String> {
    let year = query.year()?;
    let (level, school_type, resource) = (query.level(), query.school_type(), query.resource());
    let mut out = String::from("<h1>Análisis por Año</h1><form method=\"get\">");
    out.push_str(&year_select(year));
    out.push_str(&enum_select("nivel", &Level::ALL, level, |l: Level| l.label(), slug_of));
    out.push_str(&enum_select("tipo", &SchoolType::ALL, school_type, |t: SchoolType| t.label(), slug_of));
    out.push_str(&enum_select("recurso", &Resource::ALL, resource, |r: Resource| r.label(), slug_of));
    out.push_str("</form>");

    let key = AssetKey::Infrastructure { year, level, school_type, resource };
    if let Asset::File(path) = key.resolve() {
        let caption = format!("{} ({}) en el año {}", resource.label(), school_type.label(), year);
        out.push_str(&figure(&path, &caption));
    }
    Ok(out)
}

fn table_page(
    page: Page,
    query: &PageQuery,
    config: &AppConfig,
    intro: &str,
    key: impl Fn(Year, Level, SchoolType) -> AssetKey,
) -> Result<String> {
    let year = query.year()?;
    let (level, school_type) = (query.level(), query.school_type());
    let mut out = format!("<h1>{}</h1><p>{}</p><form method=\"get\">", esc(page.label()), esc(intro));
    out.push_str(&year_select(year));
    out.push_str(&enum_select("nivel", &Level::ALL, level, |l: Level| l.label(), slug_of));
    out.push_str(&enum_select("tipo", &SchoolType::ALL, school_type, |t: SchoolType| t.label(), slug_of));
    out.push_str("</form>");

    match key(year, level, school_type).resolve() {
        Asset::File(path) => {
            let full = config.input.data_dir.join(&path);
            if full.is_file() {
                out.push_str(&csv_table(&full)?);
            } else {
                let _ = write!(out, "<p>Sin datos para el año {}</p>", year);
            }
        }
        Asset::NoData(msg) => {
            let _ = write!(out, "<p>{}</p>", esc(&msg));
        }
    }
    Ok(out)
}

fn contact() -> String {
    "<h1>Contacto</h1><p>Si tienes preguntas o feedback, no dudes en contactarnos.</p>".to_string()
}

/// HTML for the side panel; also served as a fragment after each click.
pub fn panel_html(panel: &Panel) -> String {
    let mut out = String::from("<h2>Información Adicional</h2>");
    match panel {
        Panel::Description { text } | Panel::Stale { text, .. } => {
            let _ = write!(out, "<p>{}</p>", esc(text));
        }
        Panel::Metrics { text, heading, metrics } => {
            let _ = write!(out, "<p>{}</p><h3>{}</h3><div class=\"metricas\">", esc(text), esc(heading));
            for metric in metrics {
                let _ = write!(
                    out,
                    "<div class=\"metrica\"><span>{}</span><strong>{}</strong>",
                    esc(metric.label),
                    esc(&metric.value)
                );
                if let Some(pct) = &metric.percentage {
                    let _ = write!(out, "<small>{}</small>", esc(pct));
                }
                out.push_str("</div>");
            }
            out.push_str("</div>");
        }
    }
    out
}

fn csv_table(path: &Path) -> Result<String> {
    let file = File::open(path).with_context(|| format!("Failed to open CSV file: {:?}", path))?;
    let mut rdr = csv::Reader::from_reader(file);
    let mut out = String::from("<table><thead><tr>");
    for header in rdr.headers()?.iter() {
        let _ = write!(out, "<th>{}</th>", esc(header));
    }
    out.push_str("</tr></thead><tbody>");
    for record in rdr.records() {
        let record = record.with_context(|| format!("Malformed row in {:?}", path))?;
        out.push_str("<tr>");
        for cell in record.iter() {
            let _ = write!(out, "<td>{}</td>", esc(cell));
        }
        out.push_str("</tr>");
    }
    out.push_str("</tbody></table>");
    Ok(out)
}

fn figure(path: &Path, caption: &str) -> String {
    let src = path.to_string_lossy().replace('\\', "/");
    format!(
        "<figure><img src=\"/static/{}\" alt=\"{}\"><figcaption>{}</figcaption></figure>",
        esc(&src),
        esc(caption),
        esc(caption)
    )
}

fn year_select(selected: Year) -> String {
    let mut out = String::from("<label>Selecciona el año: <select name=\"anio\" onchange=\"this.form.submit()\">");
    for year in Year::all() {
        let sel = if year == selected { " selected" } else { "" };
        let _ = write!(out, "<option value=\"{0}\"{1}>{0}</option>", year, sel);
    }
    out.push_str("</select></label>");
    out
}

fn slug_of<T: Serialize>(value: &T) -> String {
    serde_json::to_value(value)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default()
}

fn enum_select<T: Copy + PartialEq>(
    name: &str,
    options: &[T],
    selected: T,
    label: impl Fn(T) -> &'static str,
    value: impl Fn(&T) -> String,
) -> String {
    let mut out = format!("<select name=\"{}\" onchange=\"this.form.submit()\">", name);
    for option in options {
        let sel = if *option == selected { " selected" } else { "" };
        let _ = write!(out, "<option value=\"{}\"{}>{}</option>", value(option), sel, esc(label(*option)));
    }
    out.push_str("</select>");
    out
}

fn esc(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

const CSS: &str = "body{margin:0;font-family:sans-serif;display:flex}\
.sidebar{width:280px;padding:1rem;background:#f0f2f6;min-height:100vh}\
.sidebar ul{list-style:none;padding:0}.sidebar li{margin:.4rem 0}\
.sidebar a.activo{font-weight:bold}\
main{flex:1;padding:1rem 2rem}\
.grilla{display:grid;grid-template-columns:1fr 1fr;gap:1rem}\
.grilla img,figure img{max-width:100%}\
.columnas{display:flex;gap:2rem}\
.metricas{display:flex;gap:1.5rem;flex-wrap:wrap}\
.metrica{display:flex;flex-direction:column}\
.metrica strong{font-size:1.6rem}\
table{border-collapse:collapse}td,th{border:1px solid #ccc;padding:.2rem .5rem}";

const MAP_JS: &str = r#"
(async function () {
  const view = await (await fetch(MAPA_URL)).json();
  const map = L.map('mapa', { scrollWheelZoom: false }).setView(view.center, view.zoom);
  L.tileLayer('https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png', {
    attribution: '&copy; OpenStreetMap'
  }).addTo(map);
  L.geoJSON(view.data, {
    style: () => view.style,
    onEachFeature: (feature, layer) => {
      const rows = feature.properties.tooltip || [];
      layer.bindTooltip(rows.map(r => '<b>' + esc(r.label) + '</b> ' + esc(r.value)).join('<br>'), { sticky: true });
      if (ANIO !== null) {
        layer.on('click', () => seleccionar(feature.properties.nombre));
      }
    }
  }).addTo(map);
})();

function esc(s) {
  return String(s)
    .replace(/&/g, '&amp;')
    .replace(/</g, '&lt;')
    .replace(/>/g, '&gt;')
    .replace(/"/g, '&quot;');
}

async function seleccionar(nombre) {
  const params = new URLSearchParams({ anio: ANIO, provincia: nombre });
  const html = await (await fetch('/fragmento/panel?' + params)).text();
  document.getElementById('panel').innerHTML = html;
  history.replaceState(null, '', '?' + params);
}
"#;
