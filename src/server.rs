use crate::config::AppConfig;
use crate::data;
use crate::error::DataError;
use crate::pages::{self, Page, PageQuery};
use crate::panel::{self, Panel};
use crate::processing;
use crate::render::{self, MapView};
use crate::session::Session;
use crate::types::{EnrichedFeature, ProvinceShape};
use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::get,
    Router,
};
use geo::algorithm::contains::Contains;
use geo::bounding_rect::BoundingRect;
use geo::Point;
use rstar::{RTree, RTreeObject, AABB};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::{error, info};

// Wrapper for RTree indexing
struct ProvinceIndex {
    index: usize,
    aabb: AABB<[f64; 2]>,
}

impl RTreeObject for ProvinceIndex {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        self.aabb
    }
}

pub struct AppState {
    pub config: AppConfig,
}

/// Wraps any handler failure; `DataError`s pick their own status code.
pub struct AppError(anyhow::Error);

impl<E: Into<anyhow::Error>> From<E> for AppError {
    fn from(err: E) -> Self {
        AppError(err.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self.0.downcast_ref::<DataError>() {
            Some(DataError::ResourceNotFound(_)) => StatusCode::NOT_FOUND,
            Some(DataError::InvalidYear(_)) => StatusCode::BAD_REQUEST,
            None => {
                error!("request failed: {:#}", self.0);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(ErrorBody { error: format!("{:#}", self.0) })).into_response()
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Deserialize)]
pub struct PointParams {
    lat: f64,
    lon: f64,
}

#[derive(Serialize)]
pub struct PointResponse {
    nombre: String,
}

#[derive(Serialize)]
pub struct MenuEntry {
    label: &'static str,
    slug: &'static str,
    href: String,
}

pub fn router(state: Arc<AppState>) -> Router {
    let static_files = ServeDir::new(&state.config.input.data_dir);

    Router::new()
        .route("/", get(index_handler))
        .route("/pagina/:slug", get(page_handler))
        .route("/fragmento/panel", get(panel_fragment_handler))
        .route("/api/paginas", get(menu_handler))
        .route("/api/mapa", get(map_handler))
        .route("/api/provincias", get(boundaries_handler))
        .route("/api/panel", get(panel_handler))
        .route("/api/provincia", get(point_handler))
        .nest_service("/static", static_files)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start_server(config: AppConfig) -> Result<()> {
    let addr = SocketAddr::from((config.server.host, config.server.port));
    let state = Arc::new(AppState { config });
    let app = router(state);

    info!("Starting server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[derive(Deserialize)]
struct IndexParams {
    pagina: Option<String>,
}

/// Runs file loading and parsing off the async workers.
async fn blocking<T, F>(work: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    Ok(tokio::task::spawn_blocking(work).await??)
}

/// `/?pagina=<menu label>` dispatches like the sidebar radio did.
async fn index_handler(
    State(state): State<Arc<AppState>>,
    Query(index): Query<IndexParams>,
    Query(query): Query<PageQuery>,
) -> Result<Html<String>, AppError> {
    let page = index.pagina.as_deref().map(Page::from_label).unwrap_or(Page::Inicio);
    let html = blocking(move || pages::render_page(page, &query, &state.config)).await?;
    Ok(Html(html))
}

async fn page_handler(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Response, AppError> {
    let Some(page) = Page::from_slug(&slug) else {
        return Ok((StatusCode::NOT_FOUND, format!("Página desconocida: {}", slug)).into_response());
    };
    let html = blocking(move || pages::render_page(page, &query, &state.config)).await?;
    Ok(Html(html).into_response())
}

async fn menu_handler() -> Json<Vec<MenuEntry>> {
    Json(
        Page::ALL
            .into_iter()
            .map(|p| MenuEntry { label: p.label(), slug: p.slug(), href: p.href() })
            .collect(),
    )
}

async fn map_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PageQuery>,
) -> Result<Json<MapView>, AppError> {
    let year = query.year()?;
    let view = blocking(move || {
        let config = &state.config;
        let table = data::load_year_stats(config, year)?;
        let shapes = data::load_boundaries(config)?;
        let (features, _report) = processing::enrich(shapes, &table);
        Ok(render::map_view(&config.map, Some(year), &features))
    })
    .await?;
    Ok(Json(view))
}

async fn boundaries_handler(State(state): State<Arc<AppState>>) -> Result<Json<MapView>, AppError> {
    let view = blocking(move || {
        let features: Vec<EnrichedFeature> = data::load_boundaries(&state.config)?
            .into_iter()
            .map(|shape| EnrichedFeature { shape, enrichment: None })
            .collect();
        Ok(render::boundary_view(&state.config.map, &features))
    })
    .await?;
    Ok(Json(view))
}

fn current_panel(config: &AppConfig, query: &PageQuery) -> Result<Panel> {
    let year = query.year()?;
    let session = Session::from_parts(year, query.provincia.as_deref());
    let table = data::load_year_stats(config, year)?;
    Ok(panel::build(&session, &table))
}

async fn panel_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Panel>, AppError> {
    let panel = blocking(move || current_panel(&state.config, &query)).await?;
    Ok(Json(panel))
}

async fn panel_fragment_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PageQuery>,
) -> Result<Html<String>, AppError> {
    let panel = blocking(move || current_panel(&state.config, &query)).await?;
    Ok(Html(pages::panel_html(&panel)))
}

async fn point_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PointParams>,
) -> Result<Json<Option<PointResponse>>, AppError> {
    let found = blocking(move || {
        let shapes = data::load_boundaries(&state.config)?;
        Ok(locate(&shapes, params.lon, params.lat)
            .map(|shape| PointResponse { nombre: shape.name.clone() }))
    })
    .await?;
    Ok(Json(found))
}

/// Province whose boundary contains (`lon`, `lat`), first in file order.
pub fn locate(shapes: &[ProvinceShape], lon: f64, lat: f64) -> Option<&ProvinceShape> {
    let tree_items: Vec<ProvinceIndex> = shapes
        .iter()
        .enumerate()
        .filter_map(|(i, shape)| {
            let rect = shape.geometry.bounding_rect()?;
            Some(ProvinceIndex {
                index: i,
                aabb: AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]),
            })
        })
        .collect();
    let tree = RTree::bulk_load(tree_items);

    let point = Point::new(lon, lat);
    let envelope = AABB::from_point([lon, lat]);

    let mut candidates: Vec<usize> = tree
        .locate_in_envelope_intersecting(&envelope)
        .map(|c| c.index)
        .collect();
    candidates.sort_unstable();

    candidates
        .into_iter()
        .filter_map(|i| shapes.get(i))
        .find(|shape| shape.geometry.contains(&point))
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{MultiPolygon, polygon};

    fn square(name: &str, x0: f64, y0: f64) -> ProvinceShape {
        let p = polygon![
            (x: x0, y: y0),
            (x: x0 + 1.0, y: y0),
            (x: x0 + 1.0, y: y0 + 1.0),
            (x: x0, y: y0 + 1.0),
        ];
        ProvinceShape { name: name.to_string(), geometry: MultiPolygon::new(vec![p]) }
    }

    #[test]
    fn locate_finds_containing_province() {
        let shapes = vec![square("Salta", -65.0, -25.0), square("Jujuy", -65.0, -24.0)];
        assert_eq!(locate(&shapes, -64.5, -23.5).map(|s| s.name.as_str()), Some("Jujuy"));
        assert_eq!(locate(&shapes, -64.5, -24.5).map(|s| s.name.as_str()), Some("Salta"));
        assert!(locate(&shapes, 0.0, 0.0).is_none());
    }

    #[tokio::test]
    async fn blocking_work_keeps_error_status() {
        let ok = blocking(|| Ok(7)).await.ok();
        assert_eq!(ok, Some(7));

        let err = blocking(|| -> Result<()> { Err(DataError::ResourceNotFound("x.csv".into()).into()) })
            .await
            .err()
            .unwrap()
            .into_response();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn data_errors_map_to_status_codes() {
        let not_found = AppError::from(DataError::ResourceNotFound("x.csv".into())).into_response();
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);
        let bad_year = AppError::from(DataError::InvalidYear(1999)).into_response();
        assert_eq!(bad_year.status(), StatusCode::BAD_REQUEST);
        let other = AppError::from(anyhow::anyhow!("boom")).into_response();
        assert_eq!(other.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
