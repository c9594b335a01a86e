use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tower_cookies::Cookies;

use crate::{
    catalog::{self, GridPage},
    error::{AppError, Result},
    handlers::response::json_response,
    middleware_layer::auth::clear_session_cookie,
    models::grid::GridRequest,
    services::{grid_adapter::GridAdapter, grid_view::FetchOutcome, registry::RegisteredSession},
    state::AppState,
    validation::grid::validate_grid_request,
};

#[derive(Serialize)]
pub struct PageSummary {
    pub slug: &'static str,
    pub title: &'static str,
}

fn find_page(slug: &str) -> Result<&'static GridPage> {
    catalog::find(slug).ok_or_else(|| {
        tracing::warn!("❌ Unknown grid page: {}", slug);
        AppError::NotFound
    })
}

/// Lists the dashboard's listing pages.
pub async fn list_pages() -> Result<Response> {
    let pages: Vec<PageSummary> = catalog::PAGES
        .iter()
        .map(|page| PageSummary {
            slug: page.slug,
            title: page.title,
        })
        .collect();

    json_response(StatusCode::OK, &pages)
}

/// Returns the column layout and initial sort of one page.
pub async fn page_config(Path(slug): Path<String>) -> Result<Response> {
    let page = find_page(&slug)?;
    json_response(StatusCode::OK, &page.config())
}

/// Fetches one page of records for a grid.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `entry` - The caller's session.
/// * `cookies` - The request cookies.
/// * `slug` - The page being displayed.
/// * `request` - Page, page size, sort, filter and grid instance id.
///
/// # Returns
///
/// The normalized page, or 204 when a newer fetch for the same grid instance
/// has already settled.
#[axum::debug_handler]
pub async fn page_data(
    State(state): State<AppState>,
    Extension(entry): Extension<RegisteredSession>,
    cookies: Cookies,
    Path(slug): Path<String>,
    Json(mut request): Json<GridRequest>,
) -> Result<Response> {
    let page = find_page(&slug)?;
    validate_grid_request(page, &request)?;

    if request.sort.is_empty() {
        request.sort.push(page.initial_sort());
    }

    tracing::debug!(
        "📄 Grid {} page={} size={} sort={} filters={}",
        page.slug,
        request.page,
        request.page_size,
        request.sort.len(),
        request.filter.len()
    );

    let adapter = GridAdapter::new(page.endpoint, page.method, state.config.page_count_policy);
    let client = state.api.for_session(entry.state.clone());
    let view = entry.view(page.slug, request.grid_id.as_deref()).await;

    match view.load(&adapter, &client, request).await {
        Ok(FetchOutcome::Applied(envelope)) => json_response(StatusCode::OK, envelope.as_ref()),
        Ok(FetchOutcome::Superseded { .. }) => Ok(StatusCode::NO_CONTENT.into_response()),
        Err(e) => {
            if e.is_auth() {
                tracing::warn!("❌ Session {} lost its upstream authorization", entry.session.id);
                state.sessions.remove(entry.session.id).await;
                clear_session_cookie(&cookies);
            }
            Err(e.into())
        }
    }
}
