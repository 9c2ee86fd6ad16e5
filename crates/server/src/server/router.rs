use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, Path, Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tracing::{info, warn};

use crate::error::RequestError;
use crate::models::content::TermKind;
use crate::models::event::ActionType;
use crate::models::listing::{total_pages, ResourceFilter, ResourceListingQuery};
use crate::models::resource::ContentId;
use crate::models::response::{RecordDownloadResponse, ResourceResponse};
use crate::server::admin;
use crate::server::constants::{TOTAL_COUNT_HEADER, TOTAL_PAGES_HEADER};
use crate::server::state::AppState;

pub async fn serve(state: Arc<AppState>) -> anyhow::Result<()> {
    let addr = state.config.server.address.clone();
    let app = Router::new()
        .route("/api/v1/resources", get(list_resources))
        .route(
            "/api/v1/resources/:id",
            get(get_resource)
                .put(admin::upsert_resource)
                .delete(admin::delete_resource),
        )
        .route("/api/v1/resources/:id/download", post(record_download))
        .route("/api/v1/stats", get(admin::get_stats))
        .route(
            "/api/v1/settings",
            get(admin::get_settings).put(admin::update_settings),
        )
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("starting server on: {}", listener.local_addr()?);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}

/// Public listing. A category drives the content-side query through the
/// resolved term filter; otherwise the metadata filter applies. Both paths
/// report the grand total in the pagination headers.
pub async fn list_resources(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ResourceListingQuery>,
) -> Result<Response, RequestError> {
    let db = &state.db_connection;
    let settings = db.load_settings().await?;
    if !settings.enable_rest_api {
        return Err(RequestError::NotFound);
    }
    let filter = ResourceFilter::from_query(&query, settings.resources_per_page);
    let category = query
        .category
        .as_deref()
        .map(str::trim)
        .filter(|slug| !slug.is_empty());

    let (items, total) = match category {
        Some(slug) => match db.resolve_term(TermKind::Category, slug).await? {
            Some(term) => {
                let contents = db
                    .list_published(Some(term), filter.page, filter.per_page)
                    .await?;
                let total = db.count_published(Some(term)).await?;
                let mut items = Vec::with_capacity(contents.len());
                for content in contents {
                    let meta = db.get_resource(content.id).await?;
                    let terms = db.terms_for_content(content.id).await?;
                    items.push(ResourceResponse::assemble(content, meta, terms));
                }
                (items, total)
            }
            // Stale or mistyped slug: empty listing, not an error.
            None => (Vec::new(), 0),
        },
        None => {
            let resources = db.list_resources(&filter).await?;
            let total = db.count_resources(&filter).await?;
            let mut items = Vec::with_capacity(resources.len());
            for resource in resources {
                let Some(content) = db.get_published(resource.content_id).await? else {
                    continue;
                };
                let terms = db.terms_for_content(content.id).await?;
                items.push(ResourceResponse::assemble(content, Some(resource), terms));
            }
            (items, total)
        }
    };

    let headers = [
        (TOTAL_COUNT_HEADER, total.to_string()),
        (TOTAL_PAGES_HEADER, total_pages(total, filter.per_page).to_string()),
    ];
    Ok((headers, Json(items)).into_response())
}

pub async fn get_resource(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ContentId>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Result<Json<ResourceResponse>, RequestError> {
    let db = &state.db_connection;
    let settings = db.load_settings().await?;
    if !settings.enable_rest_api {
        return Err(RequestError::NotFound);
    }
    let content = db.get_published(id).await?.ok_or(RequestError::NotFound)?;
    let meta = db.get_resource(id).await?;
    let terms = db.terms_for_content(id).await?;

    // Fire-and-forget: a failed event write never fails the request.
    let ip = client_ip(&headers, peer);
    if let Err(error) = db.record_event(id, ActionType::View, None, &ip).await {
        warn!("failed to record view event for {id}: {error}");
    }

    Ok(Json(ResourceResponse::assemble(content, meta, terms)))
}

pub async fn record_download(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ContentId>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Result<Json<RecordDownloadResponse>, RequestError> {
    let db = &state.db_connection;
    let settings = db.load_settings().await?;
    if !settings.enable_rest_api {
        return Err(RequestError::NotFound);
    }
    if !settings.enable_download_count {
        return Ok(Json(RecordDownloadResponse { recorded: false }));
    }
    db.get_content(id).await?.ok_or(RequestError::NotFound)?;

    let recorded = db.increment_download_count(id).await?;
    if recorded {
        let ip = client_ip(&headers, peer);
        if let Err(error) = db.record_event(id, ActionType::Download, None, &ip).await {
            warn!("failed to record download event for {id}: {error}");
        }
    }
    Ok(Json(RecordDownloadResponse { recorded }))
}

/// First hop of `x-forwarded-for` when present, else the socket peer.
fn client_ip(headers: &HeaderMap, peer: SocketAddr) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| peer.ip().to_string())
}
