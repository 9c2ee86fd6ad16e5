use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;

use crate::auth::admin::AdminKey;
use crate::error::RequestError;
use crate::models::listing::ResourceFilter;
use crate::models::resource::{ContentId, Resource, ResourcePatch, UpsertResourceRequest};
use crate::models::response::DeleteResourceResponse;
use crate::models::settings::Settings;
use crate::models::stats::StatsResponse;
use crate::server::constants::{PUBLISHED_MONTHS_WINDOW, TOP_VIEWED_LIMIT};
use crate::server::state::AppState;

pub async fn get_stats(
    State(state): State<Arc<AppState>>,
    _admin: AdminKey,
) -> Result<Json<StatsResponse>, RequestError> {
    let db = &state.db_connection;
    let tracking = db.tracking_summary().await?;
    let top_viewed = db.top_viewed(TOP_VIEWED_LIMIT).await?;
    let published_per_month = db.published_per_month(PUBLISHED_MONTHS_WINDOW).await?;
    let total_resources = db.count_resources(&ResourceFilter::default()).await?;
    let (published, draft) = db.count_by_status().await?;
    Ok(Json(StatsResponse {
        views: tracking.views,
        downloads: tracking.downloads,
        total_resources,
        published,
        draft,
        top_viewed,
        published_per_month,
    }))
}

pub async fn get_settings(
    State(state): State<Arc<AppState>>,
    _admin: AdminKey,
) -> Result<Json<Settings>, RequestError> {
    Ok(Json(state.db_connection.load_settings().await?))
}

pub async fn update_settings(
    State(state): State<Arc<AppState>>,
    _admin: AdminKey,
    Json(settings): Json<Settings>,
) -> Result<Json<Settings>, RequestError> {
    let settings = settings.clamped();
    state.db_connection.save_settings(&settings).await?;
    Ok(Json(settings))
}

/// Metadata write for an existing content item. A brand-new row picks up
/// the configured default difficulty when the patch leaves it unset.
pub async fn upsert_resource(
    State(state): State<Arc<AppState>>,
    _admin: AdminKey,
    Path(id): Path<ContentId>,
    Json(request): Json<UpsertResourceRequest>,
) -> Result<Json<Resource>, RequestError> {
    let db = &state.db_connection;
    db.get_content(id).await?.ok_or(RequestError::NotFound)?;
    let patch = ResourcePatch::from_request(request)?;
    let settings = db.load_settings().await?;
    db.upsert_resource(id, &patch, settings.default_difficulty)
        .await?;
    let resource = db.get_resource(id).await?.ok_or(RequestError::NotFound)?;
    Ok(Json(resource))
}

pub async fn delete_resource(
    State(state): State<Arc<AppState>>,
    _admin: AdminKey,
    Path(id): Path<ContentId>,
) -> Result<Json<DeleteResourceResponse>, RequestError> {
    let deleted = state.db_connection.delete_resource(id).await?;
    Ok(Json(DeleteResourceResponse { deleted }))
}
