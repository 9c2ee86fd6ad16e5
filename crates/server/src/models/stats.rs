use serde::Serialize;

use crate::models::resource::ContentId;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TrackingSummary {
    pub views: i64,
    pub downloads: i64,
}

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct TopViewedEntry {
    pub resource_id: ContentId,
    pub view_count: i64,
    /// Null when the content item was deleted after events were logged.
    pub title: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MonthlyCount {
    /// "YYYY-MM" bucket key.
    pub month: String,
    pub count: i64,
}

#[derive(Clone, Debug, Serialize)]
pub struct StatsResponse {
    pub views: i64,
    pub downloads: i64,
    pub total_resources: i64,
    pub published: i64,
    pub draft: i64,
    pub top_viewed: Vec<TopViewedEntry>,
    pub published_per_month: Vec<MonthlyCount>,
}
