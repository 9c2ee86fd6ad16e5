use serde::Deserialize;
use strum_macros::EnumString;

use crate::models::resource::{Difficulty, ResourceType};
use crate::server::constants::MAX_PAGE_SIZE;

pub const DEFAULT_PAGE: i32 = 1;

/// Raw, untrusted listing parameters as they arrive on the query string.
#[derive(Debug, Default, Deserialize)]
pub struct ResourceListingQuery {
    pub page: Option<i32>,
    pub per_page: Option<i32>,
    pub resource_type: Option<String>,
    pub difficulty: Option<String>,
    pub featured: Option<bool>,
    pub category: Option<String>,
    pub orderby: Option<String>,
    pub order: Option<String>,
}

/// Fields the listing may be ordered by. Arbitrary input can never reach
/// the SQL text: unknown values fall back to `CreatedAt`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, EnumString)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum SortField {
    #[default]
    CreatedAt,
    DownloadCount,
    DurationMinutes,
    Id,
}

impl SortField {
    pub fn as_column(self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::DownloadCount => "download_count",
            Self::DurationMinutes => "duration_minutes",
            Self::Id => "id",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, EnumString)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Normalized listing filter. Construction never fails: every invalid or
/// missing parameter degrades to a safe default so stale client state keeps
/// browsing working.
#[derive(Clone, Debug)]
pub struct ResourceFilter {
    pub resource_type: Option<ResourceType>,
    pub difficulty: Option<Difficulty>,
    pub is_featured: Option<bool>,
    pub sort: SortField,
    pub direction: SortDirection,
    pub page: i32,
    pub per_page: i32,
}

impl Default for ResourceFilter {
    fn default() -> Self {
        Self::from_query(&ResourceListingQuery::default(), MAX_PAGE_SIZE)
    }
}

impl ResourceFilter {
    pub fn from_query(query: &ResourceListingQuery, default_per_page: i32) -> Self {
        Self {
            resource_type: query
                .resource_type
                .as_deref()
                .and_then(|value| value.parse().ok()),
            difficulty: query
                .difficulty
                .as_deref()
                .and_then(|value| value.parse().ok()),
            is_featured: query.featured,
            sort: query
                .orderby
                .as_deref()
                .and_then(|value| value.parse().ok())
                .unwrap_or_default(),
            direction: query
                .order
                .as_deref()
                .and_then(|value| value.parse().ok())
                .unwrap_or_default(),
            page: query.page.unwrap_or(DEFAULT_PAGE).max(1),
            per_page: query
                .per_page
                .unwrap_or(default_per_page)
                .clamp(1, MAX_PAGE_SIZE),
        }
    }
}

pub fn total_pages(total: i64, per_page: i32) -> i64 {
    if total <= 0 {
        return 0;
    }
    let per_page = i64::from(per_page.max(1));
    (total + per_page - 1) / per_page
}
