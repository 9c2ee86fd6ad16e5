use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::resource::ContentId;

/// Discriminator for content items managed by this service.
pub const RESOURCE_KIND: &str = "edu_resource";

pub type TermId = i64;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, sqlx::Type)]
#[sqlx(type_name = "content_status")]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ContentStatus {
    Draft,
    Published,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, sqlx::Type)]
#[sqlx(type_name = "term_kind")]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TermKind {
    Category,
    Tag,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct ContentItem {
    pub id: ContentId,
    pub kind: String,
    pub title: String,
    pub excerpt: String,
    pub permalink: String,
    pub thumbnail_url: Option<String>,
    pub status: ContentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug)]
pub struct CreateContentRequest {
    pub title: String,
    pub excerpt: String,
    pub permalink: String,
    pub thumbnail_url: Option<String>,
    pub status: ContentStatus,
    /// Override for backfilled items; `None` means now.
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct Term {
    pub id: TermId,
    pub kind: TermKind,
    pub slug: String,
    pub name: String,
}

/// Opaque taxonomy filter handed to the content listing query. Produced
/// only by `resolve_term`; callers never see the inner id.
#[derive(Clone, Copy, Debug)]
pub struct TermFilter(pub(crate) TermId);
