use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::content::{ContentItem, Term, TermKind};
use crate::models::resource::{ContentId, Difficulty, Resource, ResourceType};

#[derive(Clone, Copy, Debug, Serialize)]
pub struct RecordDownloadResponse {
    pub recorded: bool,
}

#[derive(Clone, Copy, Debug, Serialize)]
pub struct DeleteResourceResponse {
    pub deleted: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct TermResponse {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

impl From<Term> for TermResponse {
    fn from(term: Term) -> Self {
        Self {
            id: term.id,
            name: term.name,
            slug: term.slug,
        }
    }
}

/// The wire representation of one resource: content fields plus whatever
/// metadata exists for it.
#[derive(Clone, Debug, Serialize)]
pub struct ResourceResponse {
    pub id: ContentId,
    pub title: String,
    pub excerpt: String,
    pub permalink: String,
    pub thumbnail: Option<String>,
    pub date: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    pub resource_url: Option<String>,
    pub resource_type: Option<ResourceType>,
    pub difficulty: Option<Difficulty>,
    pub duration_minutes: Option<i32>,
    pub download_count: i64,
    pub is_featured: bool,
    pub categories: Vec<TermResponse>,
    pub tags: Vec<TermResponse>,
}

impl ResourceResponse {
    pub fn assemble(content: ContentItem, meta: Option<Resource>, terms: Vec<Term>) -> Self {
        let (categories, tags): (Vec<Term>, Vec<Term>) = terms
            .into_iter()
            .partition(|term| term.kind == TermKind::Category);
        Self {
            id: content.id,
            title: content.title,
            excerpt: content.excerpt,
            permalink: content.permalink,
            thumbnail: content.thumbnail_url,
            date: content.created_at,
            modified: content.updated_at,
            resource_url: meta.as_ref().and_then(|m| m.resource_url.clone()),
            resource_type: meta.as_ref().and_then(|m| m.resource_type),
            difficulty: meta.as_ref().map(|m| m.difficulty),
            duration_minutes: meta
                .as_ref()
                .map(|m| m.duration_minutes)
                .filter(|minutes| *minutes > 0),
            download_count: meta.as_ref().map(|m| m.download_count).unwrap_or(0),
            is_featured: meta.as_ref().map(|m| m.is_featured).unwrap_or(false),
            categories: categories.into_iter().map(TermResponse::from).collect(),
            tags: tags.into_iter().map(TermResponse::from).collect(),
        }
    }
}
