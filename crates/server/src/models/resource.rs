use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::error::ValidationError;

pub type ContentId = i64;

const RESOURCE_URL_LENGTH_LIMIT: usize = 2000;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, sqlx::Type)]
#[sqlx(type_name = "resource_type")]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ResourceType {
    Article,
    Video,
    Podcast,
    Pdf,
    Course,
    Book,
    Infographic,
    Tool,
    Other,
}

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, sqlx::Type,
)]
#[sqlx(type_name = "difficulty")]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Difficulty {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

/// One metadata row augmenting a content item.
#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct Resource {
    pub id: i64,
    pub content_id: ContentId,
    pub resource_url: Option<String>,
    pub resource_type: Option<ResourceType>,
    pub difficulty: Difficulty,
    pub duration_minutes: i32,
    pub download_count: i64,
    pub is_featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Raw metadata write request as it arrives over HTTP. Absent fields leave
/// the stored value untouched.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpsertResourceRequest {
    pub resource_url: Option<String>,
    pub resource_type: Option<String>,
    pub difficulty: Option<String>,
    pub duration_minutes: Option<i32>,
    pub is_featured: Option<bool>,
}

/// Typed partial update. The two nullable columns carry a double `Option`:
/// `Some(None)` clears the stored value.
#[derive(Clone, Debug, Default)]
pub struct ResourcePatch {
    pub resource_url: Option<Option<String>>,
    pub resource_type: Option<Option<ResourceType>>,
    pub difficulty: Option<Difficulty>,
    pub duration_minutes: Option<i32>,
    pub is_featured: Option<bool>,
}

impl ResourcePatch {
    /// Normalizes a raw request into a patch. Unknown type strings clear the
    /// type, unknown difficulty strings fall back to beginner, negative
    /// durations clamp to zero. Only an oversized URL is a hard failure.
    pub fn from_request(request: UpsertResourceRequest) -> Result<Self, ValidationError> {
        let resource_url = match request.resource_url {
            Some(url) if url.is_empty() => Some(None),
            Some(url) => {
                validate_resource_url(&url)?;
                Some(Some(url))
            }
            None => None,
        };
        let resource_type = request
            .resource_type
            .map(|value| value.parse::<ResourceType>().ok());
        let difficulty = request
            .difficulty
            .map(|value| value.parse::<Difficulty>().unwrap_or_default());
        Ok(Self {
            resource_url,
            resource_type,
            difficulty,
            duration_minutes: request.duration_minutes.map(|minutes| minutes.max(0)),
            is_featured: request.is_featured,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.resource_url.is_none()
            && self.resource_type.is_none()
            && self.difficulty.is_none()
            && self.duration_minutes.is_none()
            && self.is_featured.is_none()
    }
}

pub fn validate_resource_url(url: &str) -> Result<(), ValidationError> {
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(ValidationError::InvalidInput {
            value: url.to_string(),
            reason: "resource url must be an absolute http(s) link".to_string(),
        });
    }
    if url.len() > RESOURCE_URL_LENGTH_LIMIT {
        return Err(ValidationError::LimitExceeded {
            subject: "resource url".to_string(),
            unit: "char".to_string(),
            attempted: url.len(),
            limit: RESOURCE_URL_LENGTH_LIMIT,
        });
    }
    Ok(())
}
