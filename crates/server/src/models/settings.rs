use serde::{Deserialize, Serialize};

use crate::models::resource::Difficulty;
use crate::server::constants::MAX_PAGE_SIZE;

pub const DEFAULT_RESOURCES_PER_PAGE: i32 = 12;

/// The four persisted configuration scalars. Loaded per request; writes go
/// through `clamped` so an out-of-range page size can never be stored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Settings {
    pub resources_per_page: i32,
    pub enable_rest_api: bool,
    pub default_difficulty: Difficulty,
    pub enable_download_count: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            resources_per_page: DEFAULT_RESOURCES_PER_PAGE,
            enable_rest_api: true,
            default_difficulty: Difficulty::Beginner,
            enable_download_count: true,
        }
    }
}

impl Settings {
    pub fn clamped(mut self) -> Self {
        self.resources_per_page = self.resources_per_page.clamp(1, MAX_PAGE_SIZE);
        self
    }
}
