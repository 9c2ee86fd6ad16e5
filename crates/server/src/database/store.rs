use sqlx::{Error as SqlxError, PgExecutor};
use tracing::instrument;

use crate::database::connection::DbConnection;
use crate::models::listing::ResourceFilter;
use crate::models::resource::{ContentId, Difficulty, Resource, ResourcePatch};

const RESOURCE_COLUMNS: &str = "id, content_id, resource_url, resource_type, difficulty, \
     duration_minutes, download_count, is_featured, created_at, updated_at";

impl DbConnection {
    pub async fn get_resource(
        &self,
        content_id: ContentId,
    ) -> Result<Option<Resource>, SqlxError> {
        get_resource(self.pool(), content_id).await
    }

    pub async fn upsert_resource(
        &self,
        content_id: ContentId,
        patch: &ResourcePatch,
        new_row_difficulty: Difficulty,
    ) -> Result<(), SqlxError> {
        upsert_resource(self.pool(), content_id, patch, new_row_difficulty).await
    }

    pub async fn delete_resource(&self, content_id: ContentId) -> Result<bool, SqlxError> {
        delete_resource(self.pool(), content_id).await
    }

    pub async fn increment_download_count(
        &self,
        content_id: ContentId,
    ) -> Result<bool, SqlxError> {
        increment_download_count(self.pool(), content_id).await
    }

    pub async fn list_resources(
        &self,
        filter: &ResourceFilter,
    ) -> Result<Vec<Resource>, SqlxError> {
        list_resources(self.pool(), filter).await
    }

    pub async fn count_resources(&self, filter: &ResourceFilter) -> Result<i64, SqlxError> {
        count_resources(self.pool(), filter).await
    }
}

#[instrument(skip(executor))]
pub async fn get_resource<'a, E: PgExecutor<'a>>(
    executor: E,
    content_id: ContentId,
) -> Result<Option<Resource>, SqlxError> {
    let sql = format!("SELECT {RESOURCE_COLUMNS} FROM resource_meta WHERE content_id = $1;");
    sqlx::query_as(&sql)
        .bind(content_id)
        .fetch_optional(executor)
        .await
}

/// Insert-or-update in a single statement. Only supplied patch fields make
/// it into the conflict SET list, so an update leaves the rest of the row
/// alone; `new_row_difficulty` fills the difficulty column when a brand-new
/// row arrives without one.
#[instrument(skip(executor, patch))]
pub async fn upsert_resource<'a, E: PgExecutor<'a>>(
    executor: E,
    content_id: ContentId,
    patch: &ResourcePatch,
    new_row_difficulty: Difficulty,
) -> Result<(), SqlxError> {
    let mut columns: Vec<&str> = vec!["content_id"];
    let mut placeholders: Vec<String> = vec!["$1".to_string()];
    let mut updates: Vec<String> = Vec::new();
    let mut arg = 1usize;

    if patch.resource_url.is_some() {
        arg += 1;
        columns.push("resource_url");
        placeholders.push(format!("${arg}"));
        updates.push(format!("resource_url = ${arg}"));
    }
    if patch.resource_type.is_some() {
        arg += 1;
        columns.push("resource_type");
        placeholders.push(format!("${arg}"));
        updates.push(format!("resource_type = ${arg}"));
    }
    // Difficulty is always inserted so a fresh row can pick up the
    // configured default, but only a supplied value may overwrite.
    arg += 1;
    columns.push("difficulty");
    placeholders.push(format!("${arg}"));
    if patch.difficulty.is_some() {
        updates.push(format!("difficulty = ${arg}"));
    }
    if patch.duration_minutes.is_some() {
        arg += 1;
        columns.push("duration_minutes");
        placeholders.push(format!("${arg}"));
        updates.push(format!("duration_minutes = ${arg}"));
    }
    if patch.is_featured.is_some() {
        arg += 1;
        columns.push("is_featured");
        placeholders.push(format!("${arg}"));
        updates.push(format!("is_featured = ${arg}"));
    }
    updates.push("updated_at = now()".to_string());

    let sql = format!(
        "INSERT INTO resource_meta ({}) VALUES ({}) \
         ON CONFLICT (content_id) DO UPDATE SET {};",
        columns.join(", "),
        placeholders.join(", "),
        updates.join(", "),
    );

    let mut query = sqlx::query(&sql).bind(content_id);
    if let Some(url) = &patch.resource_url {
        query = query.bind(url.as_deref());
    }
    if let Some(resource_type) = &patch.resource_type {
        query = query.bind(*resource_type);
    }
    query = query.bind(patch.difficulty.unwrap_or(new_row_difficulty));
    if let Some(minutes) = patch.duration_minutes {
        query = query.bind(minutes);
    }
    if let Some(featured) = patch.is_featured {
        query = query.bind(featured);
    }
    query.execute(executor).await?;
    Ok(())
}

#[instrument(skip(executor))]
pub async fn delete_resource<'a, E: PgExecutor<'a>>(
    executor: E,
    content_id: ContentId,
) -> Result<bool, SqlxError> {
    let result = sqlx::query("DELETE FROM resource_meta WHERE content_id = $1;")
        .bind(content_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Single-statement atomic increment. Returns false when no row exists,
/// which callers treat as a no-op rather than an error.
#[instrument(skip(executor))]
pub async fn increment_download_count<'a, E: PgExecutor<'a>>(
    executor: E,
    content_id: ContentId,
) -> Result<bool, SqlxError> {
    let result = sqlx::query(
        "UPDATE resource_meta \
         SET download_count = download_count + 1, updated_at = now() \
         WHERE content_id = $1;",
    )
    .bind(content_id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}

#[instrument(skip(executor))]
pub async fn list_resources<'a, E: PgExecutor<'a>>(
    executor: E,
    filter: &ResourceFilter,
) -> Result<Vec<Resource>, SqlxError> {
    let (where_sql, used_args) = filter_where_clause(filter);
    let per_page = i64::from(filter.per_page.max(1));
    let offset = (i64::from(filter.page.max(1)) - 1) * per_page;
    let sql = format!(
        "SELECT {RESOURCE_COLUMNS} FROM resource_meta {where_sql} \
         ORDER BY {} {} LIMIT ${} OFFSET ${};",
        filter.sort.as_column(),
        filter.direction.as_sql(),
        used_args + 1,
        used_args + 2,
    );
    let mut query = sqlx::query_as(&sql);
    if let Some(resource_type) = filter.resource_type {
        query = query.bind(resource_type);
    }
    if let Some(difficulty) = filter.difficulty {
        query = query.bind(difficulty);
    }
    if let Some(featured) = filter.is_featured {
        query = query.bind(featured);
    }
    query.bind(per_page).bind(offset).fetch_all(executor).await
}

#[instrument(skip(executor))]
pub async fn count_resources<'a, E: PgExecutor<'a>>(
    executor: E,
    filter: &ResourceFilter,
) -> Result<i64, SqlxError> {
    let (where_sql, _) = filter_where_clause(filter);
    let sql = format!("SELECT COUNT(*) FROM resource_meta {where_sql};");
    let mut query = sqlx::query_scalar(&sql);
    if let Some(resource_type) = filter.resource_type {
        query = query.bind(resource_type);
    }
    if let Some(difficulty) = filter.difficulty {
        query = query.bind(difficulty);
    }
    if let Some(featured) = filter.is_featured {
        query = query.bind(featured);
    }
    query.fetch_one(executor).await
}

/// WHERE clause from the optional filters, with numbered placeholders.
/// Returns the clause and how many placeholders it consumed. The ORDER BY
/// column never goes through here: it comes from the `SortField` enum.
fn filter_where_clause(filter: &ResourceFilter) -> (String, usize) {
    let mut clauses: Vec<String> = Vec::new();
    let mut arg = 0usize;
    if filter.resource_type.is_some() {
        arg += 1;
        clauses.push(format!("resource_type = ${arg}"));
    }
    if filter.difficulty.is_some() {
        arg += 1;
        clauses.push(format!("difficulty = ${arg}"));
    }
    if filter.is_featured.is_some() {
        arg += 1;
        clauses.push(format!("is_featured = ${arg}"));
    }
    if clauses.is_empty() {
        (String::new(), 0)
    } else {
        (format!("WHERE {}", clauses.join(" AND ")), arg)
    }
}
