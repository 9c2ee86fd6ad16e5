use sqlx::{Error as SqlxError, PgExecutor, Row};
use tracing::{info, instrument};

use crate::database::connection::DbConnection;
use crate::database::store::delete_resource;
use crate::models::content::{
    ContentItem, ContentStatus, CreateContentRequest, Term, TermFilter, TermId, TermKind,
    RESOURCE_KIND,
};
use crate::models::resource::ContentId;

const CONTENT_COLUMNS: &str =
    "id, kind, title, excerpt, permalink, thumbnail_url, status, created_at, updated_at";

impl DbConnection {
    pub async fn create_content(
        &self,
        request: &CreateContentRequest,
    ) -> Result<ContentId, SqlxError> {
        create_content(self.pool(), request).await
    }

    pub async fn get_content(&self, id: ContentId) -> Result<Option<ContentItem>, SqlxError> {
        get_content(self.pool(), id).await
    }

    pub async fn get_published(&self, id: ContentId) -> Result<Option<ContentItem>, SqlxError> {
        get_published(self.pool(), id).await
    }

    pub async fn list_published(
        &self,
        term: Option<TermFilter>,
        page: i32,
        per_page: i32,
    ) -> Result<Vec<ContentItem>, SqlxError> {
        list_published(self.pool(), term, page, per_page).await
    }

    pub async fn count_published(&self, term: Option<TermFilter>) -> Result<i64, SqlxError> {
        count_published(self.pool(), term).await
    }

    pub async fn resolve_term(
        &self,
        kind: TermKind,
        slug: &str,
    ) -> Result<Option<TermFilter>, SqlxError> {
        resolve_term(self.pool(), kind, slug).await
    }

    pub async fn create_term(
        &self,
        kind: TermKind,
        slug: &str,
        name: &str,
    ) -> Result<TermId, SqlxError> {
        create_term(self.pool(), kind, slug, name).await
    }

    pub async fn assign_term(
        &self,
        content_id: ContentId,
        term_id: TermId,
    ) -> Result<(), SqlxError> {
        assign_term(self.pool(), content_id, term_id).await
    }

    pub async fn terms_for_content(&self, content_id: ContentId) -> Result<Vec<Term>, SqlxError> {
        terms_for_content(self.pool(), content_id).await
    }

    pub async fn count_by_status(&self) -> Result<(i64, i64), SqlxError> {
        count_by_status(self.pool()).await
    }

    /// Lifecycle cascade for a deleted content item: term links go with the
    /// content row, then the metadata row. Events are left behind on
    /// purpose; the analytics queries tolerate dangling references.
    pub async fn delete_content(&self, id: ContentId) -> Result<bool, SqlxError> {
        let mut transaction = self.pool().begin().await?;
        let result = sqlx::query("DELETE FROM content_items WHERE id = $1 AND kind = $2;")
            .bind(id)
            .bind(RESOURCE_KIND)
            .execute(transaction.as_mut())
            .await?;
        if result.rows_affected() == 0 {
            return Ok(false);
        }
        delete_resource(transaction.as_mut(), id).await?;
        transaction.commit().await?;
        info!("deleted content item {id} with its resource metadata");
        Ok(true)
    }
}

#[instrument(skip_all)]
pub async fn create_content<'a, E: PgExecutor<'a>>(
    executor: E,
    request: &CreateContentRequest,
) -> Result<ContentId, SqlxError> {
    let id = sqlx::query(
        "
            INSERT INTO content_items (kind, title, excerpt, permalink, thumbnail_url, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, COALESCE($7, now()), COALESCE($7, now())) RETURNING id;
        ",
    )
    .bind(RESOURCE_KIND)
    .bind(&request.title)
    .bind(&request.excerpt)
    .bind(&request.permalink)
    .bind(request.thumbnail_url.as_deref())
    .bind(request.status)
    .bind(request.created_at)
    .fetch_one(executor)
    .await?
    .try_get("id")?;
    Ok(id)
}

#[instrument(skip(executor))]
pub async fn get_content<'a, E: PgExecutor<'a>>(
    executor: E,
    id: ContentId,
) -> Result<Option<ContentItem>, SqlxError> {
    let sql = format!("SELECT {CONTENT_COLUMNS} FROM content_items WHERE id = $1 AND kind = $2;");
    sqlx::query_as(&sql)
        .bind(id)
        .bind(RESOURCE_KIND)
        .fetch_optional(executor)
        .await
}

#[instrument(skip(executor))]
pub async fn get_published<'a, E: PgExecutor<'a>>(
    executor: E,
    id: ContentId,
) -> Result<Option<ContentItem>, SqlxError> {
    let sql = format!(
        "SELECT {CONTENT_COLUMNS} FROM content_items WHERE id = $1 AND kind = $2 AND status = $3;"
    );
    sqlx::query_as(&sql)
        .bind(id)
        .bind(RESOURCE_KIND)
        .bind(ContentStatus::Published)
        .fetch_optional(executor)
        .await
}

#[instrument(skip(executor))]
pub async fn list_published<'a, E: PgExecutor<'a>>(
    executor: E,
    term: Option<TermFilter>,
    page: i32,
    per_page: i32,
) -> Result<Vec<ContentItem>, SqlxError> {
    let per_page = i64::from(per_page.max(1));
    let offset = (i64::from(page.max(1)) - 1) * per_page;
    let term_sql = if term.is_some() {
        "AND EXISTS (SELECT 1 FROM content_terms WHERE content_id = content_items.id AND term_id = $3)"
    } else {
        ""
    };
    let (limit_arg, offset_arg) = if term.is_some() { (4, 5) } else { (3, 4) };
    let sql = format!(
        "SELECT {CONTENT_COLUMNS} FROM content_items \
         WHERE kind = $1 AND status = $2 {term_sql} \
         ORDER BY created_at DESC, id DESC LIMIT ${limit_arg} OFFSET ${offset_arg};"
    );
    let mut query = sqlx::query_as(&sql)
        .bind(RESOURCE_KIND)
        .bind(ContentStatus::Published);
    if let Some(TermFilter(term_id)) = term {
        query = query.bind(term_id);
    }
    query.bind(per_page).bind(offset).fetch_all(executor).await
}

#[instrument(skip(executor))]
pub async fn count_published<'a, E: PgExecutor<'a>>(
    executor: E,
    term: Option<TermFilter>,
) -> Result<i64, SqlxError> {
    let term_sql = if term.is_some() {
        "AND EXISTS (SELECT 1 FROM content_terms WHERE content_id = content_items.id AND term_id = $3)"
    } else {
        ""
    };
    let sql = format!(
        "SELECT COUNT(*) FROM content_items WHERE kind = $1 AND status = $2 {term_sql};"
    );
    let mut query = sqlx::query_scalar(&sql)
        .bind(RESOURCE_KIND)
        .bind(ContentStatus::Published);
    if let Some(TermFilter(term_id)) = term {
        query = query.bind(term_id);
    }
    query.fetch_one(executor).await
}

/// Taxonomy lookup: slug to opaque filter. An unknown slug is not an error;
/// the caller gets `None` and answers with an empty listing.
#[instrument(skip(executor))]
pub async fn resolve_term<'a, E: PgExecutor<'a>>(
    executor: E,
    kind: TermKind,
    slug: &str,
) -> Result<Option<TermFilter>, SqlxError> {
    let id: Option<TermId> =
        sqlx::query_scalar("SELECT id FROM terms WHERE kind = $1 AND slug = $2;")
            .bind(kind)
            .bind(slug)
            .fetch_optional(executor)
            .await?;
    Ok(id.map(TermFilter))
}

#[instrument(skip(executor))]
pub async fn create_term<'a, E: PgExecutor<'a>>(
    executor: E,
    kind: TermKind,
    slug: &str,
    name: &str,
) -> Result<TermId, SqlxError> {
    let id = sqlx::query("INSERT INTO terms (kind, slug, name) VALUES ($1, $2, $3) RETURNING id;")
        .bind(kind)
        .bind(slug)
        .bind(name)
        .fetch_one(executor)
        .await?
        .try_get("id")?;
    Ok(id)
}

#[instrument(skip(executor))]
pub async fn assign_term<'a, E: PgExecutor<'a>>(
    executor: E,
    content_id: ContentId,
    term_id: TermId,
) -> Result<(), SqlxError> {
    sqlx::query(
        "INSERT INTO content_terms (content_id, term_id) VALUES ($1, $2) ON CONFLICT DO NOTHING;",
    )
    .bind(content_id)
    .bind(term_id)
    .execute(executor)
    .await?;
    Ok(())
}

#[instrument(skip(executor))]
pub async fn terms_for_content<'a, E: PgExecutor<'a>>(
    executor: E,
    content_id: ContentId,
) -> Result<Vec<Term>, SqlxError> {
    sqlx::query_as(
        "
    SELECT
        terms.id AS id, terms.kind AS kind, terms.slug AS slug, terms.name AS name
    FROM
        content_terms JOIN terms ON content_terms.term_id = terms.id
    WHERE
        content_terms.content_id = $1
    ORDER BY
        terms.id;
    ",
    )
    .bind(content_id)
    .fetch_all(executor)
    .await
}

#[instrument(skip(executor))]
pub async fn count_by_status<'a, E: PgExecutor<'a>>(
    executor: E,
) -> Result<(i64, i64), SqlxError> {
    let rows: Vec<(ContentStatus, i64)> = sqlx::query_as(
        "SELECT status, COUNT(*) FROM content_items WHERE kind = $1 GROUP BY status;",
    )
    .bind(RESOURCE_KIND)
    .fetch_all(executor)
    .await?;
    let mut published = 0;
    let mut draft = 0;
    for (status, total) in rows {
        match status {
            ContentStatus::Published => published = total,
            ContentStatus::Draft => draft = total,
        }
    }
    Ok((published, draft))
}
