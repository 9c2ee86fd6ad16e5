use sqlx::{Error as SqlxError, Postgres, Transaction};
use tracing::instrument;

use crate::database::connection::DbConnection;

impl DbConnection {
    pub async fn init_schema(&self) -> Result<(), SqlxError> {
        let mut transaction = self.pool().begin().await?;
        create_all_types(&mut transaction).await?;
        create_all_tables(&mut transaction).await?;
        seed_default_settings(&mut transaction).await?;
        transaction.commit().await?;
        Ok(())
    }
    pub async fn drop_schema(&self) -> Result<(), SqlxError> {
        let mut transaction = self.pool().begin().await?;
        drop_all_tables(&mut transaction).await?;
        drop_all_types(&mut transaction).await?;
        transaction.commit().await?;
        Ok(())
    }
}

#[instrument(skip_all)]
pub async fn create_all_types(
    transaction: &mut Transaction<'_, Postgres>,
) -> Result<(), SqlxError> {
    let statements = [
        "CREATE TYPE content_status AS ENUM ('draft', 'published');",
        "CREATE TYPE term_kind AS ENUM ('category', 'tag');",
        "CREATE TYPE resource_type AS ENUM ('article', 'video', 'podcast', 'pdf', 'course', 'book', 'infographic', 'tool', 'other');",
        "CREATE TYPE difficulty AS ENUM ('beginner', 'intermediate', 'advanced');",
        "CREATE TYPE action_type AS ENUM ('view', 'download');",
    ];
    for statement in &statements {
        sqlx::query(statement).execute(transaction.as_mut()).await?;
    }
    Ok(())
}

#[instrument(skip_all)]
pub async fn drop_all_types(transaction: &mut Transaction<'_, Postgres>) -> Result<(), SqlxError> {
    let statements = [
        "DROP TYPE IF EXISTS action_type;",
        "DROP TYPE IF EXISTS difficulty;",
        "DROP TYPE IF EXISTS resource_type;",
        "DROP TYPE IF EXISTS term_kind;",
        "DROP TYPE IF EXISTS content_status;",
    ];
    for statement in &statements {
        sqlx::query(statement).execute(transaction.as_mut()).await?;
    }
    Ok(())
}

#[instrument(skip_all)]
pub async fn create_all_tables(
    transaction: &mut Transaction<'_, Postgres>,
) -> Result<(), SqlxError> {
    sqlx::query(
        "
            CREATE TABLE content_items (
                id              bigint PRIMARY KEY GENERATED ALWAYS AS IDENTITY,
                kind            VARCHAR(50) NOT NULL,
                title           VARCHAR(255) NOT NULL,
                excerpt         VARCHAR(1000) NOT NULL DEFAULT '',
                permalink       VARCHAR(2000) NOT NULL,
                thumbnail_url   VARCHAR(2000),
                status          content_status NOT NULL DEFAULT 'draft',
                created_at      TIMESTAMPTZ NOT NULL DEFAULT now(),
                updated_at      TIMESTAMPTZ NOT NULL DEFAULT now()
            );
        ",
    )
    .execute(transaction.as_mut())
    .await?;
    sqlx::query(
        "
            CREATE TABLE terms (
                id      bigint PRIMARY KEY GENERATED ALWAYS AS IDENTITY,
                kind    term_kind NOT NULL,
                slug    VARCHAR(200) NOT NULL,
                name    VARCHAR(200) NOT NULL,
                CONSTRAINT term_kind_slug_key UNIQUE (kind, slug)
            );
        ",
    )
    .execute(transaction.as_mut())
    .await?;
    sqlx::query(
        "
            CREATE TABLE content_terms (
                content_id  bigint NOT NULL REFERENCES content_items(id) ON UPDATE CASCADE ON DELETE CASCADE,
                term_id     bigint NOT NULL REFERENCES terms(id) ON UPDATE CASCADE ON DELETE CASCADE,
                CONSTRAINT content_term_pkey PRIMARY KEY (content_id, term_id)
            );
        ",
    )
    .execute(transaction.as_mut())
    .await?;
    // content_id deliberately carries no foreign key: the cascade on content
    // deletion is performed by the caller, not the database.
    sqlx::query(
        "
            CREATE TABLE resource_meta (
                id                  bigint PRIMARY KEY GENERATED ALWAYS AS IDENTITY,
                content_id          bigint NOT NULL UNIQUE,
                resource_url        VARCHAR(2000),
                resource_type       resource_type,
                difficulty          difficulty NOT NULL DEFAULT 'beginner',
                duration_minutes    int NOT NULL DEFAULT 0 CHECK (duration_minutes >= 0),
                download_count      bigint NOT NULL DEFAULT 0,
                is_featured         BOOLEAN NOT NULL DEFAULT FALSE,
                created_at          TIMESTAMPTZ NOT NULL DEFAULT now(),
                updated_at          TIMESTAMPTZ NOT NULL DEFAULT now()
            );
        ",
    )
    .execute(transaction.as_mut())
    .await?;
    sqlx::query("CREATE INDEX resource_meta_type_idx ON resource_meta (resource_type);")
        .execute(transaction.as_mut())
        .await?;
    sqlx::query("CREATE INDEX resource_meta_difficulty_idx ON resource_meta (difficulty);")
        .execute(transaction.as_mut())
        .await?;
    sqlx::query("CREATE INDEX resource_meta_featured_idx ON resource_meta (is_featured);")
        .execute(transaction.as_mut())
        .await?;
    // Append-only; resource_id may outlive its content item, so no
    // foreign key here either.
    sqlx::query(
        "
            CREATE TABLE resource_events (
                id              bigint PRIMARY KEY GENERATED ALWAYS AS IDENTITY,
                resource_id     bigint NOT NULL,
                user_id         bigint,
                action_type     action_type NOT NULL,
                action_date     TIMESTAMPTZ NOT NULL DEFAULT now(),
                user_ip         VARCHAR(45) NOT NULL DEFAULT ''
            );
        ",
    )
    .execute(transaction.as_mut())
    .await?;
    sqlx::query(
        "CREATE INDEX resource_events_resource_idx ON resource_events (resource_id, action_type);",
    )
    .execute(transaction.as_mut())
    .await?;
    sqlx::query(
        "
            CREATE TABLE app_settings (
                id                      smallint PRIMARY KEY DEFAULT 1 CHECK (id = 1),
                resources_per_page      int NOT NULL DEFAULT 12,
                enable_rest_api         BOOLEAN NOT NULL DEFAULT TRUE,
                default_difficulty      difficulty NOT NULL DEFAULT 'beginner',
                enable_download_count   BOOLEAN NOT NULL DEFAULT TRUE
            );
        ",
    )
    .execute(transaction.as_mut())
    .await?;
    Ok(())
}

#[instrument(skip_all)]
pub async fn drop_all_tables(transaction: &mut Transaction<'_, Postgres>) -> Result<(), SqlxError> {
    let statements = [
        "DROP TABLE IF EXISTS app_settings;",
        "DROP TABLE IF EXISTS resource_events;",
        "DROP TABLE IF EXISTS resource_meta;",
        "DROP TABLE IF EXISTS content_terms;",
        "DROP TABLE IF EXISTS terms;",
        "DROP TABLE IF EXISTS content_items;",
    ];
    for statement in &statements {
        sqlx::query(statement).execute(transaction.as_mut()).await?;
    }
    Ok(())
}

#[instrument(skip_all)]
pub async fn seed_default_settings(
    transaction: &mut Transaction<'_, Postgres>,
) -> Result<(), SqlxError> {
    sqlx::query("INSERT INTO app_settings DEFAULT VALUES;")
        .execute(transaction.as_mut())
        .await?;
    Ok(())
}
