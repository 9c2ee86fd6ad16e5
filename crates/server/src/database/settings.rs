use sqlx::{Error as SqlxError, PgExecutor};
use tracing::instrument;

use crate::database::connection::DbConnection;
use crate::models::settings::Settings;

impl DbConnection {
    pub async fn load_settings(&self) -> Result<Settings, SqlxError> {
        load_settings(self.pool()).await
    }

    pub async fn save_settings(&self, settings: &Settings) -> Result<(), SqlxError> {
        save_settings(self.pool(), settings).await
    }
}

/// Read per request. The row is seeded at schema creation, but a missing
/// row still resolves to the defaults rather than failing the request.
#[instrument(skip(executor))]
pub async fn load_settings<'a, E: PgExecutor<'a>>(executor: E) -> Result<Settings, SqlxError> {
    let settings: Option<Settings> = sqlx::query_as(
        "SELECT resources_per_page, enable_rest_api, default_difficulty, enable_download_count \
         FROM app_settings WHERE id = 1;",
    )
    .fetch_optional(executor)
    .await?;
    Ok(settings.unwrap_or_default())
}

#[instrument(skip_all)]
pub async fn save_settings<'a, E: PgExecutor<'a>>(
    executor: E,
    settings: &Settings,
) -> Result<(), SqlxError> {
    sqlx::query(
        "
            INSERT INTO app_settings (id, resources_per_page, enable_rest_api, default_difficulty, enable_download_count)
            VALUES (1, $1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE SET
                resources_per_page = $1,
                enable_rest_api = $2,
                default_difficulty = $3,
                enable_download_count = $4;
        ",
    )
    .bind(settings.resources_per_page)
    .bind(settings.enable_rest_api)
    .bind(settings.default_difficulty)
    .bind(settings.enable_download_count)
    .execute(executor)
    .await?;
    Ok(())
}
