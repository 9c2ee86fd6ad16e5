use std::collections::HashMap;

use chrono::{DateTime, Datelike, Months, NaiveDate, NaiveTime, Utc};
use sqlx::{Error as SqlxError, PgExecutor};
use tracing::instrument;

use crate::database::connection::DbConnection;
use crate::models::content::{ContentStatus, RESOURCE_KIND};
use crate::models::event::ActionType;
use crate::models::stats::{MonthlyCount, TopViewedEntry, TrackingSummary};

impl DbConnection {
    pub async fn tracking_summary(&self) -> Result<TrackingSummary, SqlxError> {
        tracking_summary(self.pool()).await
    }

    pub async fn top_viewed(&self, limit: i64) -> Result<Vec<TopViewedEntry>, SqlxError> {
        top_viewed(self.pool(), limit).await
    }

    pub async fn published_per_month(&self, months: u32) -> Result<Vec<MonthlyCount>, SqlxError> {
        published_per_month(self.pool(), months).await
    }
}

#[instrument(skip(executor))]
pub async fn tracking_summary<'a, E: PgExecutor<'a>>(
    executor: E,
) -> Result<TrackingSummary, SqlxError> {
    let rows: Vec<(ActionType, i64)> = sqlx::query_as(
        "SELECT action_type, COUNT(*) FROM resource_events GROUP BY action_type;",
    )
    .fetch_all(executor)
    .await?;
    let mut summary = TrackingSummary::default();
    for (action, total) in rows {
        match action {
            ActionType::View => summary.views = total,
            ActionType::Download => summary.downloads = total,
        }
    }
    Ok(summary)
}

/// Most-viewed content items. The join is a LEFT JOIN on purpose: events may
/// outlive their content item, in which case the title comes back null.
/// `resource_id` breaks view-count ties so the result set is deterministic.
#[instrument(skip(executor))]
pub async fn top_viewed<'a, E: PgExecutor<'a>>(
    executor: E,
    limit: i64,
) -> Result<Vec<TopViewedEntry>, SqlxError> {
    sqlx::query_as(
        "
    SELECT
        events.resource_id AS resource_id, COUNT(*) AS view_count, contents.title AS title
    FROM
        resource_events events LEFT JOIN content_items contents ON contents.id = events.resource_id
    WHERE
        events.action_type = $1
    GROUP BY
        events.resource_id, contents.title
    ORDER BY
        view_count DESC, events.resource_id ASC
    LIMIT $2;
    ",
    )
    .bind(ActionType::View)
    .bind(limit.max(0))
    .fetch_all(executor)
    .await
}

/// Publish counts for the most recent `months` calendar months ending at the
/// current UTC month, oldest first. The expected bucket keys are computed up
/// front and absent months filled with zero, so callers never see gaps.
#[instrument(skip(executor))]
pub async fn published_per_month<'a, E: PgExecutor<'a>>(
    executor: E,
    months: u32,
) -> Result<Vec<MonthlyCount>, SqlxError> {
    let now = Utc::now();
    let keys = month_window(now, months);
    let window_start = window_start(now, months);

    let rows: Vec<(String, i64)> = sqlx::query_as(
        "
    SELECT
        to_char(created_at AT TIME ZONE 'UTC', 'YYYY-MM') AS month, COUNT(*)
    FROM
        content_items
    WHERE
        kind = $1 AND status = $2 AND created_at >= $3
    GROUP BY
        month;
    ",
    )
    .bind(RESOURCE_KIND)
    .bind(ContentStatus::Published)
    .bind(window_start)
    .fetch_all(executor)
    .await?;

    let mut counts: HashMap<String, i64> = rows.into_iter().collect();
    Ok(keys
        .into_iter()
        .map(|month| MonthlyCount {
            count: counts.remove(&month).unwrap_or(0),
            month,
        })
        .collect())
}

/// "YYYY-MM" keys for the last `months` calendar months ending at `now`'s
/// month, in ascending order.
fn month_window(now: DateTime<Utc>, months: u32) -> Vec<String> {
    let current = first_of_month(now);
    (0..months.max(1))
        .rev()
        .filter_map(|back| current.checked_sub_months(Months::new(back)))
        .map(|date| date.format("%Y-%m").to_string())
        .collect()
}

fn window_start(now: DateTime<Utc>, months: u32) -> DateTime<Utc> {
    let current = first_of_month(now);
    current
        .checked_sub_months(Months::new(months.max(1) - 1))
        .unwrap_or(current)
        .and_time(NaiveTime::MIN)
        .and_utc()
}

fn first_of_month(now: DateTime<Utc>) -> NaiveDate {
    let today = now.date_naive();
    NaiveDate::from_ymd_opt(today.year(), today.month(), 1).unwrap_or(today)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 15, 12, 30, 0).single().unwrap()
    }

    #[test]
    fn month_window_walks_back_in_ascending_order() {
        let keys = month_window(fixed_now(), 6);
        assert_eq!(
            keys,
            vec!["2025-10", "2025-11", "2025-12", "2026-01", "2026-02", "2026-03"]
        );
    }

    #[test]
    fn month_window_crosses_year_boundaries() {
        let keys = month_window(fixed_now(), 15);
        assert_eq!(keys.len(), 15);
        assert_eq!(keys.first().map(String::as_str), Some("2025-01"));
        assert_eq!(keys.last().map(String::as_str), Some("2026-03"));
    }

    #[test]
    fn month_window_never_returns_empty() {
        assert_eq!(month_window(fixed_now(), 0), vec!["2026-03"]);
        assert_eq!(month_window(fixed_now(), 1), vec!["2026-03"]);
    }

    #[test]
    fn window_start_is_first_day_of_oldest_month() {
        let start = window_start(fixed_now(), 6);
        assert_eq!(
            start,
            Utc.with_ymd_and_hms(2025, 10, 1, 0, 0, 0).single().unwrap()
        );
    }
}
