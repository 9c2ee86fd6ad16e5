use chrono::{Months, Utc};
use once_cell::sync::Lazy;
use tokio::sync::Mutex;

use crate::database::connection::{DbConfig, DbConnection};
use crate::models::content::{ContentStatus, CreateContentRequest, TermKind};
use crate::models::event::ActionType;
use crate::models::listing::{ResourceFilter, ResourceListingQuery, SortField};
use crate::models::resource::{ContentId, Difficulty, ResourcePatch, ResourceType};
use crate::models::settings::Settings;

/// Some tests can't run in parallel, prevent them from breaking each other's state
static SERIAL_LOCK: Lazy<Mutex<()>> = Lazy::new(Mutex::default);

async fn init_and_get_db() -> DbConnection {
    let _ = tracing_subscriber::fmt::try_init();

    let config = DbConfig::development("edures_db", "edures_guest", "edurespass");
    let db = DbConnection::connect(&config).await.unwrap();
    db.drop_schema().await.unwrap();
    db.init_schema().await.unwrap();
    db
}

fn content_request(title: &str, status: ContentStatus) -> CreateContentRequest {
    CreateContentRequest {
        title: title.to_string(),
        excerpt: format!("Excerpt for {title}"),
        permalink: format!("https://example.com/resources/{}", title.replace(' ', "-")),
        thumbnail_url: None,
        status,
        created_at: None,
    }
}

async fn seed_published(db: &DbConnection, title: &str) -> ContentId {
    db.create_content(&content_request(title, ContentStatus::Published))
        .await
        .unwrap()
}

fn filter_from(query: ResourceListingQuery) -> ResourceFilter {
    ResourceFilter::from_query(&query, 12)
}

#[tokio::test]
async fn upsert_round_trips_through_get() {
    let _lock = SERIAL_LOCK.lock().await;
    let db = init_and_get_db().await;

    let content_id = seed_published(&db, "Intro to Soldering").await;
    let patch = ResourcePatch {
        resource_url: Some(Some("https://example.com/soldering.pdf".to_string())),
        resource_type: Some(Some(ResourceType::Pdf)),
        difficulty: Some(Difficulty::Intermediate),
        duration_minutes: Some(45),
        is_featured: Some(true),
    };
    db.upsert_resource(content_id, &patch, Difficulty::Beginner)
        .await
        .unwrap();

    let resource = db.get_resource(content_id).await.unwrap().unwrap();
    assert_eq!(resource.content_id, content_id);
    assert_eq!(
        resource.resource_url.as_deref(),
        Some("https://example.com/soldering.pdf")
    );
    assert_eq!(resource.resource_type, Some(ResourceType::Pdf));
    assert_eq!(resource.difficulty, Difficulty::Intermediate);
    assert_eq!(resource.duration_minutes, 45);
    assert_eq!(resource.download_count, 0);
    assert!(resource.is_featured);

    assert!(db.get_resource(content_id + 1).await.unwrap().is_none());
}

#[tokio::test]
async fn second_upsert_updates_in_place() {
    let _lock = SERIAL_LOCK.lock().await;
    let db = init_and_get_db().await;

    let content_id = seed_published(&db, "Rust for Beginners").await;
    let first = ResourcePatch {
        resource_url: Some(Some("https://example.com/rust-course".to_string())),
        resource_type: Some(Some(ResourceType::Course)),
        duration_minutes: Some(90),
        ..Default::default()
    };
    db.upsert_resource(content_id, &first, Difficulty::Beginner)
        .await
        .unwrap();

    let second = ResourcePatch {
        duration_minutes: Some(120),
        is_featured: Some(true),
        ..Default::default()
    };
    db.upsert_resource(content_id, &second, Difficulty::Beginner)
        .await
        .unwrap();

    let total = db
        .count_resources(&filter_from(ResourceListingQuery::default()))
        .await
        .unwrap();
    assert_eq!(total, 1);

    let resource = db.get_resource(content_id).await.unwrap().unwrap();
    assert_eq!(
        resource.resource_url.as_deref(),
        Some("https://example.com/rust-course")
    );
    assert_eq!(resource.resource_type, Some(ResourceType::Course));
    assert_eq!(resource.difficulty, Difficulty::Beginner);
    assert_eq!(resource.duration_minutes, 120);
    assert!(resource.is_featured);
    assert!(resource.updated_at >= resource.created_at);
}

#[tokio::test]
async fn new_row_picks_up_default_difficulty() {
    let _lock = SERIAL_LOCK.lock().await;
    let db = init_and_get_db().await;

    let content_id = seed_published(&db, "Advanced Category Theory").await;
    db.upsert_resource(content_id, &ResourcePatch::default(), Difficulty::Advanced)
        .await
        .unwrap();
    let resource = db.get_resource(content_id).await.unwrap().unwrap();
    assert_eq!(resource.difficulty, Difficulty::Advanced);

    // An update without a difficulty must not overwrite the stored one.
    db.upsert_resource(
        content_id,
        &ResourcePatch {
            duration_minutes: Some(10),
            ..Default::default()
        },
        Difficulty::Beginner,
    )
    .await
    .unwrap();
    let resource = db.get_resource(content_id).await.unwrap().unwrap();
    assert_eq!(resource.difficulty, Difficulty::Advanced);
}

#[tokio::test]
async fn download_counter_increments_atomically() {
    let _lock = SERIAL_LOCK.lock().await;
    let db = init_and_get_db().await;

    let content_id = seed_published(&db, "Printable Flashcards").await;
    db.upsert_resource(content_id, &ResourcePatch::default(), Difficulty::Beginner)
        .await
        .unwrap();

    for _ in 0..3 {
        assert!(db.increment_download_count(content_id).await.unwrap());
    }
    let resource = db.get_resource(content_id).await.unwrap().unwrap();
    assert_eq!(resource.download_count, 3);

    // Missing row: reported as failure, nothing written.
    assert!(!db.increment_download_count(content_id + 100).await.unwrap());
}

#[tokio::test]
async fn events_feed_tracking_summary() {
    let _lock = SERIAL_LOCK.lock().await;
    let db = init_and_get_db().await;

    let content_id = seed_published(&db, "Physics Lecture").await;
    db.record_event(content_id, ActionType::View, Some(0), "203.0.113.77")
        .await
        .unwrap();
    db.record_event(content_id, ActionType::Download, Some(42), "bogus-address")
        .await
        .unwrap();

    let summary = db.tracking_summary().await.unwrap();
    assert_eq!(summary.views, 1);
    assert_eq!(summary.downloads, 1);

    // A zero actor id is stored as anonymous, and only anonymized or empty
    // addresses ever land in the table.
    let stored: Vec<(Option<i64>, String)> =
        sqlx::query_as("SELECT user_id, user_ip FROM resource_events ORDER BY id;")
            .fetch_all(db.pool())
            .await
            .unwrap();
    assert_eq!(stored[0], (None, "203.0.113.0".to_string()));
    assert_eq!(stored[1], (Some(42), String::new()));
}

#[tokio::test]
async fn top_viewed_is_ordered_and_tolerates_dangling_references() {
    let _lock = SERIAL_LOCK.lock().await;
    let db = init_and_get_db().await;

    let chemistry = seed_published(&db, "Chemistry Basics").await;
    let biology = seed_published(&db, "Biology Basics").await;
    let geology = seed_published(&db, "Geology Basics").await;

    for _ in 0..3 {
        db.record_event(chemistry, ActionType::View, None, "10.1.2.3")
            .await
            .unwrap();
    }
    db.record_event(biology, ActionType::View, None, "10.1.2.3")
        .await
        .unwrap();
    for _ in 0..2 {
        db.record_event(geology, ActionType::View, None, "10.1.2.3")
            .await
            .unwrap();
    }
    // Downloads must not count as views.
    db.record_event(biology, ActionType::Download, None, "10.1.2.3")
        .await
        .unwrap();

    let top = db.top_viewed(2).await.unwrap();
    assert_eq!(top.len(), 2);
    assert_eq!(top[0].resource_id, chemistry);
    assert_eq!(top[0].view_count, 3);
    assert_eq!(top[0].title.as_deref(), Some("Chemistry Basics"));
    assert_eq!(top[1].resource_id, geology);
    assert_eq!(top[1].view_count, 2);

    // Deleting the content keeps its events; the title goes null.
    assert!(db.delete_content(chemistry).await.unwrap());
    let top = db.top_viewed(1).await.unwrap();
    assert_eq!(top[0].resource_id, chemistry);
    assert_eq!(top[0].view_count, 3);
    assert_eq!(top[0].title, None);
}

#[tokio::test]
async fn delete_content_cascades_to_resource_meta() {
    let _lock = SERIAL_LOCK.lock().await;
    let db = init_and_get_db().await;

    let content_id = seed_published(&db, "Orphaned Resource").await;
    db.upsert_resource(content_id, &ResourcePatch::default(), Difficulty::Beginner)
        .await
        .unwrap();

    assert!(db.delete_content(content_id).await.unwrap());
    assert!(db.get_content(content_id).await.unwrap().is_none());
    assert!(db.get_resource(content_id).await.unwrap().is_none());
    assert!(!db.delete_content(content_id).await.unwrap());
}

#[tokio::test]
async fn published_per_month_gap_fills_missing_months() {
    let _lock = SERIAL_LOCK.lock().await;
    let db = init_and_get_db().await;

    let now = Utc::now();
    let two_months_ago = now.checked_sub_months(Months::new(2)).unwrap();

    db.create_content(&content_request("Fresh Item", ContentStatus::Published))
        .await
        .unwrap();
    db.create_content(&CreateContentRequest {
        created_at: Some(two_months_ago),
        ..content_request("Older Item", ContentStatus::Published)
    })
    .await
    .unwrap();
    // Drafts never count.
    db.create_content(&CreateContentRequest {
        created_at: Some(two_months_ago),
        ..content_request("Unfinished Item", ContentStatus::Draft)
    })
    .await
    .unwrap();

    let series = db.published_per_month(6).await.unwrap();
    assert_eq!(series.len(), 6);

    let months: Vec<&str> = series.iter().map(|entry| entry.month.as_str()).collect();
    let mut sorted = months.clone();
    sorted.sort();
    assert_eq!(months, sorted);
    assert_eq!(months[5], now.format("%Y-%m").to_string());

    assert_eq!(series[5].count, 1);
    assert_eq!(series[3].count, 1);
    assert_eq!(series[0].count, 0);
    assert_eq!(series[1].count, 0);
}

#[tokio::test]
async fn listing_paginates_and_clamps() {
    let _lock = SERIAL_LOCK.lock().await;
    let db = init_and_get_db().await;

    for n in 0..25 {
        let content_id = seed_published(&db, &format!("Resource {n:02}")).await;
        db.upsert_resource(content_id, &ResourcePatch::default(), Difficulty::Beginner)
            .await
            .unwrap();
    }

    let total = db
        .count_resources(&filter_from(ResourceListingQuery::default()))
        .await
        .unwrap();
    assert_eq!(total, 25);

    let page_3 = db
        .list_resources(&filter_from(ResourceListingQuery {
            per_page: Some(10),
            page: Some(3),
            ..Default::default()
        }))
        .await
        .unwrap();
    assert_eq!(page_3.len(), 5);

    let page_4 = db
        .list_resources(&filter_from(ResourceListingQuery {
            per_page: Some(10),
            page: Some(4),
            ..Default::default()
        }))
        .await
        .unwrap();
    assert!(page_4.is_empty());
}

#[tokio::test]
async fn listing_filters_and_sorts() {
    let _lock = SERIAL_LOCK.lock().await;
    let db = init_and_get_db().await;

    let fixtures = [
        ("Long Video", ResourceType::Video, 120),
        ("Short Video", ResourceType::Video, 10),
        ("Deep Article", ResourceType::Article, 30),
    ];
    for (title, resource_type, minutes) in fixtures {
        let content_id = seed_published(&db, title).await;
        db.upsert_resource(
            content_id,
            &ResourcePatch {
                resource_type: Some(Some(resource_type)),
                duration_minutes: Some(minutes),
                ..Default::default()
            },
            Difficulty::Beginner,
        )
        .await
        .unwrap();
    }

    let videos_only = filter_from(ResourceListingQuery {
        resource_type: Some("video".to_string()),
        orderby: Some("duration_minutes".to_string()),
        order: Some("asc".to_string()),
        ..Default::default()
    });
    let videos = db.list_resources(&videos_only).await.unwrap();
    assert_eq!(videos.len(), 2);
    assert_eq!(videos[0].duration_minutes, 10);
    assert_eq!(videos[1].duration_minutes, 120);
    assert_eq!(db.count_resources(&videos_only).await.unwrap(), 2);

    // A hostile orderby degrades to the default ordering instead of erroring.
    let hostile = filter_from(ResourceListingQuery {
        orderby: Some("id; DROP TABLE resource_meta".to_string()),
        ..Default::default()
    });
    assert_eq!(hostile.sort, SortField::CreatedAt);
    let all = db.list_resources(&hostile).await.unwrap();
    assert_eq!(all.len(), 3);
}

#[tokio::test]
async fn taxonomy_filters_published_listing() {
    let _lock = SERIAL_LOCK.lock().await;
    let db = init_and_get_db().await;

    let tagged = seed_published(&db, "Algebra Workbook").await;
    let _untagged = seed_published(&db, "History Reader").await;
    let draft = db
        .create_content(&content_request("Algebra Draft", ContentStatus::Draft))
        .await
        .unwrap();

    let term_id = db
        .create_term(TermKind::Category, "mathematics", "Mathematics")
        .await
        .unwrap();
    db.assign_term(tagged, term_id).await.unwrap();
    db.assign_term(draft, term_id).await.unwrap();

    let term = db
        .resolve_term(TermKind::Category, "mathematics")
        .await
        .unwrap()
        .expect("term should resolve");
    let listed = db.list_published(Some(term), 1, 10).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, tagged);
    assert_eq!(db.count_published(Some(term)).await.unwrap(), 1);

    assert!(db
        .resolve_term(TermKind::Category, "underwater-basket-weaving")
        .await
        .unwrap()
        .is_none());

    let terms = db.terms_for_content(tagged).await.unwrap();
    assert_eq!(terms.len(), 1);
    assert_eq!(terms[0].slug, "mathematics");
}

#[tokio::test]
async fn settings_round_trip_with_clamping() {
    let _lock = SERIAL_LOCK.lock().await;
    let db = init_and_get_db().await;

    let defaults = db.load_settings().await.unwrap();
    assert_eq!(defaults, Settings::default());

    let update = Settings {
        resources_per_page: 500,
        enable_rest_api: false,
        default_difficulty: Difficulty::Advanced,
        enable_download_count: false,
    }
    .clamped();
    db.save_settings(&update).await.unwrap();

    let loaded = db.load_settings().await.unwrap();
    assert_eq!(loaded.resources_per_page, 100);
    assert!(!loaded.enable_rest_api);
    assert_eq!(loaded.default_difficulty, Difficulty::Advanced);
    assert!(!loaded.enable_download_count);
}
