//! Integration tests for the application log repository.

use chrono::{Duration, Utc};
use siteward_core::models::log_entry::CreateLogEntry;
use siteward_core::repository::{LogRepository, Pagination};
use siteward_db::repository::SurrealLogRepository;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};

async fn setup() -> SurrealLogRepository<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    siteward_db::run_migrations(&db).await.unwrap();
    SurrealLogRepository::new(db)
}

fn entry(message: &str, age_minutes: i64) -> CreateLogEntry {
    CreateLogEntry {
        logged_at: Utc::now() - Duration::minutes(age_minutes),
        ip_address: "10.0.0.1".into(),
        culture: "en-US".into(),
        url: "/admin/sites".into(),
        short_url: "/admin/sites".into(),
        thread: "main 1".into(),
        log_level: "INFO".into(),
        logger: "siteward_admin::service".into(),
        message: message.into(),
    }
}

#[tokio::test]
async fn create_and_list_newest_first() {
    let repo = setup().await;

    repo.create(entry("old", 30)).await.unwrap();
    repo.create(entry("new", 1)).await.unwrap();
    repo.create(entry("middle", 10)).await.unwrap();

    let page = repo.list(Pagination::default()).await.unwrap();
    assert_eq!(page.total, 3);
    let messages: Vec<&str> = page.items.iter().map(|e| e.message.as_str()).collect();
    assert_eq!(messages, vec!["new", "middle", "old"]);
    assert_eq!(page.items[0].culture, "en-US");
}

#[tokio::test]
async fn delete_single_and_older_than() {
    let repo = setup().await;

    let stale = repo.create(entry("stale", 120)).await.unwrap();
    repo.create(entry("old", 60)).await.unwrap();
    repo.create(entry("fresh", 0)).await.unwrap();

    repo.delete(stale.id).await.unwrap();
    assert_eq!(repo.list(Pagination::default()).await.unwrap().total, 2);

    repo.delete_older_than(Utc::now() - Duration::minutes(30))
        .await
        .unwrap();
    let page = repo.list(Pagination::default()).await.unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].message, "fresh");

    repo.delete_all().await.unwrap();
    assert_eq!(repo.list(Pagination::default()).await.unwrap().total, 0);
}

#[tokio::test]
async fn rejected_deletes_are_reported() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    siteward_db::run_migrations(&db).await.unwrap();
    db.query(
        "DEFINE EVENT retain_logs ON TABLE log_entry \
         WHEN $event = 'DELETE' THEN { THROW 'log entries are retained' }",
    )
    .await
    .unwrap()
    .check()
    .unwrap();
    let repo = SurrealLogRepository::new(db);

    let kept = repo.create(entry("kept", 120)).await.unwrap();

    assert!(repo.delete(kept.id).await.is_err());
    assert!(
        repo.delete_older_than(Utc::now() - Duration::minutes(30))
            .await
            .is_err()
    );
    assert!(repo.delete_all().await.is_err());
    assert_eq!(repo.list(Pagination::default()).await.unwrap().total, 1);
}
