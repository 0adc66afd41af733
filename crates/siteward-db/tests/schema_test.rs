//! Integration tests for schema initialization using in-memory SurrealDB.

use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use surrealdb_types::SurrealValue;

#[tokio::test]
async fn schema_migration_applies_successfully() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();

    siteward_db::run_migrations(&db).await.unwrap();

    let mut result = db.query("INFO FOR DB").await.unwrap();
    let info: Option<surrealdb_types::Value> = result.take(0).unwrap();
    let info_str = format!("{:?}", info.expect("INFO FOR DB should return a value"));

    assert!(info_str.contains("site"), "missing site table");
    assert!(info_str.contains("site_host"), "missing site_host table");
    assert!(info_str.contains("log_entry"), "missing log_entry table");
    assert!(info_str.contains("_migration"), "missing _migration table");
}

#[tokio::test]
async fn migrations_are_idempotent() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();

    siteward_db::run_migrations(&db).await.unwrap();
    siteward_db::run_migrations(&db).await.unwrap();

    #[derive(Debug, surrealdb_types::SurrealValue)]
    struct Row {
        total: u64,
    }

    let mut result = db
        .query("SELECT count() AS total FROM _migration GROUP ALL")
        .await
        .unwrap();
    let rows: Vec<Row> = result.take(0).unwrap();
    assert_eq!(rows[0].total, 1, "schema v1 recorded exactly once");
}
