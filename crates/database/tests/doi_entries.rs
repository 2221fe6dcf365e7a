//! Integration tests for DoiEntryService against PostgreSQL.
//! Run with: DATABASE_URL=postgres://... cargo test -p database -- --ignored

use database::{config::DatabaseSettings, db::create_connection, services::doi_entry::DoiEntryService};
use models::{DoiEntry, SearchVector};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, DbErr, Statement};
use std::collections::BTreeSet;
use uuid::Uuid;

async fn migrated_database() -> DatabaseConnection {
    let url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set for database integration tests");

    let admin = Database::connect(url.as_str()).await.unwrap();
    let schema = format!("database_test_{}", Uuid::new_v4().simple());
    admin
        .execute_unprepared(&format!("CREATE SCHEMA {schema}"))
        .await
        .unwrap();

    let mut settings = DatabaseSettings::new(url);
    settings.max_connections = 1;
    settings.schema = Some(schema);

    let db = create_connection(&settings).await.unwrap();
    migration::apply_pending(&db).await.unwrap();
    db
}

fn smith2023() -> DoiEntry {
    DoiEntry {
        cite_key: "smith2023".to_string(),
        bib_type: "article".to_string(),
        doi: "10.1145/1234567".to_string(),
        url: "https://doi.org/10.1145/1234567".to_string(),
        author: "Smith, J.".to_string(),
        title: "Graph Algorithms".to_string(),
        journal: "J. Comp.".to_string(),
        publisher: "ACM".to_string(),
        volume: 12,
        number: 3,
        month: "jan".to_string(),
        year: 2023,
    }
}

fn lexemes(vector: &SearchVector) -> BTreeSet<String> {
    vector.lexemes().map(str::to_string).collect()
}

/// Union of the `simple` tokens of the four source fields, computed by Postgres
async fn expected_lexemes(db: &DatabaseConnection, entry: &DoiEntry) -> BTreeSet<String> {
    let mut union = BTreeSet::new();
    for field in [&entry.title, &entry.author, &entry.journal, &entry.publisher] {
        let text: String = db
            .query_one(Statement::from_sql_and_values(
                db.get_database_backend(),
                "SELECT to_tsvector('simple', $1)::text AS tokens",
                [field.as_str().into()],
            ))
            .await
            .unwrap()
            .unwrap()
            .try_get("", "tokens")
            .unwrap();
        let vector: SearchVector = text.parse().unwrap();
        union.extend(lexemes(&vector));
    }
    union
}

async fn row_count(db: &DatabaseConnection) -> i64 {
    db.query_one(Statement::from_string(
        db.get_database_backend(),
        "SELECT count(*) AS total FROM doi_entries",
    ))
    .await
    .unwrap()
    .unwrap()
    .try_get("", "total")
    .unwrap()
}

#[tokio::test]
#[ignore]
async fn pg_insert_and_read_back() {
    let db = migrated_database().await;

    let inserted = DoiEntryService::insert(&db, smith2023()).await.unwrap();
    assert_eq!(inserted, smith2023());

    let found = DoiEntryService::find(&db, "smith2023").await.unwrap();
    assert_eq!(found, Some(smith2023()));
    assert_eq!(DoiEntryService::find(&db, "missing").await.unwrap(), None);
}

#[tokio::test]
#[ignore]
async fn pg_duplicate_cite_key_rejected() {
    let db = migrated_database().await;
    DoiEntryService::insert(&db, smith2023()).await.unwrap();

    let mut other = smith2023();
    other.title = "Another Title".to_string();
    assert!(DoiEntryService::insert(&db, other).await.is_err());

    let stored = DoiEntryService::find(&db, "smith2023").await.unwrap().unwrap();
    assert_eq!(stored.title, "Graph Algorithms");
}

#[tokio::test]
#[ignore]
async fn pg_search_vector_follows_source_fields() {
    let db = migrated_database().await;
    let mut entry = smith2023();
    DoiEntryService::insert(&db, entry.clone()).await.unwrap();

    let vector = DoiEntryService::search_vector(&db, "smith2023")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(lexemes(&vector), expected_lexemes(&db, &entry).await);
    assert_eq!(
        lexemes(&vector),
        ["acm", "algorithms", "comp", "graph", "j", "smith"]
            .into_iter()
            .map(str::to_string)
            .collect()
    );

    entry.title = "Network Flows".to_string();
    DoiEntryService::update(&db, entry.clone()).await.unwrap();

    let vector = DoiEntryService::search_vector(&db, "smith2023")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(lexemes(&vector), expected_lexemes(&db, &entry).await);
    assert!(vector.contains("network"));
    assert!(!vector.contains("graph"));

    entry.publisher = "Springer".to_string();
    DoiEntryService::update(&db, entry.clone()).await.unwrap();

    let vector = DoiEntryService::search_vector(&db, "smith2023")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(lexemes(&vector), expected_lexemes(&db, &entry).await);
    assert!(!vector.contains("acm"));
}

#[tokio::test]
#[ignore]
async fn pg_search_column_is_not_writable() {
    let db = migrated_database().await;
    DoiEntryService::insert(&db, smith2023()).await.unwrap();

    let result = db
        .execute_unprepared(
            "UPDATE doi_entries SET search = to_tsvector('simple', 'forged') WHERE cite_key = 'smith2023'",
        )
        .await;
    assert!(result.is_err());

    let vector = DoiEntryService::search_vector(&db, "smith2023")
        .await
        .unwrap()
        .unwrap();
    assert!(!vector.contains("forged"));
}

#[tokio::test]
#[ignore]
async fn pg_missing_field_rejected() {
    let db = migrated_database().await;

    let result = db
        .execute_unprepared(
            "INSERT INTO doi_entries
             (cite_key, bib_type, doi, url, author, title, journal, publisher, volume, number, month, year)
             VALUES ('partial', 'article', '10.1/x', 'https://doi.org/10.1/x', 'Smith, J.',
                     'Graph Algorithms', NULL, 'ACM', 1, 2, 'jan', 2023)",
        )
        .await;
    assert!(result.is_err());

    let result = db
        .execute_unprepared(
            "INSERT INTO doi_entries (cite_key, bib_type, doi, url, author, title, journal, publisher)
             VALUES ('partial', 'article', '10.1/x', 'https://doi.org/10.1/x', 'Smith, J.',
                     'Graph Algorithms', 'J. Comp.', 'ACM')",
        )
        .await;
    assert!(result.is_err());

    assert_eq!(row_count(&db).await, 0);
}

#[tokio::test]
#[ignore]
async fn pg_token_search_scenario() {
    let db = migrated_database().await;
    DoiEntryService::insert(&db, smith2023()).await.unwrap();

    let hits = DoiEntryService::search(&db, "graph").await.unwrap();
    assert_eq!(
        hits.iter().map(|e| e.cite_key.as_str()).collect::<Vec<_>>(),
        vec!["smith2023"]
    );

    // Matching is case-insensitive and covers every source field
    for query in ["GRAPH", "smith", "comp", "acm"] {
        let hits = DoiEntryService::search(&db, query).await.unwrap();
        assert_eq!(hits.len(), 1, "no hit for {query}");
    }

    assert!(DoiEntryService::search(&db, "unrelated").await.unwrap().is_empty());
    assert!(DoiEntryService::search(&db, "   ").await.unwrap().is_empty());
}

#[tokio::test]
#[ignore]
async fn pg_update_and_delete_require_existing_entry() {
    let db = migrated_database().await;

    let err = DoiEntryService::update(&db, smith2023()).await.unwrap_err();
    assert!(matches!(err, DbErr::RecordNotUpdated));
    assert!(!DoiEntryService::delete(&db, "smith2023").await.unwrap());

    DoiEntryService::insert(&db, smith2023()).await.unwrap();
    assert!(DoiEntryService::delete(&db, "smith2023").await.unwrap());
    assert_eq!(DoiEntryService::find(&db, "smith2023").await.unwrap(), None);
    assert!(DoiEntryService::list(&db).await.unwrap().is_empty());
}

#[tokio::test]
#[ignore]
async fn pg_list_is_ordered_by_cite_key() {
    let db = migrated_database().await;

    for key in ["zhang2021", "adams2019", "miller2020"] {
        let mut entry = smith2023();
        entry.cite_key = key.to_string();
        DoiEntryService::insert(&db, entry).await.unwrap();
    }

    let keys: Vec<String> = DoiEntryService::list(&db)
        .await
        .unwrap()
        .into_iter()
        .map(|entry| entry.cite_key)
        .collect();
    assert_eq!(keys, vec!["adams2019", "miller2020", "zhang2021"]);
}
