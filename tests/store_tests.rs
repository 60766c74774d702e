// tests/store_tests.rs

use ielts_backend::{
    error::StoreError,
    models::{
        Record,
        content::{Question, TypeGroup},
        listening::{ListeningPart, ListeningSet},
    },
    store::{ColumnValue, Conditions, Page, RECORD_ID_SPACE, RecordStore, UpsertMode, into_record},
};
use serde_json::{Map, json};
use sqlx::postgres::PgPoolOptions;

async fn store() -> RecordStore {
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url)
        .await
        .expect("Failed to connect to Postgres for testing. Make sure DATABASE_URL is set.");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    RecordStore::new(pool)
}

fn unique_name(prefix: &str) -> String {
    format!("{}_{}", prefix, uuid::Uuid::new_v4())
}

fn part(name: &str) -> ListeningPart {
    ListeningPart {
        id: 0,
        name: name.to_string(),
        source_type: 1,
        type_list: vec![TypeGroup {
            kind: "multi_choice".to_string(),
            question_list: vec![
                Question {
                    no: "1".to_string(),
                    answer: json!(["A", "C"]),
                    extra: Map::new(),
                },
                Question {
                    no: "2".to_string(),
                    answer: json!(7),
                    extra: Map::new(),
                },
            ],
            extra: Map::new(),
        }],
        user_id: None,
    }
}

#[tokio::test]
async fn created_record_reads_back_unchanged() {
    let store = store().await;
    let table = ListeningPart::TABLE;
    let original = part(&unique_name("round_trip"));

    let id = store
        .upsert(&table, &original, UpsertMode::Create)
        .await
        .unwrap()
        .expect("create returns the new id");

    let row = store.get_by_id(&table, id).await.unwrap();
    assert_eq!(row["id"], ColumnValue::Int(id));
    assert!(row["type_list"].as_list().is_some());
    assert_eq!(row["user_id"], ColumnValue::Null);

    let loaded: ListeningPart = into_record(row).unwrap();
    assert_eq!(loaded.id, id);
    assert_eq!(loaded.name, original.name);
    assert_eq!(loaded.source_type, 1);
    assert_eq!(loaded.type_list, original.type_list);
}

#[tokio::test]
async fn bracketed_text_outside_json_columns_stays_text() {
    let store = store().await;
    let table = ListeningPart::TABLE;
    let name = format!("[1,2,3] {}", uuid::Uuid::new_v4());

    let id = store.create(&table, &part(&name)).await.unwrap();
    let row = store.get_by_id(&table, id).await.unwrap();

    assert_eq!(row["name"], ColumnValue::Text(name));
}

#[tokio::test]
async fn sequential_creates_get_distinct_ids() {
    let store = store().await;
    let table = ListeningPart::TABLE;

    let first = store.create(&table, &part(&unique_name("ids"))).await.unwrap();
    let second = store.create(&table, &part(&unique_name("ids"))).await.unwrap();

    assert_ne!(first, second);
    assert!((1..RECORD_ID_SPACE).contains(&first));
    assert!((1..RECORD_ID_SPACE).contains(&second));
}

#[tokio::test]
async fn update_changes_every_column() {
    let store = store().await;
    let table = ListeningPart::TABLE;

    let id = store.create(&table, &part(&unique_name("before"))).await.unwrap();

    let mut changed = part(&unique_name("after"));
    changed.id = id;
    changed.type_list.clear();
    changed.user_id = Some("owner-1".to_string());

    let result = store.upsert(&table, &changed, UpsertMode::Update).await.unwrap();
    assert_eq!(result, None);

    let loaded: ListeningPart = store.fetch(&table, id).await.unwrap();
    assert_eq!(loaded.name, changed.name);
    assert!(loaded.type_list.is_empty());
    assert_eq!(loaded.user_id.as_deref(), Some("owner-1"));
}

#[tokio::test]
async fn update_of_missing_id_is_not_found() {
    let store = store().await;

    // Ids at or above RECORD_ID_SPACE are never generated.
    let mut missing = part("missing");
    missing.id = RECORD_ID_SPACE;

    let err = store
        .upsert(&ListeningPart::TABLE, &missing, UpsertMode::Update)
        .await
        .unwrap_err();
    assert!(err.is_not_found(), "unexpected error: {:?}", err);
}

#[tokio::test]
async fn update_without_id_is_rejected() {
    let store = store().await;

    let err = store
        .upsert(&ListeningPart::TABLE, &part("no id"), UpsertMode::Update)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));
}

#[tokio::test]
async fn get_by_id_reports_missing_rows() {
    let store = store().await;

    let err = store
        .get_by_id(&ListeningPart::TABLE, RECORD_ID_SPACE + 1)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));
}

#[tokio::test]
async fn pages_partition_the_matching_rows() {
    let store = store().await;
    let table = ListeningPart::TABLE;
    let name = unique_name("paged");

    for _ in 0..5 {
        store.create(&table, &part(&name)).await.unwrap();
    }

    let mut conditions = Conditions::new();
    conditions.insert("name".to_string(), name.clone().into());

    let mut seen = Vec::new();
    for (page_no, expected) in [(1, 2), (2, 2), (3, 1), (4, 0)] {
        let (rows, total) = store
            .paginated_query(&table, Page::new(page_no, 2), &conditions)
            .await
            .unwrap();
        assert_eq!(total, 5);
        assert_eq!(rows.len(), expected, "page {}", page_no);
        seen.extend(rows.iter().filter_map(|row| row["id"].as_i64()));
    }
    seen.sort_unstable();
    seen.dedup();
    assert_eq!(seen.len(), 5);

    let (all, total) = store
        .paginated_query(&table, Page::all(), &conditions)
        .await
        .unwrap();
    assert_eq!(total, 5);
    assert_eq!(all.len(), 5);

    let err = store
        .paginated_query(&table, Page::new(0, 2), &conditions)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidArgument(_)));
}

#[tokio::test]
async fn conditions_combine_with_and() {
    let store = store().await;
    let table = ListeningPart::TABLE;
    let name = unique_name("anded");

    let mut official = part(&name);
    official.source_type = 2;
    store.create(&table, &official).await.unwrap();
    store.create(&table, &part(&name)).await.unwrap();

    let mut conditions = Conditions::new();
    conditions.insert("name".to_string(), name.into());
    conditions.insert("type".to_string(), ColumnValue::Int(2));

    let (rows, total) = store
        .paginated_query(&table, Page::all(), &conditions)
        .await
        .unwrap();
    assert_eq!(total, 1);
    assert_eq!(rows[0]["type"], ColumnValue::Int(2));
}

#[tokio::test]
async fn batch_lookup_follows_requested_order() {
    let store = store().await;
    let table = ListeningPart::TABLE;

    let a = store.create(&table, &part(&unique_name("a"))).await.unwrap();
    let b = store.create(&table, &part(&unique_name("b"))).await.unwrap();

    assert!(store.get_by_ids(&table, &[]).await.unwrap().is_empty());
    assert_eq!(store.get_by_ids(&table, &[a, b]).await.unwrap().len(), 2);

    let ordered = store
        .get_by_ids_ordered(&table, &[b, RECORD_ID_SPACE, a, b])
        .await
        .unwrap();
    let ids: Vec<i64> = ordered.iter().filter_map(|row| row["id"].as_i64()).collect();
    assert_eq!(ids, vec![b, a, b]);
}

#[tokio::test]
async fn delete_reports_affected_rows() {
    let store = store().await;
    let table = ListeningSet::TABLE;

    let set = ListeningSet {
        id: 0,
        name: unique_name("set"),
        status: 0,
        source_type: 1,
        audio_files: vec!["part1.mp3".to_string()],
        part_list: vec![1, 2],
        user_id: None,
    };
    let id = store.create(&table, &set).await.unwrap();

    let row = store.get_by_id(&table, id).await.unwrap();
    assert_eq!(row["part_list"].id_list(), vec![1, 2]);
    assert_eq!(
        row["audio_files"],
        ColumnValue::List(vec!["part1.mp3".into()])
    );

    assert_eq!(store.delete_by_id(&table, id).await.unwrap(), 1);
    assert_eq!(store.delete_by_id(&table, id).await.unwrap(), 0);
}
