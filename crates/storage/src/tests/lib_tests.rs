use super::*;
use shared::domain::{Difficulty, LengthCategory};

fn new_item(title: &str, topic: &str) -> NewCatalogItem {
    NewCatalogItem {
        title: title.to_string(),
        description: format!("{title} walkthrough"),
        topic: Some(topic.to_string()),
        difficulty: Some(Difficulty::Beginner),
        length_category: Some(LengthCategory::Short),
        ..NewCatalogItem::default()
    }
}

#[tokio::test]
async fn health_check_succeeds_for_live_pool() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage.health_check().await.expect("health check");
}

#[tokio::test]
async fn lists_items_in_insertion_order() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    for (title, topic) in [("Zebra", "Design"), ("Alpha", "Data"), ("Mid", "Design")] {
        storage
            .insert_item(&new_item(title, topic))
            .await
            .expect("insert")
            .expect("fresh id");
    }

    let titles: Vec<String> = storage
        .list_items()
        .await
        .expect("list")
        .into_iter()
        .map(|item| item.title)
        .collect();
    assert_eq!(titles, vec!["Zebra", "Alpha", "Mid"]);
}

#[tokio::test]
async fn insert_generates_id_and_round_trips_labels() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let mut input = new_item("  CSS Basics ", " Design ");
    input.difficulty = Some(Difficulty::Advanced);
    input.length_category = None;
    input.thumbnail = Some("https://cdn.example.com/css.png".into());

    let created = storage
        .insert_item(&input)
        .await
        .expect("insert")
        .expect("fresh id");
    assert!(!created.id.as_str().is_empty());
    assert_eq!(created.title, "CSS Basics");
    assert_eq!(created.topic.as_deref(), Some("Design"));

    let stored = storage
        .load_item(&created.id)
        .await
        .expect("load")
        .expect("present");
    assert_eq!(stored.item, created);
    assert!(stored.created_at <= Utc::now());
}

#[tokio::test]
async fn duplicate_ids_are_not_inserted() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let mut input = new_item("Advanced Node", "Development");
    input.id = Some(ItemId("64f0c2".into()));

    assert!(storage.insert_item(&input).await.expect("insert").is_some());
    assert!(storage.insert_item(&input).await.expect("insert").is_none());
    assert_eq!(storage.list_items().await.expect("list").len(), 1);
}

#[tokio::test]
async fn import_skips_existing_ids() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let mut first = new_item("One", "Design");
    first.id = Some(ItemId("one".into()));
    let mut second = new_item("Two", "Data");
    second.id = Some(ItemId("two".into()));

    storage.insert_item(&first).await.expect("insert");
    let written = storage
        .import_items(&[first.clone(), second.clone()])
        .await
        .expect("import");
    assert_eq!(written, 1);
    assert_eq!(storage.list_items().await.expect("list").len(), 2);
}

#[tokio::test]
async fn delete_reports_whether_a_row_existed() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let created = storage
        .insert_item(&new_item("Gone", "Design"))
        .await
        .expect("insert")
        .expect("fresh id");

    assert!(storage.delete_item(&created.id).await.expect("delete"));
    assert!(!storage.delete_item(&created.id).await.expect("delete"));
    assert!(storage
        .load_item(&created.id)
        .await
        .expect("load")
        .is_none());
}

#[tokio::test]
async fn creates_database_file_when_missing() {
    let temp_root = tempfile::tempdir().expect("tempdir");
    let db_path = temp_root.path().join("nested").join("catalog.db");
    let database_url = format!("sqlite://{}", db_path.to_string_lossy().replace('\\', "/"));

    let storage = Storage::new(&database_url).await.expect("db");
    drop(storage);

    assert!(
        db_path.exists(),
        "database file should exist: {}",
        db_path.display()
    );
}

#[test]
fn memory_urls_have_no_parent_directory() {
    assert_eq!(sqlite_path("sqlite::memory:"), None);
    assert_eq!(
        sqlite_path("sqlite://./data/catalog.db?mode=rwc"),
        Some(PathBuf::from("./data/catalog.db"))
    );
}

#[test]
fn memory_databases_use_a_single_connection() {
    assert_eq!(pool_options("sqlite::memory:").get_max_connections(), 1);
    assert_eq!(
        pool_options("sqlite://file:catalog?mode=memory").get_max_connections(),
        1
    );
    assert_eq!(pool_options("sqlite://./data/academy.db").get_max_connections(), 5);
}

#[tokio::test]
async fn concurrent_reads_see_the_same_memory_catalog() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage
        .insert_item(&new_item("CSS Basics", "Design"))
        .await
        .expect("insert")
        .expect("fresh id");

    let (first, second, health) = tokio::join!(
        storage.list_items(),
        storage.list_items(),
        storage.health_check()
    );
    health.expect("health check");
    assert_eq!(first.expect("first list").len(), 1);
    assert_eq!(second.expect("second list").len(), 1);
}
