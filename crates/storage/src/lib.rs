use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use shared::{
    domain::{CatalogItem, ItemId},
    protocol::NewCatalogItem,
};

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

#[derive(Debug, Clone)]
pub struct StoredItem {
    pub item: CatalogItem,
    pub created_at: DateTime<Utc>,
}

const SELECT_ITEMS: &str = r#"
    SELECT item_id, title, description, topic, difficulty, length_category, thumbnail, created_at
    FROM catalog_items
"#;

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = pool_options(database_url)
            .connect_with(connect_options)
            .await
            .with_context(|| format!("failed to open catalog database '{database_url}'"))?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    /// Stores a new item at the end of the catalog. Returns `None` when an
    /// item with the same id already exists.
    pub async fn insert_item(&self, new_item: &NewCatalogItem) -> Result<Option<CatalogItem>> {
        let item = catalog_item_from_new(new_item);
        let inserted = insert_row(&self.pool, &item).await?;
        Ok(inserted.then_some(item))
    }

    /// Inserts every item in one transaction, skipping ids already present.
    /// Returns how many rows were written.
    pub async fn import_items(&self, items: &[NewCatalogItem]) -> Result<usize> {
        let mut tx = self.pool.begin().await?;
        let mut written = 0;
        for new_item in items {
            let item = catalog_item_from_new(new_item);
            if insert_row(&mut *tx, &item).await? {
                written += 1;
            }
        }
        tx.commit().await.context("failed to commit catalog import")?;
        Ok(written)
    }

    /// Every item in insertion order.
    pub async fn list_items(&self) -> Result<Vec<CatalogItem>> {
        Ok(self
            .list_stored_items()
            .await?
            .into_iter()
            .map(|stored| stored.item)
            .collect())
    }

    pub async fn list_stored_items(&self) -> Result<Vec<StoredItem>> {
        let rows = sqlx::query(&format!("{SELECT_ITEMS} ORDER BY position ASC"))
            .fetch_all(&self.pool)
            .await
            .context("failed to list catalog items")?;
        rows.iter().map(stored_item_from_row).collect()
    }

    pub async fn load_item(&self, item_id: &ItemId) -> Result<Option<StoredItem>> {
        let row = sqlx::query(&format!("{SELECT_ITEMS} WHERE item_id = ?"))
            .bind(item_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("failed to load catalog item '{item_id}'"))?;
        row.as_ref().map(stored_item_from_row).transpose()
    }

    pub async fn delete_item(&self, item_id: &ItemId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM catalog_items WHERE item_id = ?")
            .bind(item_id.as_str())
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to delete catalog item '{item_id}'"))?;
        Ok(result.rows_affected() > 0)
    }
}

fn catalog_item_from_new(new_item: &NewCatalogItem) -> CatalogItem {
    CatalogItem {
        id: new_item.id.clone().unwrap_or_else(ItemId::generate),
        title: new_item.title.trim().to_string(),
        description: new_item.description.clone(),
        topic: new_item
            .topic
            .as_deref()
            .map(str::trim)
            .filter(|topic| !topic.is_empty())
            .map(str::to_string),
        difficulty: new_item.difficulty,
        length_category: new_item.length_category,
        thumbnail: new_item.thumbnail.clone(),
    }
}

async fn insert_row<'e, E>(executor: E, item: &CatalogItem) -> Result<bool>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        INSERT INTO catalog_items
            (item_id, title, description, topic, difficulty, length_category, thumbnail, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(item_id) DO NOTHING
        "#,
    )
    .bind(item.id.as_str())
    .bind(&item.title)
    .bind(&item.description)
    .bind(item.topic.as_deref())
    .bind(item.difficulty.map(|d| d.as_str()))
    .bind(item.length_category.map(|l| l.as_str()))
    .bind(item.thumbnail.as_deref())
    .bind(Utc::now())
    .execute(executor)
    .await
    .with_context(|| format!("failed to insert catalog item '{}'", item.id))?;
    Ok(result.rows_affected() > 0)
}

fn stored_item_from_row(row: &SqliteRow) -> Result<StoredItem> {
    let item_id: String = row.try_get("item_id")?;
    let difficulty: Option<String> = row.try_get("difficulty")?;
    let length_category: Option<String> = row.try_get("length_category")?;

    let item = CatalogItem {
        difficulty: difficulty
            .as_deref()
            .map(str::parse)
            .transpose()
            .with_context(|| format!("catalog item '{item_id}' has a bad difficulty"))?,
        length_category: length_category
            .as_deref()
            .map(str::parse)
            .transpose()
            .with_context(|| format!("catalog item '{item_id}' has a bad length category"))?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        topic: row.try_get("topic")?,
        thumbnail: row.try_get("thumbnail")?,
        id: ItemId(item_id),
    };

    Ok(StoredItem {
        item,
        created_at: row.try_get("created_at")?,
    })
}

/// Every connection to an in-memory URL opens its own empty database, so
/// those pools hold exactly one connection for their whole lifetime.
fn pool_options(database_url: &str) -> SqlitePoolOptions {
    if is_memory_url(database_url) {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(5)
    }
}

fn is_memory_url(database_url: &str) -> bool {
    database_url.contains(":memory:") || database_url.contains("mode=memory")
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url.starts_with("sqlite::memory:") || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
