use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqlitePoolOptions, FromRow, SqlitePool};

/// A stored document as returned by collection queries.
#[derive(Debug, Clone, FromRow)]
pub struct Document {
    pub id: String,
    pub collection: String,
    pub title: String,
    pub content: String,
    pub image_ref: Option<String>,
    /// JSON array of tag strings.
    pub tags: String,
    pub author: Option<String>,
    pub created_at: String,
}

impl Document {
    pub fn tag_list(&self) -> Vec<String> {
        serde_json::from_str(&self.tags).unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
pub struct NewDocument {
    pub id: String,
    pub collection: String,
    pub title: String,
    pub content: String,
    pub image_ref: Option<String>,
    pub tags: Vec<String>,
    pub author: Option<String>,
    pub created_at: DateTime<Utc>,
}

pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    pub async fn initialize(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS kv_store (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                id TEXT PRIMARY KEY,
                collection TEXT NOT NULL,
                title TEXT NOT NULL,
                content TEXT NOT NULL,
                image_ref TEXT,
                tags TEXT NOT NULL DEFAULT '[]',
                author TEXT,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_documents_collection_created
            ON documents(collection, created_at DESC)
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_value(&self, key: &str) -> Result<Option<String>, sqlx::Error> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.0))
    }

    /// Insert or overwrite; the last writer for a key wins.
    pub async fn set_value(&self, key: &str, value: &str) -> Result<(), sqlx::Error> {
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            r#"
            INSERT INTO kv_store (key, value, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(&now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn remove_value(&self, key: &str) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM kv_store WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn insert_document(&self, doc: &NewDocument) -> anyhow::Result<()> {
        let tags = serde_json::to_string(&doc.tags)?;
        sqlx::query(
            r#"
            INSERT INTO documents (id, collection, title, content, image_ref, tags, author, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                collection = excluded.collection,
                title = excluded.title,
                content = excluded.content,
                image_ref = excluded.image_ref,
                tags = excluded.tags,
                author = excluded.author,
                created_at = excluded.created_at
            "#,
        )
        .bind(&doc.id)
        .bind(&doc.collection)
        .bind(&doc.title)
        .bind(&doc.content)
        .bind(&doc.image_ref)
        .bind(&tags)
        .bind(&doc.author)
        .bind(doc.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Newest documents first.
    pub async fn list_documents(
        &self,
        collection: &str,
        limit: i64,
    ) -> Result<Vec<Document>, sqlx::Error> {
        sqlx::query_as::<_, Document>(
            r#"
            SELECT * FROM documents
            WHERE collection = ?
            ORDER BY created_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(collection)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
    }
}
