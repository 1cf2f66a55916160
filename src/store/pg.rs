use anyhow::Context;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::{postgres::PgPoolOptions, types::Json, PgPool};
use tracing::{debug, warn};

use super::{SessionStore, StoreError, StoreKey};

/// Key/value table in PostgreSQL (`session_documents`).
#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let db = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .context("connect to database")?;

        if let Err(e) = sqlx::migrate!("./migrations").run(&db).await {
            warn!(error = %e, "migration failed; continuing");
        }
        Ok(Self { db })
    }
}

const UPSERT: &str = r#"
    INSERT INTO session_documents (key, value, updated_at)
    VALUES ($1, $2, now())
    ON CONFLICT (key) DO UPDATE
       SET value = EXCLUDED.value,
           updated_at = now()
"#;

#[async_trait]
impl SessionStore for PgStore {
    async fn load(&self, key: StoreKey) -> Result<Option<Value>, StoreError> {
        let row = sqlx::query_as::<_, (Json<Value>,)>(
            r#"SELECT value FROM session_documents WHERE key = $1"#,
        )
        .bind(key.as_str())
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(|(Json(v),)| v))
    }

    async fn save(&self, key: StoreKey, value: &Value) -> Result<(), StoreError> {
        sqlx::query(UPSERT)
            .bind(key.as_str())
            .bind(Json(value))
            .execute(&self.db)
            .await?;
        Ok(())
    }

    async fn clear(&self, key: StoreKey) -> Result<(), StoreError> {
        sqlx::query(r#"DELETE FROM session_documents WHERE key = $1"#)
            .bind(key.as_str())
            .execute(&self.db)
            .await?;
        Ok(())
    }

    async fn save_all(&self, entries: &[(StoreKey, Value)]) -> Result<(), StoreError> {
        let mut tx = self.db.begin().await?;
        for (key, value) in entries {
            sqlx::query(UPSERT)
                .bind(key.as_str())
                .bind(Json(value))
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        debug!(keys = entries.len(), "documents written in one transaction");
        Ok(())
    }
}
