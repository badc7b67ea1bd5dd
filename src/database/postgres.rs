use async_trait::async_trait;
use bson::oid::ObjectId;
use serde_json::Value;
use sqlx::{postgres::PgRow, PgPool, Row};
use tracing::info;

use super::object_id::parse_object_id;
use super::store::{
    validate_collection, with_id, without_id, DeleteResult, Document, DocumentStore, StoreError,
    Update, UpdateResult,
};

/// Document store backed by PostgreSQL JSONB, one table per collection.
#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

/// Statement shared by replace and update. `{next_doc}` is an expression over
/// the current `doc`; rows whose computed document is unchanged count as
/// matched but not modified.
const MODIFY_SQL: &str = r#"
WITH target AS (
    SELECT id, doc FROM {table} WHERE id = $1 FOR UPDATE
), next AS (
    SELECT id, doc AS old_doc, {next_doc} AS new_doc FROM target
), changed AS (
    UPDATE {table} AS t SET doc = next.new_doc
    FROM next
    WHERE t.id = next.id AND next.new_doc IS DISTINCT FROM next.old_doc
    RETURNING t.id
)
SELECT (SELECT COUNT(*) FROM target) AS matched,
       (SELECT COUNT(*) FROM changed) AS modified
"#;

const REPLACE_EXPR: &str = "$2::jsonb";

const SET_EXPR: &str = "doc || $2::jsonb";

// $2 field, $3 key, $4 item
const ADD_TO_SET_EXPR: &str = r#"
CASE
    WHEN EXISTS (
        SELECT 1 FROM jsonb_array_elements(
            CASE WHEN jsonb_typeof(doc -> $2::text) = 'array' THEN doc -> $2::text ELSE '[]'::jsonb END
        ) AS entry
        WHERE entry -> $3::text = $4::jsonb -> $3::text
    ) THEN doc
    ELSE jsonb_set(
        doc,
        ARRAY[$2::text],
        (CASE WHEN jsonb_typeof(doc -> $2::text) = 'array' THEN doc -> $2::text ELSE '[]'::jsonb END)
            || jsonb_build_array($4::jsonb),
        true
    )
END
"#;

// $2 field, $3 key, $4 value
const PULL_EXPR: &str = r#"
CASE
    WHEN jsonb_typeof(doc -> $2::text) = 'array' THEN jsonb_set(
        doc,
        ARRAY[$2::text],
        COALESCE(
            (SELECT jsonb_agg(e.entry ORDER BY e.idx)
               FROM jsonb_array_elements(doc -> $2::text) WITH ORDINALITY AS e(entry, idx)
              WHERE e.entry -> $3::text IS DISTINCT FROM $4::jsonb),
            '[]'::jsonb
        )
    )
    ELSE doc
END
"#;

enum Change {
    Replace(Document),
    Update(Update),
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create collection tables that do not exist yet.
    pub async fn ensure_collections(&self, names: &[&str]) -> Result<(), StoreError> {
        for name in names {
            let table = quote_collection(name)?;
            let sql = format!(
                "CREATE TABLE IF NOT EXISTS {} (id TEXT PRIMARY KEY, seq BIGSERIAL NOT NULL, doc JSONB NOT NULL)",
                table
            );
            sqlx::query(&sql).execute(&self.pool).await?;
            info!("Collection ready: {}", name);
        }
        Ok(())
    }

    async fn modify(&self, collection: &str, id: &ObjectId, change: Change) -> Result<UpdateResult, StoreError> {
        let table = quote_collection(collection)?;
        let next_doc = match &change {
            Change::Replace(_) => REPLACE_EXPR,
            Change::Update(Update::Set(_)) => SET_EXPR,
            Change::Update(Update::AddToSet { .. }) => ADD_TO_SET_EXPR,
            Change::Update(Update::Pull { .. }) => PULL_EXPR,
        };
        let sql = MODIFY_SQL
            .replace("{table}", &table)
            .replace("{next_doc}", next_doc);

        let query = sqlx::query(&sql).bind(id.to_hex());
        let query = match change {
            Change::Replace(doc) => query.bind(Value::Object(without_id(doc))),
            Change::Update(Update::Set(doc)) => query.bind(Value::Object(without_id(doc))),
            Change::Update(Update::AddToSet { field, key, item }) => query.bind(field).bind(key).bind(item),
            Change::Update(Update::Pull { field, key, value }) => query.bind(field).bind(key).bind(value),
        };

        let row = query.fetch_one(&self.pool).await?;
        let matched: i64 = row.try_get("matched")?;
        let modified: i64 = row.try_get("modified")?;
        Ok(UpdateResult {
            matched: matched.max(0) as u64,
            modified: modified.max(0) as u64,
        })
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn find(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let sql = format!("SELECT id, doc FROM {} ORDER BY seq", quote_collection(collection)?);
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter().map(row_to_document).collect()
    }

    async fn find_one(&self, collection: &str, id: &ObjectId) -> Result<Option<Document>, StoreError> {
        let sql = format!("SELECT id, doc FROM {} WHERE id = $1", quote_collection(collection)?);
        let row = sqlx::query(&sql)
            .bind(id.to_hex())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_document).transpose()
    }

    async fn insert_one(&self, collection: &str, doc: Document) -> Result<ObjectId, StoreError> {
        let sql = format!("INSERT INTO {} (id, doc) VALUES ($1, $2)", quote_collection(collection)?);
        let id = ObjectId::new();
        sqlx::query(&sql)
            .bind(id.to_hex())
            .bind(Value::Object(without_id(doc)))
            .execute(&self.pool)
            .await?;
        Ok(id)
    }

    async fn replace_one(
        &self,
        collection: &str,
        id: &ObjectId,
        doc: Document,
    ) -> Result<UpdateResult, StoreError> {
        self.modify(collection, id, Change::Replace(doc)).await
    }

    async fn update_one(
        &self,
        collection: &str,
        id: &ObjectId,
        update: Update,
    ) -> Result<UpdateResult, StoreError> {
        self.modify(collection, id, Change::Update(update)).await
    }

    async fn delete_one(&self, collection: &str, id: &ObjectId) -> Result<DeleteResult, StoreError> {
        let sql = format!("DELETE FROM {} WHERE id = $1", quote_collection(collection)?);
        let result = sqlx::query(&sql).bind(id.to_hex()).execute(&self.pool).await?;
        Ok(DeleteResult {
            deleted: result.rows_affected(),
        })
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

fn quote_collection(name: &str) -> Result<String, StoreError> {
    validate_collection(name)?;
    Ok(format!("\"{}\"", name))
}

fn row_to_document(row: &PgRow) -> Result<Document, StoreError> {
    let raw_id: String = row.try_get("id")?;
    let id = parse_object_id(&raw_id)
        .ok_or_else(|| StoreError::Corrupt(format!("invalid id '{}'", raw_id)))?;
    match row.try_get::<Value, _>("doc")? {
        Value::Object(doc) => Ok(with_id(&id, doc)),
        other => Err(StoreError::Corrupt(format!(
            "document {} is not an object: {}",
            raw_id, other
        ))),
    }
}
