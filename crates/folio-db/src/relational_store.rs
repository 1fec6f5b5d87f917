//! Relational backend: typed columns plus one row per array element.
//!
//! Scalars live in `metadata_document`, arrays in `metadata_value` keyed by
//! `(path, field, position)`. Dates are a seconds column plus a `*_ns`
//! subsecond column, so any instant a document can carry is storable. Filters are compiled by
//! [`FilterQueryBuilder`] and run as one query; documents are rebuilt from
//! their column row and their value rows.

use std::collections::{BTreeMap, HashSet};
use std::time::Instant;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnection, SqlitePool, SqliteRow};
use sqlx::Row;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use folio_core::{
    defaults, fold_case, BackendKind, Error, FieldRegistry, MetadataDocument, MetadataStore,
    Result, ValidatedFilter, ValueType,
};

use crate::pool::{create_pool, create_pool_with_config, log_pool_metrics, PoolConfig};
use crate::predicate::{
    bind_params, instant_from_parts, instant_parts, FilterQueryBuilder, QueryParam,
};

/// Idempotent schema, applied on open.
const SCHEMA: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS metadata_document (
        path TEXT PRIMARY KEY NOT NULL,
        path_fold TEXT NOT NULL,
        name TEXT NOT NULL DEFAULT '',
        name_fold TEXT NOT NULL DEFAULT '',
        title TEXT NOT NULL DEFAULT '',
        title_fold TEXT NOT NULL DEFAULT '',
        collection TEXT NOT NULL DEFAULT '',
        collection_fold TEXT NOT NULL DEFAULT '',
        file_type TEXT NOT NULL DEFAULT '',
        file_type_fold TEXT NOT NULL DEFAULT '',
        status TEXT NOT NULL DEFAULT '',
        status_fold TEXT NOT NULL DEFAULT '',
        priority TEXT NOT NULL DEFAULT '',
        priority_fold TEXT NOT NULL DEFAULT '',
        size INTEGER NOT NULL DEFAULT 0,
        created_at INTEGER,
        created_at_ns INTEGER,
        last_edited INTEGER,
        last_edited_ns INTEGER,
        target_date INTEGER,
        target_date_ns INTEGER
    )"#,
    r#"CREATE TABLE IF NOT EXISTS metadata_value (
        path TEXT NOT NULL,
        field TEXT NOT NULL,
        position INTEGER NOT NULL,
        value TEXT NOT NULL,
        value_fold TEXT NOT NULL,
        PRIMARY KEY (path, field, position)
    )"#,
    "CREATE INDEX IF NOT EXISTS idx_metadata_value_field_value ON metadata_value (field, value)",
    "CREATE INDEX IF NOT EXISTS idx_metadata_document_status ON metadata_document (status)",
];

const DOCUMENT_COLUMNS: &str = "d.path, d.name, d.title, d.collection, d.file_type, d.status, \
     d.priority, d.size, d.created_at, d.created_at_ns, d.last_edited, d.last_edited_ns, \
     d.target_date, d.target_date_ns";

const INSERT_DOCUMENT: &str = r#"
    INSERT INTO metadata_document (
        path, path_fold, name, name_fold, title, title_fold,
        collection, collection_fold, file_type, file_type_fold,
        status, status_fold, priority, priority_fold,
        size, created_at, created_at_ns, last_edited, last_edited_ns,
        target_date, target_date_ns
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15,
              ?16, ?17, ?18, ?19, ?20, ?21)
"#;

/// Metadata store over a SQLite pool.
pub struct RelationalStore {
    pool: RwLock<SqlitePool>,
}

impl RelationalStore {
    /// Connect with the default pool configuration and ensure the schema.
    pub async fn connect(database_url: &str) -> Result<Self> {
        Self::from_pool(create_pool(database_url).await?).await
    }

    /// Connect with a custom pool configuration and ensure the schema.
    pub async fn connect_with_config(database_url: &str, config: PoolConfig) -> Result<Self> {
        Self::from_pool(create_pool_with_config(database_url, config).await?).await
    }

    /// Private in-memory database.
    pub async fn in_memory() -> Result<Self> {
        Self::connect_with_config(defaults::MEMORY_DATABASE_URL, PoolConfig::in_memory()).await
    }

    /// Wrap an existing pool, creating the schema if needed.
    pub async fn from_pool(pool: SqlitePool) -> Result<Self> {
        ensure_schema(&pool).await?;
        Ok(Self {
            pool: RwLock::new(pool),
        })
    }

    /// Close the underlying pool.
    pub async fn close(&self) {
        self.pool.read().await.close().await;
    }

    /// Load documents matching a WHERE clause over `metadata_document d`.
    async fn fetch(
        pool: &SqlitePool,
        where_sql: &str,
        params: &[QueryParam],
    ) -> Result<Vec<MetadataDocument>> {
        let doc_sql = format!(
            "SELECT {} FROM metadata_document d WHERE {} ORDER BY d.path",
            DOCUMENT_COLUMNS, where_sql
        );
        let rows = bind_params(sqlx::query(&doc_sql), params)
            .fetch_all(pool)
            .await
            .map_err(Error::Database)?;

        let mut documents = BTreeMap::new();
        for row in &rows {
            let document = document_from_row(row)?;
            documents.insert(document.path.clone(), document);
        }
        if documents.is_empty() {
            return Ok(Vec::new());
        }

        let value_sql = format!(
            "SELECT v.path, v.field, v.value FROM metadata_value v \
             WHERE v.path IN (SELECT d.path FROM metadata_document d WHERE {}) \
             ORDER BY v.path, v.field, v.position",
            where_sql
        );
        let value_rows = bind_params(sqlx::query(&value_sql), params)
            .fetch_all(pool)
            .await
            .map_err(Error::Database)?;

        let registry = FieldRegistry::standard();
        for row in &value_rows {
            let path: String = row.try_get("path")?;
            let field: String = row.try_get("field")?;
            let value: String = row.try_get("value")?;

            let Some(document) = documents.get_mut(&path) else {
                continue;
            };
            match registry
                .by_column(&field)
                .and_then(|descriptor| document.list_mut(descriptor.slot))
            {
                Some(list) => list.push(value),
                None => warn!(
                    subsystem = "database",
                    component = "relational_store",
                    path = %path,
                    field = %field,
                    "Skipping value row for unknown array field"
                ),
            }
        }

        Ok(documents.into_values().collect())
    }
}

/// Create tables and indexes if they do not exist.
pub async fn ensure_schema(pool: &SqlitePool) -> Result<()> {
    for statement in SCHEMA {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(Error::Database)?;
    }
    debug!(
        subsystem = "database",
        component = "relational_store",
        op = "ensure_schema",
        "Schema ready"
    );
    Ok(())
}

fn document_from_row(row: &SqliteRow) -> Result<MetadataDocument> {
    let status: String = row.try_get("status")?;
    let priority: String = row.try_get("priority")?;
    let instant = |column: &str| -> Result<_> {
        let secs: Option<i64> = row.try_get(column)?;
        let nanos: Option<i64> = row.try_get(format!("{}_ns", column).as_str())?;
        secs.map(|secs| instant_from_parts(secs, nanos.unwrap_or(0)))
            .transpose()
    };

    Ok(MetadataDocument {
        path: row.try_get("path")?,
        name: row.try_get("name")?,
        title: row.try_get("title")?,
        collection: row.try_get("collection")?,
        file_type: row.try_get("file_type")?,
        status: (!status.is_empty()).then(|| status.parse()).transpose()?,
        priority: (!priority.is_empty()).then(|| priority.parse()).transpose()?,
        size: row.try_get("size")?,
        created_at: instant("created_at")?,
        last_edited: instant("last_edited")?,
        target_date: instant("target_date")?,
        ..Default::default()
    })
}

/// Replace one document (scalar row and all value rows) inside a transaction.
async fn write_document(conn: &mut SqliteConnection, document: &MetadataDocument) -> Result<()> {
    document.validate()?;

    let created_at = document.created_at.as_ref().map(instant_parts);
    let last_edited = document.last_edited.as_ref().map(instant_parts);
    let target_date = document.target_date.as_ref().map(instant_parts);
    let status = document.status.map(|s| s.as_str()).unwrap_or("");
    let priority = document.priority.map(|p| p.as_str()).unwrap_or("");

    remove_document(conn, &document.path).await?;

    sqlx::query(INSERT_DOCUMENT)
        .bind(&document.path)
        .bind(fold_case(&document.path))
        .bind(&document.name)
        .bind(fold_case(&document.name))
        .bind(&document.title)
        .bind(fold_case(&document.title))
        .bind(&document.collection)
        .bind(fold_case(&document.collection))
        .bind(&document.file_type)
        .bind(fold_case(&document.file_type))
        .bind(status)
        .bind(fold_case(status))
        .bind(priority)
        .bind(fold_case(priority))
        .bind(document.size)
        .bind(created_at.map(|(secs, _)| secs))
        .bind(created_at.map(|(_, nanos)| nanos))
        .bind(last_edited.map(|(secs, _)| secs))
        .bind(last_edited.map(|(_, nanos)| nanos))
        .bind(target_date.map(|(secs, _)| secs))
        .bind(target_date.map(|(_, nanos)| nanos))
        .execute(&mut *conn)
        .await
        .map_err(Error::Database)?;

    for descriptor in FieldRegistry::standard().descriptors() {
        if descriptor.value_type != ValueType::Array {
            continue;
        }
        let Some(values) = document.list(descriptor.slot) else {
            continue;
        };
        for (position, value) in values.iter().enumerate() {
            sqlx::query(
                "INSERT INTO metadata_value (path, field, position, value, value_fold) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )
            .bind(&document.path)
            .bind(descriptor.column)
            .bind(position as i64)
            .bind(value)
            .bind(fold_case(value))
            .execute(&mut *conn)
            .await
            .map_err(Error::Database)?;
        }
    }
    Ok(())
}

/// Delete a document's rows. Returns whether the document row existed.
async fn remove_document(conn: &mut SqliteConnection, path: &str) -> Result<bool> {
    sqlx::query("DELETE FROM metadata_value WHERE path = ?1")
        .bind(path)
        .execute(&mut *conn)
        .await
        .map_err(Error::Database)?;
    let result = sqlx::query("DELETE FROM metadata_document WHERE path = ?1")
        .bind(path)
        .execute(&mut *conn)
        .await
        .map_err(Error::Database)?;
    Ok(result.rows_affected() > 0)
}

#[async_trait]
impl MetadataStore for RelationalStore {
    fn kind(&self) -> BackendKind {
        BackendKind::Relational
    }

    async fn set(&self, document: MetadataDocument) -> Result<()> {
        let pool = self.pool.write().await;
        let mut tx = pool.begin().await.map_err(Error::Database)?;
        write_document(&mut tx, &document).await?;
        tx.commit().await.map_err(Error::Database)?;
        debug!(
            subsystem = "database",
            component = "relational_store",
            op = "set",
            path = %document.path,
            "Document stored"
        );
        Ok(())
    }

    async fn bulk_set(&self, documents: Vec<MetadataDocument>) -> Result<()> {
        let start = Instant::now();
        let pool = self.pool.write().await;
        let mut tx = pool.begin().await.map_err(Error::Database)?;
        // Dropping the transaction on error rolls the whole batch back.
        for document in &documents {
            write_document(&mut tx, document).await?;
        }
        tx.commit().await.map_err(Error::Database)?;
        log_pool_metrics(&pool);

        info!(
            subsystem = "database",
            component = "relational_store",
            op = "bulk_set",
            document_count = documents.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Bulk write committed"
        );
        Ok(())
    }

    async fn replace_all(&self, documents: Vec<MetadataDocument>) -> Result<usize> {
        let start = Instant::now();
        let pool = self.pool.write().await;
        let mut tx = pool.begin().await.map_err(Error::Database)?;

        let existing: Vec<String> = sqlx::query_scalar("SELECT path FROM metadata_document")
            .fetch_all(&mut *tx)
            .await
            .map_err(Error::Database)?;
        for document in &documents {
            write_document(&mut tx, document).await?;
        }
        let keep: HashSet<&str> = documents.iter().map(|d| d.path.as_str()).collect();
        let mut removed = 0;
        for path in existing.iter().filter(|p| !keep.contains(p.as_str())) {
            if remove_document(&mut tx, path).await? {
                removed += 1;
            }
        }
        tx.commit().await.map_err(Error::Database)?;
        log_pool_metrics(&pool);

        info!(
            subsystem = "database",
            component = "relational_store",
            op = "replace_all",
            document_count = documents.len(),
            removed_count = removed,
            duration_ms = start.elapsed().as_millis() as u64,
            "Document set replaced"
        );
        Ok(removed)
    }

    async fn delete(&self, path: &str) -> Result<bool> {
        let pool = self.pool.write().await;
        let mut tx = pool.begin().await.map_err(Error::Database)?;
        let existed = remove_document(&mut tx, path).await?;
        tx.commit().await.map_err(Error::Database)?;
        Ok(existed)
    }

    async fn get(&self, path: &str) -> Result<Option<MetadataDocument>> {
        let pool = self.pool.read().await;
        let params = [QueryParam::Text(path.to_string())];
        let mut documents = Self::fetch(&pool, "d.path = ?1", &params).await?;
        Ok(documents.pop())
    }

    async fn get_all(&self) -> Result<BTreeMap<String, MetadataDocument>> {
        let pool = self.pool.read().await;
        let documents = Self::fetch(&pool, "1", &[]).await?;
        Ok(documents.into_iter().map(|d| (d.path.clone(), d)).collect())
    }

    async fn len(&self) -> Result<usize> {
        let pool = self.pool.read().await;
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM metadata_document")
            .fetch_one(&*pool)
            .await
            .map_err(Error::Database)?;
        Ok(count as usize)
    }

    async fn query(&self, filter: &ValidatedFilter) -> Result<Vec<MetadataDocument>> {
        let start = Instant::now();
        let (where_sql, params) = FilterQueryBuilder::new(filter, 0).build()?;

        debug!(
            subsystem = "database",
            component = "relational_store",
            op = "compile",
            criteria_count = filter.criteria.len(),
            sql = %where_sql,
            "Compiled filter predicate"
        );

        let pool = self.pool.read().await;
        let documents = Self::fetch(&pool, &where_sql, &params).await?;

        debug!(
            subsystem = "database",
            component = "relational_store",
            op = "query",
            result_count = documents.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Relational query complete"
        );
        Ok(documents)
    }
}
