//! LanceDB connection and the key/value `meta` table describing a store.

use arrow_array::{RecordBatch, RecordBatchIterator, StringArray};
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use lancedb::query::ExecutableQuery;
use lancedb::{connect, Connection};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use bookrag_core::error::{Error, Result};

use crate::schema::{build_meta_schema, string_column, META_TABLE};

/// What a store was built from. Written once when a store is committed.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreMeta {
    pub embedder_id: String,
    pub dimension: usize,
    pub document_count: usize,
    pub chunk_count: usize,
    pub created_at: DateTime<Utc>,
}

pub async fn open_db(path: &Path) -> Result<Connection> {
    connect(path.to_string_lossy().as_ref()).execute().await.map_err(Error::store)
}

pub async fn has_table(conn: &Connection, name: &str) -> Result<bool> {
    let names = conn.table_names().execute().await.map_err(Error::store)?;
    Ok(names.iter().any(|n| n == name))
}

pub async fn write_meta(conn: &Connection, meta: &StoreMeta) -> Result<()> {
    let pairs = [
        ("embedder_id", meta.embedder_id.clone()),
        ("dimension", meta.dimension.to_string()),
        ("document_count", meta.document_count.to_string()),
        ("chunk_count", meta.chunk_count.to_string()),
        ("created_at", meta.created_at.to_rfc3339()),
    ];
    let keys: Vec<&str> = pairs.iter().map(|(k, _)| *k).collect();
    let values: Vec<&str> = pairs.iter().map(|(_, v)| v.as_str()).collect();
    let batch = RecordBatch::try_new(
        build_meta_schema(),
        vec![Arc::new(StringArray::from(keys)), Arc::new(StringArray::from(values))],
    )
    .map_err(Error::store)?;
    let reader = Box::new(RecordBatchIterator::new(
        vec![Ok(batch)].into_iter(),
        build_meta_schema(),
    ));
    conn.create_table(META_TABLE, reader).execute().await.map_err(Error::store)?;
    Ok(())
}

/// `None` when the meta table does not exist.
pub async fn read_meta(conn: &Connection) -> Result<Option<StoreMeta>> {
    if !has_table(conn, META_TABLE).await? {
        return Ok(None);
    }
    let table = conn.open_table(META_TABLE).execute().await.map_err(Error::store)?;
    let mut stream = table.query().execute().await.map_err(Error::store)?;
    let mut values = HashMap::new();
    while let Some(batch) = stream.try_next().await.map_err(Error::store)? {
        let keys = string_column(&batch, "key")?;
        let vals = string_column(&batch, "value")?;
        for i in 0..batch.num_rows() {
            values.insert(keys.value(i).to_string(), vals.value(i).to_string());
        }
    }
    let get = |key: &str| {
        values
            .get(key)
            .cloned()
            .ok_or_else(|| Error::Store(format!("store meta is missing '{}'", key)))
    };
    let count = |key: &str| -> Result<usize> {
        get(key)?
            .parse()
            .map_err(|e| Error::Store(format!("store meta '{}' is not a number: {}", key, e)))
    };
    let created_at = DateTime::parse_from_rfc3339(&get("created_at")?)
        .map_err(Error::store)?
        .with_timezone(&Utc);
    Ok(Some(StoreMeta {
        embedder_id: get("embedder_id")?,
        dimension: count("dimension")?,
        document_count: count("document_count")?,
        chunk_count: count("chunk_count")?,
        created_at,
    }))
}
