use async_trait::async_trait;
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{DistanceType, Table};
use std::path::{Path, PathBuf};

use bookrag_core::error::{Error, Result};
use bookrag_core::traits::Retriever;
use bookrag_core::types::{Chunk, RetrievalResult};

use crate::schema::{f32_column, record_batch_to_chunks, CHUNKS_TABLE};
use crate::table::{has_table, open_db, read_meta, StoreMeta};

/// Read handle on a committed store. A missing directory is not an error:
/// the handle reports `is_present() == false` and retrieves nothing.
pub struct LanceStore {
    path: PathBuf,
    table: Option<Table>,
    meta: Option<StoreMeta>,
}

impl LanceStore {
    pub async fn open(path: &Path) -> Result<Self> {
        if !path.is_dir() {
            tracing::debug!(path = %path.display(), "No store on disk");
            return Ok(Self { path: path.to_path_buf(), table: None, meta: None });
        }
        let conn = open_db(path).await?;
        let meta = read_meta(&conn).await?;
        if meta.is_none() {
            tracing::warn!(
                path = %path.display(),
                "Directory has no store metadata; treating as absent"
            );
            return Ok(Self { path: path.to_path_buf(), table: None, meta: None });
        }
        let table = if has_table(&conn, CHUNKS_TABLE).await? {
            Some(conn.open_table(CHUNKS_TABLE).execute().await.map_err(Error::store)?)
        } else {
            None
        };
        Ok(Self { path: path.to_path_buf(), table, meta })
    }

    /// Like [`LanceStore::open`] but a missing store is [`Error::StoreNotFound`].
    pub async fn open_existing(path: &Path) -> Result<Self> {
        let store = Self::open(path).await?;
        if !store.is_present() {
            return Err(Error::StoreNotFound(path.to_path_buf()));
        }
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_present(&self) -> bool {
        self.meta.is_some()
    }

    pub fn meta(&self) -> Option<&StoreMeta> {
        self.meta.as_ref()
    }

    pub async fn count_rows(&self) -> Result<usize> {
        match &self.table {
            Some(t) => t.count_rows(None).await.map_err(Error::store),
            None => Ok(0),
        }
    }

    /// Every stored chunk ordered by source then position.
    pub async fn all_chunks(&self) -> Result<Vec<Chunk>> {
        let Some(table) = &self.table else { return Ok(Vec::new()) };
        let mut stream = table.query().execute().await.map_err(Error::store)?;
        let mut chunks = Vec::new();
        while let Some(batch) = stream.try_next().await.map_err(Error::store)? {
            chunks.extend(record_batch_to_chunks(&batch)?);
        }
        chunks.sort_by(|a, b| a.source.cmp(&b.source).then(a.chunk_index.cmp(&b.chunk_index)));
        Ok(chunks)
    }
}

/// Map cosine distance to a relevance score in `[0, 1]`.
///
/// For unit vectors the squared euclidean distance is `2 * distance`, and the
/// score is `1 - squared_l2 / sqrt(2)`, i.e. `1 - sqrt(2) * distance`. A
/// threshold of 0.7 therefore admits matches with cosine similarity of about
/// 0.788 or more.
pub fn relevance_from_cosine_distance(distance: f32) -> f32 {
    (1.0 - std::f32::consts::SQRT_2 * distance.max(0.0)).clamp(0.0, 1.0)
}

#[async_trait]
impl Retriever for LanceStore {
    fn embedder_id(&self) -> Option<&str> {
        self.meta.as_ref().map(|m| m.embedder_id.as_str())
    }

    async fn retrieve(&self, query_vector: &[f32], k: usize) -> Result<Vec<RetrievalResult>> {
        let Some(table) = &self.table else { return Ok(Vec::new()) };
        if k == 0 {
            return Ok(Vec::new());
        }
        if let Some(meta) = &self.meta {
            if meta.dimension != query_vector.len() {
                return Err(Error::Store(format!(
                    "query vector has {} dimensions, store has {}",
                    query_vector.len(),
                    meta.dimension
                )));
            }
        }
        let mut stream = table
            .vector_search(query_vector.to_vec())
            .map_err(Error::store)?
            .distance_type(DistanceType::Cosine)
            .limit(k)
            .execute()
            .await
            .map_err(Error::store)?;
        let mut results = Vec::new();
        while let Some(batch) = stream.try_next().await.map_err(Error::store)? {
            let distances = f32_column(&batch, "_distance")?;
            for (i, chunk) in record_batch_to_chunks(&batch)?.into_iter().enumerate() {
                let score = relevance_from_cosine_distance(distances.value(i));
                results.push(RetrievalResult { chunk, score });
            }
        }
        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(k);
        tracing::debug!(hits = results.len(), "Retrieved chunks");
        Ok(results)
    }
}
