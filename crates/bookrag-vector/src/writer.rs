//! Staged store construction.
//!
//! A new store is written to a hidden sibling directory and only renamed over
//! the live store once every batch and the meta table are written. Dropping
//! an uncommitted [`StoreBuilder`] removes the staging directory, so a failed
//! run leaves the previous store untouched.

use arrow_array::RecordBatchIterator;
use chrono::Utc;
use lancedb::{Connection, Table};
use std::fs;
use std::path::{Path, PathBuf};

use bookrag_core::error::{Error, Result};
use bookrag_core::types::Chunk;

use crate::schema::{chunks_to_record_batch, CHUNKS_TABLE};
use crate::table::{open_db, write_meta, StoreMeta};

pub struct StoreBuilder {
    target: PathBuf,
    staging: PathBuf,
    conn: Option<Connection>,
    table: Option<Table>,
    dim: Option<i32>,
    rows: usize,
    committed: bool,
}

impl StoreBuilder {
    /// Start a fresh staging area for `target`. A stale staging directory
    /// from an interrupted run is discarded.
    pub async fn create(target: &Path) -> Result<Self> {
        let staging = sibling_path(target, "staging")?;
        if staging.exists() {
            tracing::warn!(path = %staging.display(), "Removing stale staging directory");
            fs::remove_dir_all(&staging)?;
        }
        fs::create_dir_all(&staging)?;
        let conn = open_db(&staging).await?;
        tracing::debug!(path = %staging.display(), "Staging new store");
        Ok(Self {
            target: target.to_path_buf(),
            staging,
            conn: Some(conn),
            table: None,
            dim: None,
            rows: 0,
            committed: false,
        })
    }

    pub fn staging_path(&self) -> &Path {
        &self.staging
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Append one batch of chunks with their vectors.
    pub async fn add(&mut self, chunks: &[Chunk], vectors: &[Vec<f32>]) -> Result<()> {
        if chunks.is_empty() {
            return Ok(());
        }
        let dim = match (self.dim, vectors.first()) {
            (Some(d), _) => d,
            (None, Some(v)) if !v.is_empty() => v.len() as i32,
            _ => {
                return Err(Error::Store(
                    "cannot infer vector dimension from an empty embedding".into(),
                ))
            }
        };
        let batch = chunks_to_record_batch(chunks, vectors, dim)?;
        let schema = batch.schema();
        let reader = Box::new(RecordBatchIterator::new(vec![Ok(batch)].into_iter(), schema));
        match &self.table {
            Some(table) => {
                table.add(reader).execute().await.map_err(Error::store)?;
            }
            None => {
                let conn = self.connection()?;
                let table = conn
                    .create_table(CHUNKS_TABLE, reader)
                    .execute()
                    .await
                    .map_err(Error::store)?;
                self.table = Some(table);
                self.dim = Some(dim);
            }
        }
        self.rows += chunks.len();
        Ok(())
    }

    /// Write the meta table and swap the staged store into place.
    pub async fn commit(mut self, embedder_id: &str, document_count: usize) -> Result<StoreMeta> {
        let meta = StoreMeta {
            embedder_id: embedder_id.to_string(),
            dimension: self.dim.unwrap_or(0) as usize,
            document_count,
            chunk_count: self.rows,
            created_at: Utc::now(),
        };
        write_meta(self.connection()?, &meta).await?;
        self.table = None;
        self.conn = None;
        swap_into_place(&self.staging, &self.target)?;
        self.committed = true;
        tracing::info!("Saved {} chunks to {}.", meta.chunk_count, self.target.display());
        Ok(meta)
    }

    fn connection(&self) -> Result<&Connection> {
        self.conn.as_ref().ok_or_else(|| Error::Store("store builder already closed".into()))
    }
}

impl Drop for StoreBuilder {
    fn drop(&mut self) {
        if !self.committed && self.staging.exists() {
            tracing::warn!(path = %self.staging.display(), "Discarding uncommitted store");
            if let Err(e) = fs::remove_dir_all(&self.staging) {
                tracing::error!(error = %e, "Failed to remove staging directory");
            }
        }
    }
}

/// `.<name>.<tag>` next to `target`.
fn sibling_path(target: &Path, tag: &str) -> Result<PathBuf> {
    let name = target.file_name().ok_or_else(|| {
        Error::InvalidConfig(format!("store path {} has no final component", target.display()))
    })?;
    let parent = target.parent().unwrap_or_else(|| Path::new(""));
    Ok(parent.join(format!(".{}.{}", name.to_string_lossy(), tag)))
}

/// Replace `target` with `staging`. The old store is moved aside first and
/// restored if the second rename fails.
fn swap_into_place(staging: &Path, target: &Path) -> Result<()> {
    let backup = sibling_path(target, "old")?;
    if backup.exists() {
        fs::remove_dir_all(&backup)?;
    }
    let had_previous = target.exists();
    if had_previous {
        fs::rename(target, &backup)?;
    }
    if let Err(e) = fs::rename(staging, target) {
        if had_previous {
            if let Err(restore) = fs::rename(&backup, target) {
                tracing::error!(error = %restore, "Failed to restore previous store");
            }
        }
        return Err(e.into());
    }
    if had_previous {
        fs::remove_dir_all(&backup)?;
    }
    Ok(())
}
