use arrow_array::types::Float32Type;
use arrow_array::{Array, FixedSizeListArray, Int32Array, Int64Array, RecordBatch, StringArray};
use arrow_schema::{DataType, Field, Schema};
use std::sync::Arc;

use bookrag_core::error::{Error, Result};
use bookrag_core::types::Chunk;

pub const CHUNKS_TABLE: &str = "chunks";
pub const META_TABLE: &str = "meta";

pub fn build_chunks_schema(dim: i32) -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new("source", DataType::Utf8, false),
        Field::new("content", DataType::Utf8, false),
        Field::new("start_index", DataType::Int64, false),
        Field::new("chunk_index", DataType::Int32, false),
        Field::new("content_hash", DataType::Utf8, false),
        Field::new(
            "vector",
            DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dim),
            true,
        ),
    ]))
}

pub fn build_meta_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("key", DataType::Utf8, false),
        Field::new("value", DataType::Utf8, false),
    ]))
}

/// One record batch holding `chunks` with their vectors. All vectors must
/// have length `dim`.
pub fn chunks_to_record_batch(
    chunks: &[Chunk],
    vectors: &[Vec<f32>],
    dim: i32,
) -> Result<RecordBatch> {
    if chunks.len() != vectors.len() {
        return Err(Error::Store(format!(
            "{} chunks but {} vectors",
            chunks.len(),
            vectors.len()
        )));
    }
    if let Some(bad) = vectors.iter().find(|v| v.len() != dim as usize) {
        return Err(Error::Store(format!("dim mismatch: got {} expected {}", bad.len(), dim)));
    }
    let mut ids = Vec::with_capacity(chunks.len());
    let mut sources = Vec::with_capacity(chunks.len());
    let mut contents = Vec::with_capacity(chunks.len());
    let mut starts = Vec::with_capacity(chunks.len());
    let mut indices = Vec::with_capacity(chunks.len());
    let mut hashes = Vec::with_capacity(chunks.len());
    for c in chunks {
        ids.push(c.id.clone());
        sources.push(c.source.clone());
        contents.push(c.content.clone());
        starts.push(c.start_index as i64);
        indices.push(c.chunk_index as i32);
        hashes.push(c.content_hash.clone());
    }
    let vector_values = vectors
        .iter()
        .map(|v| Some(v.iter().map(|&x| Some(x)).collect::<Vec<_>>()));
    RecordBatch::try_new(
        build_chunks_schema(dim),
        vec![
            Arc::new(StringArray::from(ids)),
            Arc::new(StringArray::from(sources)),
            Arc::new(StringArray::from(contents)),
            Arc::new(Int64Array::from(starts)),
            Arc::new(Int32Array::from(indices)),
            Arc::new(StringArray::from(hashes)),
            Arc::new(FixedSizeListArray::from_iter_primitive::<Float32Type, _, _>(
                vector_values,
                dim,
            )),
        ],
    )
    .map_err(Error::store)
}

fn column<'a, T: 'static>(batch: &'a RecordBatch, name: &str) -> Result<&'a T> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<T>())
        .ok_or_else(|| Error::Store(format!("missing or mistyped column '{}'", name)))
}

/// Decode the chunk columns of a batch; `vector` and `_distance` are ignored.
pub fn record_batch_to_chunks(batch: &RecordBatch) -> Result<Vec<Chunk>> {
    let ids = column::<StringArray>(batch, "id")?;
    let sources = column::<StringArray>(batch, "source")?;
    let contents = column::<StringArray>(batch, "content")?;
    let starts = column::<Int64Array>(batch, "start_index")?;
    let indices = column::<Int32Array>(batch, "chunk_index")?;
    let hashes = column::<StringArray>(batch, "content_hash")?;
    Ok((0..batch.num_rows())
        .map(|i| Chunk {
            id: ids.value(i).to_string(),
            source: sources.value(i).to_string(),
            content: contents.value(i).to_string(),
            start_index: starts.value(i) as usize,
            chunk_index: indices.value(i) as usize,
            content_hash: hashes.value(i).to_string(),
        })
        .collect())
}

pub fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    column::<StringArray>(batch, name)
}

pub fn f32_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a arrow_array::Float32Array> {
    column::<arrow_array::Float32Array>(batch, name)
}
