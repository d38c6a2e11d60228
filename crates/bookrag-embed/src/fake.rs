use async_trait::async_trait;
use std::hash::{Hash, Hasher};
use twox_hash::XxHash64;

use bookrag_core::error::Result;
use bookrag_core::traits::TextEmbedder;

/// Deterministic offline embedder: hashes whitespace tokens into buckets and
/// L2-normalises. Texts sharing words land close together.
pub struct FakeEmbedder {
    dim: usize,
    id: String,
}

impl FakeEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim, id: format!("fake-xxhash-d{}", dim) }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dim];
        for (i, token) in text.split_whitespace().enumerate() {
            let mut hasher = XxHash64::with_seed(0);
            token.to_lowercase().hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h as usize) % self.dim;
            let val = (((h >> 32) as u32) as f32) / (u32::MAX as f32);
            v[idx] += val + (i as f32 % 3.0) * 0.01;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt().max(1e-6);
        for x in &mut v {
            *x /= norm;
        }
        v
    }
}

#[async_trait]
impl TextEmbedder for FakeEmbedder {
    fn model_id(&self) -> &str {
        &self.id
    }

    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.embed_text(text))
    }
}
