//! Offline, deterministic embedding backend.
//!
//! Hashed bag-of-words: each whitespace token lands in a bucket chosen by
//! its hash, weighted by the hash's high bits, and the vector is
//! L2-normalized. Texts sharing tokens get genuine cosine similarity,
//! which is what retrieval tests lean on, with no network and no model
//! files involved.

use std::hash::{Hash, Hasher};

use async_trait::async_trait;
use twox_hash::XxHash64;

use lectern_core::error::Result;
use lectern_core::traits::Embedder;

pub struct HashEmbedder {
    dims: usize,
    model: String,
}

impl HashEmbedder {
    pub fn new(dims: usize) -> Self {
        Self {
            dims,
            model: format!("hash-{dims}"),
        }
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    fn model_id(&self) -> &str {
        &self.model
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        crate::ensure_embeddable(text)?;

        let mut v = vec![0f32; self.dims];
        for token in text.split_whitespace() {
            let mut hasher = XxHash64::with_seed(0);
            token.hash(&mut hasher);
            let h = hasher.finish();
            let bucket = (h as usize) % self.dims;
            let weight = (((h >> 32) as u32) as f32) / (u32::MAX as f32);
            v[bucket] += weight;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt().max(1e-6);
        for x in &mut v {
            *x /= norm;
        }
        Ok(v)
    }
}
