//! Embedding generation for question text.
//!
//! The [`Embedder`] trait is the only thing the similarity index knows about
//! the model. [`FastEmbedder`] runs a local sentence-transformer through
//! fastembed; [`StubEmbedder`] returns fixed vectors and is meant for tests
//! and benchmarks.

use crate::error::{IndexError, IndexResult};
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::{debug, info};

/// Name of the default embedding model (all-MiniLM-L6-v2).
pub const DEFAULT_MODEL: &str = "AllMiniLML6V2";

/// Maps arbitrary text to a fixed-length vector.
///
/// Implementations must be thread-safe. Output is not assumed to be
/// bit-exact across model versions.
pub trait Embedder: Send + Sync {
    /// Generate one embedding per input text, in input order.
    fn embed_batch(&self, texts: &[&str]) -> IndexResult<Vec<Vec<f32>>>;

    /// Length of the vectors this embedder produces.
    fn dimension(&self) -> usize;

    /// Identifier of the underlying model, recorded in the index artifact.
    fn model_name(&self) -> &str;

    fn embed(&self, text: &str) -> IndexResult<Vec<f32>> {
        self.embed_batch(&[text])?
            .into_iter()
            .next()
            .ok_or_else(|| IndexError::Embedding("embedder returned no vector".to_string()))
    }
}

/// Resolve a configured model name to a fastembed model.
pub fn parse_model(name: &str) -> Option<EmbeddingModel> {
    let model = match name {
        "AllMiniLML6V2" => EmbeddingModel::AllMiniLML6V2,
        "AllMiniLML12V2" => EmbeddingModel::AllMiniLML12V2,
        "BGESmallENV15" => EmbeddingModel::BGESmallENV15,
        "BGEBaseENV15" => EmbeddingModel::BGEBaseENV15,
        "MultilingualE5Small" => EmbeddingModel::MultilingualE5Small,
        "ParaphraseMLMiniLML12V2" => EmbeddingModel::ParaphraseMLMiniLML12V2,
        _ => return None,
    };
    Some(model)
}

/// Local sentence-transformer embedder.
pub struct FastEmbedder {
    model: Mutex<TextEmbedding>,
    model_name: String,
    dimension: usize,
}

impl std::fmt::Debug for FastEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FastEmbedder")
            .field("model_name", &self.model_name)
            .field("dimension", &self.dimension)
            .field("model", &"<TextEmbedding>")
            .finish()
    }
}

impl FastEmbedder {
    /// Load `model_name`, downloading it into `cache_dir` on first use.
    ///
    /// # Errors
    /// Returns an error for an unknown model name or if the model fails to
    /// initialize or download.
    pub fn new(
        model_name: &str,
        cache_dir: PathBuf,
        show_download_progress: bool,
    ) -> IndexResult<Self> {
        let model = parse_model(model_name).ok_or_else(|| IndexError::Validation {
            reason: format!("unknown embedding model '{model_name}'"),
        })?;

        let has_cached_models = cache_dir.exists()
            && cache_dir
                .read_dir()
                .is_ok_and(|mut entries| entries.any(|_| true));
        if has_cached_models {
            info!("Loading embedding model {model_name} from cache");
        } else {
            info!("Downloading embedding model {model_name} (first time only)");
        }

        let mut text_model = TextEmbedding::try_new(
            InitOptions::new(model)
                .with_cache_dir(cache_dir)
                .with_show_download_progress(show_download_progress),
        )
        .map_err(|e| IndexError::Embedding(format!(
            "Failed to initialize embedding model: {e}. Ensure you have internet connection for first-time model download"
        )))?;

        // Probe the output length once instead of trusting a table.
        let probe = text_model
            .embed(vec!["dimension probe"], None)
            .map_err(|e| IndexError::Embedding(e.to_string()))?;
        let dimension = probe.first().map(Vec::len).unwrap_or_default();
        if dimension == 0 {
            return Err(IndexError::Embedding(
                "embedding model produced an empty vector".to_string(),
            ));
        }
        debug!("Embedding model {model_name} produces {dimension}-dimensional vectors");

        Ok(Self {
            model: Mutex::new(text_model),
            model_name: model_name.to_string(),
            dimension,
        })
    }
}

impl Embedder for FastEmbedder {
    fn embed_batch(&self, texts: &[&str]) -> IndexResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let embeddings = self
            .model
            .lock()
            .map_err(|_| {
                IndexError::Embedding(
                    "Failed to acquire embedding model lock - model may be poisoned".to_string(),
                )
            })?
            .embed(texts.to_vec(), None)
            .map_err(|e| IndexError::Embedding(format!("Failed to generate embeddings: {e}")))?;

        Ok(embeddings)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

/// Deterministic embedder with a lookup table.
///
/// Texts registered with [`StubEmbedder::with`] map to their given vector;
/// any other text maps to a vector derived from an FNV-1a hash of its bytes,
/// so identical text always produces an identical vector.
#[derive(Debug, Clone)]
pub struct StubEmbedder {
    dimension: usize,
    table: HashMap<String, Vec<f32>>,
}

impl StubEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            table: HashMap::new(),
        }
    }

    /// Register a fixed vector for `text`. The vector may deliberately have a
    /// length other than `dimension`.
    #[must_use]
    pub fn with(mut self, text: &str, vector: Vec<f32>) -> Self {
        self.table.insert(text.to_string(), vector);
        self
    }

    fn hashed(&self, text: &str) -> Vec<f32> {
        (0..self.dimension)
            .map(|component| {
                let mut hash: u64 = 0xcbf2_9ce4_8422_2325 ^ component as u64;
                for byte in text.bytes() {
                    hash ^= u64::from(byte);
                    hash = hash.wrapping_mul(0x0100_0000_01b3);
                }
                (hash % 10_000) as f32 / 10_000.0
            })
            .collect()
    }
}

impl Embedder for StubEmbedder {
    fn embed_batch(&self, texts: &[&str]) -> IndexResult<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|text| {
                self.table
                    .get(*text)
                    .cloned()
                    .unwrap_or_else(|| self.hashed(text))
            })
            .collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        "stub"
    }
}
