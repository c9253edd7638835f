//! Similarity index over question text embeddings.
//!
//! The index is built once from a batch of records ([`IndexBuilder`]),
//! persisted as a single immutable artifact ([`SimilarityIndex::save`]) and
//! reopened read-only for queries ([`SimilarityIndex::open`]). Search is exact:
//! every stored vector is compared with the query by squared Euclidean
//! distance.
//!
//! ## Example
//!
//! ```no_run
//! use qgen::embedding::StubEmbedder;
//! use qgen::index::{IndexBuilder, SimilarityIndex};
//! # fn main() -> Result<(), qgen::IndexError> {
//! # let records = vec![];
//! let embedder = StubEmbedder::new(384);
//! let index = IndexBuilder::new().build(&records, &embedder)?;
//! index.save("questions.qvec")?;
//!
//! let index = SimilarityIndex::open("questions.qvec")?;
//! let nearest = index.query("The ability to understand emotions", &embedder, 5)?;
//! # Ok(())
//! # }
//! ```

mod builder;
mod search;
mod storage;

pub use builder::{DEFAULT_BATCH_SIZE, IndexBuilder, verify_against};
pub use search::{Neighbor, squared_euclidean};

use crate::embedding::Embedder;
use crate::error::{IndexError, IndexResult};
use crate::types::QuestionId;
use std::path::Path;
use storage::Artifact;
use tracing::{debug, warn};

/// Read-only, in-memory vector table with its position to id mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityIndex {
    model_name: String,
    dimension: usize,
    ids: Vec<QuestionId>,
    /// Row-major, one row of `dimension` values per id.
    vectors: Vec<f32>,
}

impl SimilarityIndex {
    pub(crate) fn from_parts(
        model_name: String,
        dimension: usize,
        ids: Vec<QuestionId>,
        vectors: Vec<f32>,
    ) -> Self {
        debug_assert_eq!(ids.len() * dimension, vectors.len());
        Self {
            model_name,
            dimension,
            ids,
            vectors,
        }
    }

    /// Load a persisted index.
    ///
    /// # Errors
    /// [`IndexError::IndexNotFound`] if the file is missing, unreadable,
    /// truncated, or not an index artifact of a supported version.
    pub fn open(path: impl AsRef<Path>) -> IndexResult<Self> {
        let path = path.as_ref();
        let Artifact {
            model_name,
            dimension,
            ids,
            vectors,
        } = storage::read_artifact(path)?;

        debug!(
            "Loaded similarity index from {} ({} vectors, {dimension} dimensions, model {model_name})",
            path.display(),
            ids.len()
        );
        Ok(Self::from_parts(model_name, dimension, ids, vectors))
    }

    /// Persist the index, replacing any artifact already at `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> IndexResult<()> {
        let path = path.as_ref();
        storage::write_artifact(
            path,
            &Artifact {
                model_name: self.model_name.clone(),
                dimension: self.dimension,
                ids: self.ids.clone(),
                vectors: self.vectors.clone(),
            },
        )?;
        debug!("Saved {} vectors to {}", self.ids.len(), path.display());
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Model the vectors were produced with.
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Question ids in position order.
    pub fn ids(&self) -> &[QuestionId] {
        &self.ids
    }

    /// Embed `text` and return its `k` nearest questions.
    ///
    /// # Errors
    /// - [`IndexError::EmptyIndex`] if the index holds no vectors; the
    ///   embedder is not called in that case
    /// - [`IndexError::DimensionMismatch`] if the embedder's output length
    ///   differs from the index dimension
    /// - [`IndexError::Embedding`] if embedding fails
    pub fn query(&self, text: &str, embedder: &dyn Embedder, k: usize) -> IndexResult<Vec<Neighbor>> {
        if self.is_empty() {
            return Err(IndexError::EmptyIndex);
        }
        if embedder.model_name() != self.model_name {
            warn!(
                "Index was built with model '{}' but queried with '{}'",
                self.model_name,
                embedder.model_name()
            );
        }

        let vector = embedder.embed(text)?;
        self.search_vector(&vector, k)
    }

    /// Return the `k` stored vectors closest to `query`.
    ///
    /// Results are ascending by distance with ties going to the
    /// earlier-inserted vector. A `k` larger than the index returns every
    /// vector; `k == 0` returns nothing.
    pub fn search_vector(&self, query: &[f32], k: usize) -> IndexResult<Vec<Neighbor>> {
        if self.is_empty() {
            return Err(IndexError::EmptyIndex);
        }
        if query.len() != self.dimension {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        Ok(search::nearest(
            &self.ids,
            &self.vectors,
            self.dimension,
            query,
            k,
        ))
    }
}
