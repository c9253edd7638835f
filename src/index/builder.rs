//! Batch construction of a similarity index from question records.

use super::SimilarityIndex;
use crate::embedding::Embedder;
use crate::error::{IndexError, IndexResult};
use crate::store::MetadataStore;
use crate::types::QuestionRecord;
use std::collections::HashSet;
use tracing::{debug, info};

/// Number of texts sent to the embedder per call.
pub const DEFAULT_BATCH_SIZE: usize = 64;

/// Builds a [`SimilarityIndex`] in one pass over the input records.
///
/// Vectors are appended in input order, so position `i` of the index always
/// belongs to `records[i]`.
#[derive(Debug, Clone, Copy)]
pub struct IndexBuilder {
    batch_size: usize,
}

impl Default for IndexBuilder {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl IndexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the embedding batch size. Zero is treated as one.
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Embed the text of every record and collect the vectors.
    ///
    /// # Errors
    /// - [`IndexError::Validation`] for a repeated id or empty question text
    /// - [`IndexError::DimensionMismatch`] if any vector's length differs
    ///   from `embedder.dimension()`
    /// - [`IndexError::Embedding`] if the embedder fails or returns the wrong
    ///   number of vectors
    pub fn build(
        &self,
        records: &[QuestionRecord],
        embedder: &dyn Embedder,
    ) -> IndexResult<SimilarityIndex> {
        self.build_with_progress(records, embedder, |_| {})
    }

    /// Like [`IndexBuilder::build`], calling `on_progress` with the number of
    /// records embedded so far after every batch.
    pub fn build_with_progress(
        &self,
        records: &[QuestionRecord],
        embedder: &dyn Embedder,
        mut on_progress: impl FnMut(usize),
    ) -> IndexResult<SimilarityIndex> {
        let dimension = embedder.dimension();
        if dimension == 0 {
            return Err(IndexError::Validation {
                reason: "embedder reports a dimension of zero".to_string(),
            });
        }
        validate_records(records)?;

        let mut ids = Vec::with_capacity(records.len());
        let mut vectors = Vec::with_capacity(records.len() * dimension);

        for batch in records.chunks(self.batch_size) {
            let texts: Vec<&str> = batch.iter().map(|r| r.question_text.as_str()).collect();
            let embeddings = embedder.embed_batch(&texts)?;
            if embeddings.len() != batch.len() {
                return Err(IndexError::Embedding(format!(
                    "embedder returned {} vectors for {} texts",
                    embeddings.len(),
                    batch.len()
                )));
            }

            for (record, vector) in batch.iter().zip(embeddings) {
                if vector.len() != dimension {
                    return Err(IndexError::DimensionMismatch {
                        expected: dimension,
                        actual: vector.len(),
                    });
                }
                ids.push(record.id);
                vectors.extend_from_slice(&vector);
            }

            debug!("Embedded {}/{} questions", ids.len(), records.len());
            on_progress(ids.len());
        }

        info!(
            "Built similarity index with {} vectors ({dimension} dimensions, model {})",
            ids.len(),
            embedder.model_name()
        );

        Ok(SimilarityIndex::from_parts(
            embedder.model_name().to_string(),
            dimension,
            ids,
            vectors,
        ))
    }

    /// Build only after confirming every record exists in `store`.
    ///
    /// # Errors
    /// [`IndexError::Consistency`] for the first record the store does not
    /// know; no vectors are computed in that case.
    pub fn build_verified(
        &self,
        records: &[QuestionRecord],
        embedder: &dyn Embedder,
        store: &dyn MetadataStore,
    ) -> IndexResult<SimilarityIndex> {
        verify_against(records, store)?;
        self.build(records, embedder)
    }
}

/// Check that every record id is present in `store`.
///
/// A vector whose owner is missing from the store would be orphaned, so this
/// fails with [`IndexError::Consistency`].
pub fn verify_against(records: &[QuestionRecord], store: &dyn MetadataStore) -> IndexResult<()> {
    for record in records {
        if store.get(record.id)?.is_none() {
            return Err(IndexError::Consistency { id: record.id });
        }
    }
    Ok(())
}

fn validate_records(records: &[QuestionRecord]) -> IndexResult<()> {
    let mut seen = HashSet::with_capacity(records.len());
    for record in records {
        if !seen.insert(record.id) {
            return Err(IndexError::Validation {
                reason: format!("question {} appears more than once", record.id),
            });
        }
        if record.question_text.trim().is_empty() {
            return Err(IndexError::Validation {
                reason: format!("question {} has empty text", record.id),
            });
        }
    }
    Ok(())
}
