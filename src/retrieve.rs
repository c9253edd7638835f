//! Join of similarity results against the metadata store.
//!
//! The index only knows ids. [`Retriever`] resolves them to full records and
//! treats an id the store cannot resolve as a consistency failure between the
//! two, never as "no result".

use crate::embedding::Embedder;
use crate::error::{IndexError, IndexResult};
use crate::index::{Neighbor, SimilarityIndex};
use crate::store::MetadataStore;
use crate::types::{QuestionId, QuestionRecord};
use serde::Serialize;

/// A nearest-neighbour hit resolved to its record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Match {
    pub record: QuestionRecord,
    /// Squared Euclidean distance to the query.
    pub distance: f32,
}

/// Query-side view over a loaded index and the store it was built from.
pub struct Retriever<'a> {
    index: &'a SimilarityIndex,
    store: &'a dyn MetadataStore,
}

impl<'a> Retriever<'a> {
    pub fn new(index: &'a SimilarityIndex, store: &'a dyn MetadataStore) -> Self {
        Self { index, store }
    }

    /// Resolve an id returned by the index.
    ///
    /// # Errors
    /// [`IndexError::Consistency`] if the store has no record for `id`.
    pub fn lookup(&self, id: QuestionId) -> IndexResult<QuestionRecord> {
        self.store
            .get(id)?
            .ok_or(IndexError::Consistency { id })
    }

    /// Resolve every neighbour, preserving order.
    pub fn resolve(&self, neighbors: &[Neighbor]) -> IndexResult<Vec<Match>> {
        neighbors
            .iter()
            .map(|neighbor| {
                Ok(Match {
                    record: self.lookup(neighbor.id)?,
                    distance: neighbor.distance,
                })
            })
            .collect()
    }

    /// Query the index with `text` and join the hits against the store.
    pub fn find_similar(
        &self,
        text: &str,
        embedder: &dyn Embedder,
        k: usize,
    ) -> IndexResult<Vec<Match>> {
        let neighbors = self.index.query(text, embedder, k)?;
        self.resolve(&neighbors)
    }
}
