//! Similarity retrieval and generation of 수능 English exam questions.
//!
//! Questions are imported from CSV into a [`MetadataStore`], embedded into a
//! [`SimilarityIndex`], and retrieved by nearest-neighbour search. A
//! retrieved question seeds the [`generator`] pipeline that writes a new
//! question in the same style.

pub mod config;
pub mod display;
pub mod embedding;
pub mod error;
pub mod generator;
pub mod import;
pub mod index;
pub mod io;
pub mod retrieve;
pub mod store;
pub mod types;

// Explicit exports for better API clarity
pub use config::Settings;
pub use embedding::{Embedder, FastEmbedder, StubEmbedder};
pub use error::{
    GenerationError, GenerationResult, ImportError, ImportResult, IndexError, IndexResult,
    StoreError, StoreResult,
};
pub use import::{CsvSource, ImportReport, RowFailure, import_all};
pub use index::{IndexBuilder, Neighbor, SimilarityIndex};
pub use retrieve::{Match, Retriever};
pub use store::{MemoryStore, MetadataStore, SledStore};
pub use types::{QuestionId, QuestionRecord, QuestionType};
