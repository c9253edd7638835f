//! Metadata store for exam questions.
//!
//! The store is the source of truth for question metadata. It is populated
//! once by the import path and then read by id when the similarity index
//! returns a match.

mod memory;
mod sled_store;

pub use memory::MemoryStore;
pub use sled_store::SledStore;

use crate::error::StoreResult;
use crate::types::{QuestionId, QuestionRecord};

/// Persistence capability for question records.
///
/// Implementations must reject a `create` whose id already exists with
/// [`StoreError::DuplicateId`](crate::error::StoreError::DuplicateId) and
/// must leave other records untouched when a single insert fails.
pub trait MetadataStore: Send + Sync {
    /// Persist a new record.
    fn create(&self, record: &QuestionRecord) -> StoreResult<()>;

    /// Look up a record by id.
    fn get(&self, id: QuestionId) -> StoreResult<Option<QuestionRecord>>;

    /// Number of stored records.
    fn len(&self) -> StoreResult<usize>;

    fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }

    /// All stored ids in ascending order.
    fn ids(&self) -> StoreResult<Vec<QuestionId>>;

    /// All stored records in ascending id order.
    fn records(&self) -> StoreResult<Vec<QuestionRecord>> {
        let mut records = Vec::new();
        for id in self.ids()? {
            if let Some(record) = self.get(id)? {
                records.push(record);
            }
        }
        Ok(records)
    }
}
