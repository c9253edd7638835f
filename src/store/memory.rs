use crate::error::{StoreError, StoreResult};
use crate::store::MetadataStore;
use crate::types::{QuestionId, QuestionRecord};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;

/// Volatile store used for dry runs and tests.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    records: Arc<DashMap<QuestionId, QuestionRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MetadataStore for MemoryStore {
    fn create(&self, record: &QuestionRecord) -> StoreResult<()> {
        match self.records.entry(record.id) {
            Entry::Occupied(_) => Err(StoreError::DuplicateId { id: record.id }),
            Entry::Vacant(slot) => {
                slot.insert(record.clone());
                Ok(())
            }
        }
    }

    fn get(&self, id: QuestionId) -> StoreResult<Option<QuestionRecord>> {
        Ok(self.records.get(&id).map(|entry| entry.clone()))
    }

    fn len(&self) -> StoreResult<usize> {
        Ok(self.records.len())
    }

    fn ids(&self) -> StoreResult<Vec<QuestionId>> {
        let mut ids: Vec<QuestionId> = self.records.iter().map(|entry| *entry.key()).collect();
        ids.sort_unstable();
        Ok(ids)
    }
}
