//! Durable question store backed by sled.
//!
//! Records live in a single tree keyed by the big-endian id, so iteration
//! order is ascending id order. Values are JSON-encoded records.

use crate::error::{StoreError, StoreResult};
use crate::store::MetadataStore;
use crate::types::{QuestionId, QuestionRecord};
use sled::Tree;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

const QUESTIONS_TREE: &str = "questions";

/// Question store persisted on disk.
#[derive(Clone)]
pub struct SledStore {
    db: Arc<sled::Db>,
    questions: Tree,
}

impl SledStore {
    /// Open or create the store at `path`.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        let db = sled::open(path)?;
        let questions = db.open_tree(QUESTIONS_TREE)?;
        debug!("Opened question store at {}", path.display());
        Ok(Self {
            db: Arc::new(db),
            questions,
        })
    }

    /// Open a store that is deleted when dropped.
    pub fn temporary() -> StoreResult<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        let questions = db.open_tree(QUESTIONS_TREE)?;
        Ok(Self {
            db: Arc::new(db),
            questions,
        })
    }

    fn decode_key(key: &[u8]) -> StoreResult<QuestionId> {
        let bytes: [u8; 4] = key.try_into().map_err(|_| StoreError::Corrupted {
            reason: format!("key of length {} is not a question id", key.len()),
        })?;
        QuestionId::from_be_bytes(bytes).ok_or_else(|| StoreError::Corrupted {
            reason: "zero question id in store".to_string(),
        })
    }
}

impl std::fmt::Debug for SledStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SledStore")
            .field("questions", &self.questions.len())
            .finish()
    }
}

impl MetadataStore for SledStore {
    fn create(&self, record: &QuestionRecord) -> StoreResult<()> {
        let key = record.id.to_be_bytes();
        let value = serde_json::to_vec(record)?;

        // Insert only if absent, so an existing record is never overwritten.
        let swapped = self
            .questions
            .compare_and_swap(key, None as Option<&[u8]>, Some(value))?;
        if swapped.is_err() {
            return Err(StoreError::DuplicateId { id: record.id });
        }

        self.db.flush()?;
        Ok(())
    }

    fn get(&self, id: QuestionId) -> StoreResult<Option<QuestionRecord>> {
        match self.questions.get(id.to_be_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn len(&self) -> StoreResult<usize> {
        Ok(self.questions.len())
    }

    fn ids(&self) -> StoreResult<Vec<QuestionId>> {
        let mut ids = Vec::with_capacity(self.questions.len());
        for key in self.questions.iter().keys() {
            ids.push(Self::decode_key(&key?)?);
        }
        Ok(ids)
    }

    fn records(&self) -> StoreResult<Vec<QuestionRecord>> {
        let mut records = Vec::with_capacity(self.questions.len());
        for item in self.questions.iter() {
            let (_key, value) = item?;
            records.push(serde_json::from_slice(&value)?);
        }
        Ok(records)
    }
}
