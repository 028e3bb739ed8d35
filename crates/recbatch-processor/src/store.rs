//! Record store contract and an in-memory implementation.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use recbatch_core::{Record, RecordId, StoreError};

/// Storage contract the batch processor consumes.
///
/// Implementations must be safe to call concurrently from many tasks; the
/// processor adds no locking of its own around these calls.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Ids of every stored record.
    async fn find_all_ids(&self) -> Result<Vec<RecordId>, StoreError>;

    /// Load a record, `Ok(None)` if it does not exist.
    async fn find_by_id(&self, id: RecordId) -> Result<Option<Record>, StoreError>;

    /// Persist a record and return the stored form.
    ///
    /// Records without an id are assigned one.
    async fn save(&self, record: Record) -> Result<Record, StoreError>;
}

struct Inner {
    records: BTreeMap<RecordId, Record>,
    /// `None` once `u64::MAX` has been handed out.
    next_id: Option<RecordId>,
}

/// Map-backed store with sequential id allocation starting at 1.
pub struct InMemoryRecordStore {
    inner: RwLock<Inner>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                records: BTreeMap::new(),
                next_id: Some(RecordId::new(1)),
            }),
        }
    }

    /// Save each record in order, returning the stored forms.
    pub async fn seed(
        &self,
        records: impl IntoIterator<Item = Record>,
    ) -> Result<Vec<Record>, StoreError> {
        let mut saved = Vec::new();
        for record in records {
            saved.push(self.insert(record).await?);
        }
        Ok(saved)
    }

    /// Store a record, assigning an id if it has none.
    pub async fn insert(&self, mut record: Record) -> Result<Record, StoreError> {
        let mut inner = self.inner.write().await;
        let id = match record.id {
            Some(id) => id,
            None => inner.next_id.ok_or(StoreError::IdsExhausted)?,
        };
        if inner.next_id.is_some_and(|next| id >= next) {
            inner.next_id = id.checked_next();
        }
        record.id = Some(id);
        inner.records.insert(id, record.clone());
        Ok(record)
    }

    /// Current copy of a record.
    pub async fn get(&self, id: RecordId) -> Option<Record> {
        self.inner.read().await.records.get(&id).cloned()
    }
}

impl Default for InMemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn find_all_ids(&self) -> Result<Vec<RecordId>, StoreError> {
        Ok(self.inner.read().await.records.keys().copied().collect())
    }

    async fn find_by_id(&self, id: RecordId) -> Result<Option<Record>, StoreError> {
        Ok(self.get(id).await)
    }

    async fn save(&self, record: Record) -> Result<Record, StoreError> {
        self.insert(record).await
    }
}
