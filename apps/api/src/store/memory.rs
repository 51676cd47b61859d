use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::RwLock;

use super::{record_key, RecordStore, StoreError};
use crate::models::resume::{ResumeRecord, StoredResume};

/// Process-local store. Contents vanish with the process.
#[derive(Default)]
pub struct MemoryRecordStore {
    entries: RwLock<HashMap<String, StoredResume>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn save(
        &self,
        record: &ResumeRecord,
        pdf: Bytes,
        image: Bytes,
    ) -> Result<(), StoreError> {
        let stored = StoredResume {
            record: record.clone(),
            pdf,
            image,
        };
        self.entries
            .write()
            .await
            .insert(record_key(&record.id), stored);
        Ok(())
    }

    async fn load(&self, id: &str) -> Result<Option<StoredResume>, StoreError> {
        Ok(self.entries.read().await.get(&record_key(id)).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::resume::JobContext;

    fn record(id: &str) -> ResumeRecord {
        ResumeRecord::scaffold(
            id.to_string(),
            &JobContext {
                company_name: "OpenAI".to_string(),
                job_title: "Engineer".to_string(),
                job_description: String::new(),
            },
        )
    }

    #[tokio::test]
    async fn test_load_unknown_id_is_none() {
        let store = MemoryRecordStore::new();
        assert!(store.load("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_load_twice_returns_equal_data() {
        let store = MemoryRecordStore::new();
        store
            .save(
                &record("r1"),
                Bytes::from_static(b"%PDF-1.7"),
                Bytes::from_static(b"\x89PNG"),
            )
            .await
            .unwrap();

        let first = store.load("r1").await.unwrap().unwrap();
        let second = store.load("r1").await.unwrap().unwrap();
        assert_eq!(first, second);
        assert_eq!(first.record.company_name, "OpenAI");
        assert_eq!(&first.pdf[..], b"%PDF-1.7");
        assert_eq!(&first.image[..], b"\x89PNG");
    }

    #[tokio::test]
    async fn test_records_are_keyed_by_id() {
        let store = MemoryRecordStore::new();
        store
            .save(&record("a"), Bytes::new(), Bytes::new())
            .await
            .unwrap();
        store
            .save(&record("b"), Bytes::new(), Bytes::new())
            .await
            .unwrap();
        assert_eq!(store.len().await, 2);
        assert_eq!(store.load("b").await.unwrap().unwrap().record.id, "b");
    }
}
