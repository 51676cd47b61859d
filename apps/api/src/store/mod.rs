//! Record Store: persists finished reviews together with their PDF and rendered page.
//!
//! Every record lives under the key `resume_<id>`, so records never collide
//! with unrelated values sharing the same backend. Records are written once
//! and never updated or deleted through this interface.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

use crate::models::resume::{ResumeRecord, StoredResume};

pub mod memory;
pub mod redis_store;

pub use self::memory::MemoryRecordStore;
pub use self::redis_store::RedisRecordStore;

const KEY_PREFIX: &str = "resume_";

/// Storage key for a record id.
pub fn record_key(id: &str) -> String {
    format!("{KEY_PREFIX}{id}")
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage unavailable: {0}")]
    Unavailable(#[from] redis::RedisError),

    #[error("record encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("stored record {key} is incomplete: missing field '{field}'")]
    Corrupt { key: String, field: &'static str },
}

/// Key-value persistence for review records.
///
/// `load` of an unknown id is `Ok(None)`, never an error.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn save(&self, record: &ResumeRecord, pdf: Bytes, image: Bytes)
        -> Result<(), StoreError>;

    async fn load(&self, id: &str) -> Result<Option<StoredResume>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_key_is_namespaced() {
        assert_eq!(record_key("1234"), "resume_1234");
    }
}
