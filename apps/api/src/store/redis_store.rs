use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;
use redis::{AsyncCommands, Client};
use tracing::{debug, info};

use super::{record_key, RecordStore, StoreError};
use crate::models::resume::{ResumeRecord, StoredResume};

const FIELD_RECORD: &str = "record";
const FIELD_PDF: &str = "pdf";
const FIELD_IMAGE: &str = "image";

/// Redis-backed store. Each record is one hash (`record` JSON, `pdf`, `image`)
/// written with a single `HSET`, so a save either lands whole or not at all.
#[derive(Clone)]
pub struct RedisRecordStore {
    client: Client,
}

impl RedisRecordStore {
    pub fn open(redis_url: &str) -> Result<Self, StoreError> {
        let client = Client::open(redis_url)?;
        info!("Redis record store initialized");
        Ok(Self { client })
    }
}

#[async_trait]
impl RecordStore for RedisRecordStore {
    async fn save(
        &self,
        record: &ResumeRecord,
        pdf: Bytes,
        image: Bytes,
    ) -> Result<(), StoreError> {
        let key = record_key(&record.id);
        let encoded = serde_json::to_vec(record)?;
        let fields: [(&str, &[u8]); 3] = [
            (FIELD_RECORD, encoded.as_slice()),
            (FIELD_PDF, &pdf[..]),
            (FIELD_IMAGE, &image[..]),
        ];

        let mut conn = self.client.get_multiplexed_async_connection().await?;
        conn.hset_multiple::<_, _, _, ()>(&key, &fields).await?;

        debug!(
            key = %key,
            pdf_bytes = pdf.len(),
            image_bytes = image.len(),
            "Saved resume record"
        );
        Ok(())
    }

    async fn load(&self, id: &str) -> Result<Option<StoredResume>, StoreError> {
        let key = record_key(id);
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let mut fields: HashMap<String, Vec<u8>> = conn.hgetall(&key).await?;

        // HGETALL on a missing key yields an empty hash
        if fields.is_empty() {
            return Ok(None);
        }

        let mut take = |field: &'static str| {
            fields.remove(field).ok_or_else(|| StoreError::Corrupt {
                key: key.clone(),
                field,
            })
        };

        let record: ResumeRecord = serde_json::from_slice(&take(FIELD_RECORD)?)?;
        let pdf = Bytes::from(take(FIELD_PDF)?);
        let image = Bytes::from(take(FIELD_IMAGE)?);

        Ok(Some(StoredResume { record, pdf, image }))
    }
}
