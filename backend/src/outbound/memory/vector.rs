//! In-memory vector store adapter.
//!
//! Brute-force cosine search over a hash map; exact rather than
//! approximate, which is what tests want anyway. The production adapter
//! speaks to a managed ANN index through the same port.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::UserId;
use crate::domain::ports::{
    EMBEDDING_DIMENSIONS, VectorFilter, VectorMatch, VectorMetadata, VectorStore,
    VectorStoreError,
};
use crate::domain::resonance::cosine_similarity;

#[derive(Debug, Clone)]
struct Record {
    values: Vec<f32>,
    metadata: VectorMetadata,
}

/// Exact in-process vector index keyed by user id.
#[derive(Default)]
pub struct MemoryVectorStore {
    records: Mutex<HashMap<UserId, Record>>,
}

impl MemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored vectors.
    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn upsert(
        &self,
        values: &[f32],
        metadata: &VectorMetadata,
    ) -> Result<(), VectorStoreError> {
        if values.len() != EMBEDDING_DIMENSIONS {
            return Err(VectorStoreError::dimension_mismatch(
                EMBEDDING_DIMENSIONS,
                values.len(),
            ));
        }
        let mut records = self.records.lock().await;
        records.insert(
            metadata.user_id,
            Record {
                values: values.to_vec(),
                metadata: metadata.clone(),
            },
        );
        Ok(())
    }

    async fn fetch(&self, user_id: UserId) -> Result<Option<Vec<f32>>, VectorStoreError> {
        let records = self.records.lock().await;
        Ok(records.get(&user_id).map(|record| record.values.clone()))
    }

    async fn query_nearest(
        &self,
        vector: &[f32],
        top_k: usize,
        filter: &VectorFilter,
    ) -> Result<Vec<VectorMatch>, VectorStoreError> {
        if vector.len() != EMBEDDING_DIMENSIONS {
            return Err(VectorStoreError::dimension_mismatch(
                EMBEDDING_DIMENSIONS,
                vector.len(),
            ));
        }

        let records = self.records.lock().await;
        let mut hits: Vec<VectorMatch> = records
            .values()
            .filter(|record| filter.matches(&record.metadata))
            .map(|record| VectorMatch {
                user_id: record.metadata.user_id,
                score: cosine_similarity(vector, &record.values),
                metadata: record.metadata.clone(),
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.user_id.cmp(&b.user_id))
        });
        hits.truncate(top_k);
        Ok(hits)
    }

    async fn delete(&self, user_id: UserId) -> Result<(), VectorStoreError> {
        let mut records = self.records.lock().await;
        records.remove(&user_id);
        Ok(())
    }
}
