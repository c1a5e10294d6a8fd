use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use pgvector::Vector;

use crate::domain::entities::{EmbeddingRecord, ScoredDocument};
use crate::domain::repositories::VectorIndex;
use crate::domain::repositories::vector_index::VectorIndexError;

/// In-process vector index. `rebuild` assembles a complete new snapshot
/// and swaps it in under the write lock, so concurrent readers observe
/// either the previous full set or the new full set, never a mix.
pub struct InMemoryVectorIndex {
    dimension: usize,
    snapshot: RwLock<Arc<Vec<EmbeddingRecord>>>,
}

impl InMemoryVectorIndex {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            snapshot: RwLock::new(Arc::new(Vec::new())),
        }
    }

    fn current(&self) -> Arc<Vec<EmbeddingRecord>> {
        match self.snapshot.read() {
            Ok(guard) => guard.clone(),
            // A poisoned lock still holds a consistent snapshot.
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl VectorIndex for InMemoryVectorIndex {
    async fn rebuild(&self, records: Vec<EmbeddingRecord>) -> Result<(), VectorIndexError> {
        for record in &records {
            if record.dimension() != self.dimension {
                return Err(VectorIndexError::DimensionMismatch {
                    expected: self.dimension,
                    actual: record.dimension(),
                });
            }
        }

        let next = Arc::new(records);
        match self.snapshot.write() {
            Ok(mut guard) => *guard = next,
            Err(poisoned) => *poisoned.into_inner() = next,
        }
        Ok(())
    }

    async fn query(
        &self,
        query: &Vector,
        k: usize,
    ) -> Result<Vec<ScoredDocument>, VectorIndexError> {
        if query.as_slice().len() != self.dimension {
            return Err(VectorIndexError::DimensionMismatch {
                expected: self.dimension,
                actual: query.as_slice().len(),
            });
        }

        let snapshot = self.current();
        let mut scored: Vec<ScoredDocument> = snapshot
            .iter()
            .filter_map(|record| {
                record
                    .cosine_similarity(query)
                    .ok()
                    .map(|score| ScoredDocument {
                        document: record.document().clone(),
                        score,
                    })
            })
            .collect();

        // Stable sort keeps insertion order for equal scores.
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);

        Ok(scored)
    }

    async fn is_empty(&self) -> Result<bool, VectorIndexError> {
        Ok(self.current().is_empty())
    }

    async fn count(&self) -> Result<usize, VectorIndexError> {
        Ok(self.current().len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{RelationKind, SchemaDocument};

    fn record(name: &str, vector: Vec<f32>) -> EmbeddingRecord {
        EmbeddingRecord::new(
            SchemaDocument::new(
                "public".to_string(),
                name.to_string(),
                RelationKind::Table,
                None,
                Vec::new(),
                None,
            ),
            Vector::from(vector),
        )
    }

    #[tokio::test]
    async fn test_empty_index_answers_empty() {
        let index = InMemoryVectorIndex::new(2);

        assert!(index.is_empty().await.unwrap());
        assert_eq!(index.count().await.unwrap(), 0);
        assert!(index
            .query(&Vector::from(vec![1.0, 0.0]), 5)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_query_orders_by_similarity_and_caps_at_k() {
        let index = InMemoryVectorIndex::new(2);
        index
            .rebuild(vec![
                record("far", vec![0.0, 1.0]),
                record("near", vec![1.0, 0.0]),
                record("middle", vec![1.0, 1.0]),
            ])
            .await
            .unwrap();

        let results = index.query(&Vector::from(vec![1.0, 0.0]), 2).await.unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].document.name(), "near");
        assert_eq!(results[1].document.name(), "middle");
        assert!(results[0].score >= results[1].score);
    }

    #[tokio::test]
    async fn test_equal_scores_keep_insertion_order() {
        let index = InMemoryVectorIndex::new(2);
        index
            .rebuild(vec![
                record("first", vec![1.0, 0.0]),
                record("second", vec![2.0, 0.0]),
                record("third", vec![3.0, 0.0]),
            ])
            .await
            .unwrap();

        let results = index.query(&Vector::from(vec![1.0, 0.0]), 3).await.unwrap();

        let names: Vec<&str> = results.iter().map(|r| r.document.name()).collect();
        assert_eq!(names, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_rebuild_replaces_the_whole_snapshot() {
        let index = InMemoryVectorIndex::new(2);
        index
            .rebuild(vec![record("old", vec![1.0, 0.0])])
            .await
            .unwrap();
        index
            .rebuild(vec![record("new_a", vec![1.0, 0.0]), record("new_b", vec![0.0, 1.0])])
            .await
            .unwrap();

        assert_eq!(index.count().await.unwrap(), 2);
        let results = index.query(&Vector::from(vec![1.0, 0.0]), 10).await.unwrap();
        assert!(results.iter().all(|r| r.document.name() != "old"));
    }

    #[tokio::test]
    async fn test_rebuild_with_empty_set_is_valid() {
        let index = InMemoryVectorIndex::new(2);
        index
            .rebuild(vec![record("doc", vec![1.0, 0.0])])
            .await
            .unwrap();

        index.rebuild(Vec::new()).await.unwrap();
        assert!(index.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn test_dimension_mismatch_is_rejected() {
        let index = InMemoryVectorIndex::new(2);

        let rebuild_error = index
            .rebuild(vec![record("doc", vec![1.0, 0.0, 0.0])])
            .await
            .unwrap_err();
        assert!(matches!(
            rebuild_error,
            VectorIndexError::DimensionMismatch { expected: 2, actual: 3 }
        ));

        let query_error = index
            .query(&Vector::from(vec![1.0]), 1)
            .await
            .unwrap_err();
        assert!(matches!(
            query_error,
            VectorIndexError::DimensionMismatch { expected: 2, actual: 1 }
        ));
    }

    #[tokio::test]
    async fn test_readers_see_old_set_while_new_set_is_prepared() {
        let index = Arc::new(InMemoryVectorIndex::new(2));
        index
            .rebuild(vec![record("stable", vec![1.0, 0.0])])
            .await
            .unwrap();

        // Concurrent readers during a rebuild: every observed count must
        // be one of the two complete set sizes, never in between.
        let reader = {
            let index = index.clone();
            tokio::spawn(async move {
                for _ in 0..50 {
                    let count = index.count().await.unwrap();
                    assert!(count == 1 || count == 3);
                    tokio::task::yield_now().await;
                }
            })
        };

        index
            .rebuild(vec![
                record("a", vec![1.0, 0.0]),
                record("b", vec![0.0, 1.0]),
                record("c", vec![1.0, 1.0]),
            ])
            .await
            .unwrap();

        reader.await.unwrap();
    }
}
