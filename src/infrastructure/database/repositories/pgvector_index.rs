use async_trait::async_trait;
use diesel::prelude::*;
use pgvector::{Vector, VectorExpressionMethods};

use crate::domain::entities::{EmbeddingRecord, SchemaDocument, ScoredDocument};
use crate::domain::repositories::VectorIndex;
use crate::domain::repositories::vector_index::VectorIndexError;
use crate::infrastructure::database::models::{NewSchemaEmbeddingModel, SchemaEmbeddingModel};
use crate::infrastructure::database::schema::schema_embeddings;
use crate::infrastructure::database::{DbPool, get_connection_from_pool};

/// Vector index stored in the service's own Postgres database via
/// pgvector. `rebuild` replaces the table contents inside a single
/// transaction, so readers see either the old set or the new set.
pub struct PgVectorIndex {
    pool: DbPool,
    dimension: usize,
}

impl PgVectorIndex {
    pub fn new(pool: DbPool, dimension: usize) -> Self {
        Self { pool, dimension }
    }

    fn check_dimensions(&self, records: &[EmbeddingRecord]) -> Result<(), VectorIndexError> {
        for record in records {
            if record.dimension() != self.dimension {
                return Err(VectorIndexError::DimensionMismatch {
                    expected: self.dimension,
                    actual: record.dimension(),
                });
            }
        }
        Ok(())
    }
}

#[async_trait]
impl VectorIndex for PgVectorIndex {
    async fn rebuild(&self, records: Vec<EmbeddingRecord>) -> Result<(), VectorIndexError> {
        self.check_dimensions(&records)?;

        let new_models: Vec<NewSchemaEmbeddingModel> = records
            .iter()
            .map(NewSchemaEmbeddingModel::try_from)
            .collect::<Result<_, _>>()
            .map_err(VectorIndexError::StorageError)?;

        let mut conn = get_connection_from_pool(&self.pool)
            .map_err(|e| VectorIndexError::ConnectionError(e.to_string()))?;

        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            diesel::delete(schema_embeddings::table).execute(conn)?;
            if !new_models.is_empty() {
                diesel::insert_into(schema_embeddings::table)
                    .values(&new_models)
                    .execute(conn)?;
            }
            Ok(())
        })
        .map_err(|e| VectorIndexError::StorageError(e.to_string()))?;

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

        let mut conn = get_connection_from_pool(&self.pool)
            .map_err(|e| VectorIndexError::ConnectionError(e.to_string()))?;

        // Secondary ordering keys make equal-distance results
        // deterministic across runs.
        let rows: Vec<(SchemaEmbeddingModel, f64)> = schema_embeddings::table
            .select((
                SchemaEmbeddingModel::as_select(),
                schema_embeddings::embedding.cosine_distance(query.clone()),
            ))
            .order(schema_embeddings::embedding.cosine_distance(query.clone()))
            .then_order_by(schema_embeddings::relation_schema.asc())
            .then_order_by(schema_embeddings::relation_name.asc())
            .limit(k as i64)
            .load(&mut conn)
            .map_err(|e| VectorIndexError::StorageError(e.to_string()))?;

        rows.into_iter()
            .map(|(model, distance)| {
                let document = SchemaDocument::try_from(model)
                    .map_err(VectorIndexError::StorageError)?;
                Ok(ScoredDocument {
                    document,
                    score: 1.0 - distance as f32,
                })
            })
            .collect()
    }

    async fn is_empty(&self) -> Result<bool, VectorIndexError> {
        Ok(self.count().await? == 0)
    }

    async fn count(&self) -> Result<usize, VectorIndexError> {
        let mut conn = get_connection_from_pool(&self.pool)
            .map_err(|e| VectorIndexError::ConnectionError(e.to_string()))?;

        let count: i64 = schema_embeddings::table
            .count()
            .get_result(&mut conn)
            .map_err(|e| VectorIndexError::StorageError(e.to_string()))?;

        Ok(count as usize)
    }
}
