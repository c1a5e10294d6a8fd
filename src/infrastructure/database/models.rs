use chrono::{DateTime, Utc};
use diesel::prelude::*;
use pgvector::Vector;
use uuid::Uuid;

use crate::domain::entities::{ColumnDocument, EmbeddingRecord, SchemaDocument};
use crate::infrastructure::database::schema::schema_embeddings;

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = schema_embeddings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct SchemaEmbeddingModel {
    pub id: Uuid,
    pub relation_schema: String,
    pub relation_name: String,
    pub relation_kind: String,
    pub relation_comment: Option<String>,
    pub view_definition: Option<String>,
    #[diesel(column_name = column_defs)]
    pub columns: serde_json::Value,
    pub rendered_text: String,
    pub embedding: Vector,
    pub indexed_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = schema_embeddings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewSchemaEmbeddingModel {
    pub relation_schema: String,
    pub relation_name: String,
    pub relation_kind: String,
    pub relation_comment: Option<String>,
    pub view_definition: Option<String>,
    #[diesel(column_name = column_defs)]
    pub columns: serde_json::Value,
    pub rendered_text: String,
    pub embedding: Vector,
    pub indexed_at: DateTime<Utc>,
}

impl TryFrom<&EmbeddingRecord> for NewSchemaEmbeddingModel {
    type Error = String;

    fn try_from(record: &EmbeddingRecord) -> Result<Self, Self::Error> {
        let document = record.document();
        let columns = serde_json::to_value(document.columns())
            .map_err(|e| format!("Failed to serialize columns: {}", e))?;

        Ok(Self {
            relation_schema: document.schema().to_string(),
            relation_name: document.name().to_string(),
            relation_kind: document.kind().as_str().to_string(),
            relation_comment: document.comment().map(String::from),
            view_definition: document.view_definition().map(String::from),
            columns,
            rendered_text: document.rendered_text(),
            embedding: record.vector().clone(),
            indexed_at: Utc::now(),
        })
    }
}

impl TryFrom<SchemaEmbeddingModel> for SchemaDocument {
    type Error = String;

    fn try_from(model: SchemaEmbeddingModel) -> Result<Self, Self::Error> {
        let kind = model
            .relation_kind
            .parse()
            .map_err(|e: String| format!("Stored relation kind is invalid: {}", e))?;

        let columns: Vec<ColumnDocument> = serde_json::from_value(model.columns)
            .map_err(|e| format!("Stored columns are invalid: {}", e))?;

        Ok(SchemaDocument::new(
            model.relation_schema,
            model.relation_name,
            kind,
            model.relation_comment,
            columns,
            model.view_definition,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::RelationKind;

    fn record() -> EmbeddingRecord {
        EmbeddingRecord::new(
            SchemaDocument::new(
                "sales".to_string(),
                "contracts".to_string(),
                RelationKind::Table,
                Some("Contracts".to_string()),
                vec![ColumnDocument::new(
                    "contract_id".to_string(),
                    "integer".to_string(),
                    false,
                    None,
                )],
                None,
            ),
            Vector::from(vec![0.5, 0.5]),
        )
    }

    #[test]
    fn test_round_trip_through_the_row_model() {
        let record = record();
        let new_model = NewSchemaEmbeddingModel::try_from(&record).unwrap();
        assert_eq!(new_model.relation_kind, "table");
        assert_eq!(new_model.rendered_text, record.document().rendered_text());

        let stored = SchemaEmbeddingModel {
            id: Uuid::new_v4(),
            relation_schema: new_model.relation_schema.clone(),
            relation_name: new_model.relation_name.clone(),
            relation_kind: new_model.relation_kind.clone(),
            relation_comment: new_model.relation_comment.clone(),
            view_definition: new_model.view_definition.clone(),
            columns: new_model.columns.clone(),
            rendered_text: new_model.rendered_text.clone(),
            embedding: new_model.embedding.clone(),
            indexed_at: new_model.indexed_at,
        };

        let document = SchemaDocument::try_from(stored).unwrap();
        assert_eq!(&document, record.document());
    }

    #[test]
    fn test_invalid_stored_kind_is_rejected() {
        let record = record();
        let new_model = NewSchemaEmbeddingModel::try_from(&record).unwrap();
        let stored = SchemaEmbeddingModel {
            id: Uuid::new_v4(),
            relation_schema: new_model.relation_schema,
            relation_name: new_model.relation_name,
            relation_kind: "sequence".to_string(),
            relation_comment: None,
            view_definition: None,
            columns: new_model.columns,
            rendered_text: new_model.rendered_text,
            embedding: new_model.embedding,
            indexed_at: new_model.indexed_at,
        };

        assert!(SchemaDocument::try_from(stored).is_err());
    }
}
