use std::collections::BTreeMap;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::sql_types::Text;

use crate::domain::entities::{ColumnDocument, RelationKind, SchemaDocument};
use crate::domain::repositories::SchemaRepository;
use crate::domain::repositories::schema_repository::SchemaRepositoryError;
use crate::infrastructure::database::{DbPool, get_connection_from_pool};

/// One row per column of every user-visible table and view, with the
/// relation's own comment repeated on each row. System schemas are
/// excluded in SQL; an optional include-list narrows further in code.
const RELATION_COLUMNS_QUERY: &str = "
    SELECT
        c.table_schema::text AS table_schema,
        c.table_name::text AS table_name,
        t.table_type::text AS table_type,
        c.column_name::text AS column_name,
        c.data_type::text AS data_type,
        c.is_nullable::text AS is_nullable,
        COALESCE(col_d.description, '') AS column_comment,
        COALESCE(rel_d.description, '') AS relation_comment
    FROM information_schema.columns c
    JOIN information_schema.tables t
        ON t.table_schema = c.table_schema AND t.table_name = c.table_name
    LEFT JOIN pg_catalog.pg_namespace ns
        ON ns.nspname = c.table_schema
    LEFT JOIN pg_catalog.pg_class cls
        ON cls.relname = c.table_name AND cls.relnamespace = ns.oid
    LEFT JOIN pg_catalog.pg_description col_d
        ON col_d.objoid = cls.oid AND col_d.objsubid = c.ordinal_position
    LEFT JOIN pg_catalog.pg_description rel_d
        ON rel_d.objoid = cls.oid AND rel_d.objsubid = 0
    WHERE c.table_schema NOT IN ('pg_catalog', 'information_schema', 'pg_toast')
      AND c.table_schema NOT LIKE 'pg_temp_%'
      AND t.table_type IN ('BASE TABLE', 'VIEW')
    ORDER BY c.table_schema, c.table_name, c.ordinal_position
";

const VIEW_DEFINITIONS_QUERY: &str = "
    SELECT
        v.table_schema::text AS table_schema,
        v.table_name::text AS table_name,
        COALESCE(v.view_definition, '')::text AS view_definition
    FROM information_schema.views v
    WHERE v.table_schema NOT IN ('pg_catalog', 'information_schema', 'pg_toast')
      AND v.table_schema NOT LIKE 'pg_temp_%'
    ORDER BY v.table_schema, v.table_name
";

#[derive(Debug, QueryableByName)]
pub struct RelationColumnRow {
    #[diesel(sql_type = Text)]
    pub table_schema: String,
    #[diesel(sql_type = Text)]
    pub table_name: String,
    #[diesel(sql_type = Text)]
    pub table_type: String,
    #[diesel(sql_type = Text)]
    pub column_name: String,
    #[diesel(sql_type = Text)]
    pub data_type: String,
    #[diesel(sql_type = Text)]
    pub is_nullable: String,
    #[diesel(sql_type = Text)]
    pub column_comment: String,
    #[diesel(sql_type = Text)]
    pub relation_comment: String,
}

#[derive(Debug, QueryableByName)]
pub struct ViewDefinitionRow {
    #[diesel(sql_type = Text)]
    pub table_schema: String,
    #[diesel(sql_type = Text)]
    pub table_name: String,
    #[diesel(sql_type = Text)]
    pub view_definition: String,
}

pub struct PostgresSchemaRepository {
    pool: DbPool,
    include_schemas: Vec<String>,
}

impl PostgresSchemaRepository {
    pub fn new(pool: DbPool, include_schemas: Vec<String>) -> Self {
        Self {
            pool,
            include_schemas,
        }
    }
}

#[async_trait]
impl SchemaRepository for PostgresSchemaRepository {
    async fn load_schema_documents(&self) -> Result<Vec<SchemaDocument>, SchemaRepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)
            .map_err(|e| SchemaRepositoryError::ConnectionError(e.to_string()))?;

        let column_rows: Vec<RelationColumnRow> = diesel::sql_query(RELATION_COLUMNS_QUERY)
            .load(&mut conn)
            .map_err(|e| SchemaRepositoryError::QueryError(e.to_string()))?;

        let view_rows: Vec<ViewDefinitionRow> = diesel::sql_query(VIEW_DEFINITIONS_QUERY)
            .load(&mut conn)
            .map_err(|e| SchemaRepositoryError::QueryError(e.to_string()))?;

        let documents = group_into_documents(column_rows, view_rows, &self.include_schemas);
        tracing::info!(count = documents.len(), "Extracted schema documents from catalog");

        Ok(documents)
    }

    async fn health_check(&self) -> Result<(), SchemaRepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)
            .map_err(|e| SchemaRepositoryError::ConnectionError(e.to_string()))?;

        diesel::sql_query("SELECT 1")
            .execute(&mut conn)
            .map_err(|e| SchemaRepositoryError::QueryError(e.to_string()))?;
        Ok(())
    }
}

/// Folds the per-column rows into one document per relation, preserving
/// the catalog's ordinal column order. Deterministic for a fixed
/// catalog: relations sort by qualified name, columns keep row order.
pub fn group_into_documents(
    column_rows: Vec<RelationColumnRow>,
    view_rows: Vec<ViewDefinitionRow>,
    include_schemas: &[String],
) -> Vec<SchemaDocument> {
    let view_definitions: BTreeMap<(String, String), String> = view_rows
        .into_iter()
        .map(|row| ((row.table_schema, row.table_name), row.view_definition))
        .collect();

    struct PendingRelation {
        kind: RelationKind,
        comment: String,
        columns: Vec<ColumnDocument>,
    }

    let mut relations: BTreeMap<(String, String), PendingRelation> = BTreeMap::new();

    for row in column_rows {
        let RelationColumnRow {
            table_schema,
            table_name,
            table_type,
            column_name,
            data_type,
            is_nullable,
            column_comment,
            relation_comment,
        } = row;

        if !include_schemas.is_empty() && !include_schemas.contains(&table_schema) {
            continue;
        }

        let kind = if table_type == "VIEW" {
            RelationKind::View
        } else {
            RelationKind::Table
        };

        let entry = relations
            .entry((table_schema, table_name))
            .or_insert_with(|| PendingRelation {
                kind,
                comment: relation_comment,
                columns: Vec::new(),
            });

        entry.columns.push(ColumnDocument::new(
            column_name,
            data_type,
            is_nullable == "YES",
            Some(column_comment),
        ));
    }

    relations
        .into_iter()
        .map(|((schema, name), relation)| {
            let view_definition = match relation.kind {
                RelationKind::View => view_definitions.get(&(schema.clone(), name.clone())).cloned(),
                RelationKind::Table => None,
            };
            SchemaDocument::new(
                schema,
                name,
                relation.kind,
                Some(relation.comment),
                relation.columns,
                view_definition,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column_row(
        schema: &str,
        table: &str,
        table_type: &str,
        column: &str,
        data_type: &str,
        nullable: &str,
        column_comment: &str,
        relation_comment: &str,
    ) -> RelationColumnRow {
        RelationColumnRow {
            table_schema: schema.to_string(),
            table_name: table.to_string(),
            table_type: table_type.to_string(),
            column_name: column.to_string(),
            data_type: data_type.to_string(),
            is_nullable: nullable.to_string(),
            column_comment: column_comment.to_string(),
            relation_comment: relation_comment.to_string(),
        }
    }

    #[test]
    fn test_rows_fold_into_one_document_per_relation() {
        let rows = vec![
            column_row(
                "sales",
                "contracts",
                "BASE TABLE",
                "contract_id",
                "integer",
                "NO",
                "Unique identifier for the contract.",
                "Stores information about sales contracts.",
            ),
            column_row(
                "sales",
                "contracts",
                "BASE TABLE",
                "status",
                "character varying",
                "YES",
                "",
                "Stores information about sales contracts.",
            ),
            column_row(
                "public",
                "invoices",
                "BASE TABLE",
                "invoice_id",
                "integer",
                "NO",
                "",
                "",
            ),
        ];

        let documents = group_into_documents(rows, Vec::new(), &[]);

        assert_eq!(documents.len(), 2);
        // BTreeMap ordering: public.invoices before sales.contracts.
        assert_eq!(documents[0].qualified_name(), "public.invoices");
        assert_eq!(documents[1].qualified_name(), "sales.contracts");

        let contracts = &documents[1];
        assert_eq!(contracts.kind(), RelationKind::Table);
        assert_eq!(
            contracts.comment(),
            Some("Stores information about sales contracts.")
        );
        assert_eq!(contracts.columns().len(), 2);
        assert_eq!(contracts.columns()[0].name(), "contract_id");
        assert!(!contracts.columns()[0].nullable());
        assert!(contracts.columns()[1].nullable());
        assert!(contracts.columns()[1].comment().is_none());
    }

    #[test]
    fn test_views_pick_up_their_definition() {
        let rows = vec![column_row(
            "sales",
            "active_contracts_view",
            "VIEW",
            "contract_id",
            "integer",
            "YES",
            "",
            "",
        )];
        let views = vec![ViewDefinitionRow {
            table_schema: "sales".to_string(),
            table_name: "active_contracts_view".to_string(),
            view_definition: "SELECT contract_id FROM sales.contracts WHERE status = 'Active'"
                .to_string(),
        }];

        let documents = group_into_documents(rows, views, &[]);

        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].kind(), RelationKind::View);
        assert!(documents[0]
            .view_definition()
            .unwrap()
            .contains("status = 'Active'"));
    }

    #[test]
    fn test_include_list_filters_schemas() {
        let rows = vec![
            column_row("sales", "contracts", "BASE TABLE", "id", "integer", "NO", "", ""),
            column_row("audit", "events", "BASE TABLE", "id", "integer", "NO", "", ""),
        ];

        let documents = group_into_documents(rows, Vec::new(), &["sales".to_string()]);

        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].schema(), "sales");
    }

    #[test]
    fn test_empty_catalog_yields_empty_collection() {
        assert!(group_into_documents(Vec::new(), Vec::new(), &[]).is_empty());
    }

    #[test]
    fn test_grouping_is_deterministic() {
        let make_rows = || {
            vec![
                column_row("b", "t2", "BASE TABLE", "x", "integer", "NO", "", ""),
                column_row("a", "t1", "BASE TABLE", "y", "text", "YES", "", ""),
            ]
        };

        let first: Vec<String> = group_into_documents(make_rows(), Vec::new(), &[])
            .iter()
            .map(|d| d.rendered_text())
            .collect();
        let second: Vec<String> = group_into_documents(make_rows(), Vec::new(), &[])
            .iter()
            .map(|d| d.rendered_text())
            .collect();

        assert_eq!(first, second);
    }
}
