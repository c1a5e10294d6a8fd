diesel::table! {
    use diesel::sql_types::*;
    use pgvector::sql_types::*;

    schema_embeddings (id) {
        id -> Uuid,
        relation_schema -> Text,
        relation_name -> Text,
        #[max_length = 16]
        relation_kind -> Varchar,
        relation_comment -> Nullable<Text>,
        view_definition -> Nullable<Text>,
        #[sql_name = "columns"]
        column_defs -> Jsonb,
        rendered_text -> Text,
        embedding -> Vector,
        indexed_at -> Timestamptz,
    }
}
