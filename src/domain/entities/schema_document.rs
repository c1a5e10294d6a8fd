use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationKind {
    Table,
    View,
}

impl RelationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationKind::Table => "table",
            RelationKind::View => "view",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RelationKind::Table => "Table",
            RelationKind::View => "View",
        }
    }
}

impl std::str::FromStr for RelationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "table" => Ok(RelationKind::Table),
            "view" => Ok(RelationKind::View),
            other => Err(format!("Unknown relation kind: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDocument {
    name: String,
    data_type: String,
    nullable: bool,
    comment: Option<String>,
}

impl ColumnDocument {
    pub fn new(name: String, data_type: String, nullable: bool, comment: Option<String>) -> Self {
        Self {
            name,
            data_type,
            nullable,
            comment: comment.filter(|c| !c.is_empty()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data_type(&self) -> &str {
        &self.data_type
    }

    pub fn nullable(&self) -> bool {
        self.nullable
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }
}

/// One catalog relation (table or view), normalized into the unit of
/// indexing. Column order is the catalog's ordinal order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDocument {
    schema: String,
    name: String,
    kind: RelationKind,
    comment: Option<String>,
    columns: Vec<ColumnDocument>,
    view_definition: Option<String>,
}

impl SchemaDocument {
    pub fn new(
        schema: String,
        name: String,
        kind: RelationKind,
        comment: Option<String>,
        columns: Vec<ColumnDocument>,
        view_definition: Option<String>,
    ) -> Self {
        Self {
            schema,
            name,
            kind,
            comment: comment.filter(|c| !c.is_empty()),
            columns,
            view_definition: view_definition.filter(|d| !d.is_empty()),
        }
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> RelationKind {
        self.kind
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub fn columns(&self) -> &[ColumnDocument] {
        &self.columns
    }

    pub fn view_definition(&self) -> Option<&str> {
        self.view_definition.as_deref()
    }

    /// Document identity: the fully-qualified relation name.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.schema, self.name)
    }

    /// Deterministic textual serialization used as the embedding input.
    /// Stable across runs for an unchanged schema: fixed section order,
    /// column order as stored.
    pub fn rendered_text(&self) -> String {
        let mut text = format!(
            "{}: {} (Schema: {})\n",
            self.kind.label(),
            self.name,
            self.schema
        );

        if let Some(comment) = &self.comment {
            text.push_str(&format!("Comment: {}\n", comment));
        }

        text.push_str("Columns:\n");
        for column in &self.columns {
            let nullability = if column.nullable() {
                "nullable"
            } else {
                "not null"
            };
            text.push_str(&format!(
                "  - {} ({}, {})",
                column.name(),
                column.data_type(),
                nullability
            ));
            if let Some(comment) = column.comment() {
                text.push_str(&format!(": {}", comment));
            }
            text.push('\n');
        }

        if let Some(definition) = &self.view_definition {
            text.push_str(&format!("Definition:\n{}\n", definition));
        }

        text.trim_end().to_string()
    }
}
