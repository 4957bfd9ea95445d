//! Tantivy schema for indexed entity rows.
//!
//! One document per row. All entity types share a single index and are told
//! apart by `doc_type`.

use tantivy::schema::{Field, Schema, INDEXED, STORED, STRING, TEXT};

use crate::SearchError;

/// Schema field handles for efficient access
#[derive(Debug, Clone)]
pub struct SearchSchema {
    schema: Schema,
    /// Entity type name, e.g. "Invoice" (STRING | STORED)
    pub doc_type: Field,
    /// Primary key `{entity_type}:{id}` (STRING | STORED)
    pub doc_id: Field,
    /// Searchable text built from the row's field values (TEXT)
    pub text: Field,
    /// Modification time in epoch milliseconds, if the row carries one
    pub modified_ms: Field,
}

impl SearchSchema {
    /// Get the underlying Tantivy schema
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Create a SearchSchema from an existing Tantivy Schema
    pub fn from_schema(schema: Schema) -> Result<Self, SearchError> {
        let field = |name: &str| {
            schema
                .get_field(name)
                .map_err(|_| SearchError::SchemaMismatch(format!("missing {} field", name)))
        };
        let doc_type = field("doc_type")?;
        let doc_id = field("doc_id")?;
        let text = field("text")?;
        let modified_ms = field("modified_ms")?;

        Ok(Self {
            schema,
            doc_type,
            doc_id,
            text,
            modified_ms,
        })
    }
}

/// Build the row index schema.
pub fn build_row_schema() -> SearchSchema {
    let mut schema_builder = Schema::builder();

    let doc_type = schema_builder.add_text_field("doc_type", STRING | STORED);
    let doc_id = schema_builder.add_text_field("doc_id", STRING | STORED);
    let text = schema_builder.add_text_field("text", TEXT);
    let modified_ms = schema_builder.add_i64_field("modified_ms", INDEXED | STORED);

    let schema = schema_builder.build();

    SearchSchema {
        schema,
        doc_type,
        doc_id,
        text,
        modified_ms,
    }
}
