//! Document mapping from entity rows to Tantivy documents.

use serde_json::Value;
use tantivy::TantivyDocument;

use reindex_types::EntityRow;

use crate::schema::SearchSchema;

/// Index key of a row: `{entity_type}:{id}`.
pub fn row_doc_id(entity_type: &str, id: u64) -> String {
    format!("{}:{}", entity_type, id)
}

/// Convert a row to a Tantivy document.
///
/// The text field holds every string and number value of the row, nested
/// arrays and objects included, in field order. `modified_ms` is set only
/// when the type has a modification field and the row holds a timestamp
/// there.
pub fn row_to_doc(
    schema: &SearchSchema,
    row: &EntityRow,
    modified_at_field: Option<&str>,
) -> TantivyDocument {
    let mut doc = TantivyDocument::default();
    doc.add_text(schema.doc_type, &row.entity_type);
    doc.add_text(schema.doc_id, row_doc_id(&row.entity_type, row.id));
    doc.add_text(schema.text, extract_row_text(row));
    if let Some(modified) = modified_at_field.and_then(|field| row.timestamp(field)) {
        doc.add_i64(schema.modified_ms, modified.timestamp_millis());
    }
    doc
}

/// Searchable text of a row.
pub fn extract_row_text(row: &EntityRow) -> String {
    let mut parts = Vec::new();
    for value in row.fields.values() {
        collect_text(value, &mut parts);
    }
    parts.join(" ")
}

fn collect_text(value: &Value, parts: &mut Vec<String>) {
    match value {
        Value::String(s) if !s.is_empty() => parts.push(s.clone()),
        Value::Number(n) => parts.push(n.to_string()),
        Value::Array(items) => items.iter().for_each(|item| collect_text(item, parts)),
        Value::Object(map) => map.values().for_each(|item| collect_text(item, parts)),
        _ => {}
    }
}
