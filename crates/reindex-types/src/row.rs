//! Entity rows as held by the row store.
//!
//! A row is a JSON object belonging to one entity type (table). The row id is
//! the value of the type's order-key field and determines the storage order.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ReindexError;

/// A single row of an entity table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRow {
    /// Entity type name, e.g. "Invoice"
    pub entity_type: String,

    /// Value of the order-key field ("id", "pk", ...)
    pub id: u64,

    /// All mapped fields of the entity
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl EntityRow {
    /// Create an empty row.
    pub fn new(entity_type: impl Into<String>, id: u64) -> Self {
        Self {
            entity_type: entity_type.into(),
            id,
            fields: Map::new(),
        }
    }

    /// Build a row from a JSON object, taking the id from `order_key_field`.
    ///
    /// The order-key field must hold a non-negative integer.
    pub fn from_object(
        entity_type: impl Into<String>,
        order_key_field: &str,
        fields: Map<String, Value>,
    ) -> Result<Self, ReindexError> {
        let entity_type = entity_type.into();
        let id = fields
            .get(order_key_field)
            .and_then(Value::as_u64)
            .ok_or_else(|| {
                ReindexError::InvalidRow(format!(
                    "{} row has no integer '{}' field",
                    entity_type, order_key_field
                ))
            })?;
        Ok(Self {
            entity_type,
            id,
            fields,
        })
    }

    /// Set a field value.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Set a timestamp field, stored as RFC 3339.
    pub fn with_timestamp(self, name: impl Into<String>, at: DateTime<Utc>) -> Self {
        self.with_field(name, at.to_rfc3339())
    }

    /// Read a timestamp field.
    ///
    /// Accepts RFC 3339 strings and epoch milliseconds. Returns `None` when the
    /// field is missing or not a timestamp.
    pub fn timestamp(&self, name: &str) -> Option<DateTime<Utc>> {
        match self.fields.get(name)? {
            Value::String(s) => DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
            Value::Number(n) => n
                .as_i64()
                .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
            _ => None,
        }
    }

    /// Serialize to JSON bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Deserialize from JSON bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}
