//! Key encoding and decoding for storage layer.
//!
//! Row key format: `row:{entity_type}:{id:020}`
//! - entity_type: table name, must not contain ':'
//! - id: order key, zero-padded to 20 digits so lexicographic order equals
//!   numeric order
//!
//! All rows of one table share the `row:{entity_type}:` prefix, so a table
//! scan is a prefix iteration and "highest ids first" is a reverse one.

use crate::error::StorageError;

/// Key for entity rows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowKey {
    pub entity_type: String,
    pub id: u64,
}

impl RowKey {
    pub fn new(entity_type: impl Into<String>, id: u64) -> Result<Self, StorageError> {
        let entity_type = entity_type.into();
        if entity_type.is_empty() || entity_type.contains(':') {
            return Err(StorageError::Key(format!(
                "Invalid entity type name: '{}'",
                entity_type
            )));
        }
        Ok(Self { entity_type, id })
    }

    /// Encode key to bytes for storage
    pub fn to_bytes(&self) -> Vec<u8> {
        format!("row:{}:{:020}", self.entity_type, self.id).into_bytes()
    }

    /// Decode key from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StorageError> {
        let s = std::str::from_utf8(bytes)
            .map_err(|e| StorageError::Key(format!("Invalid UTF-8: {}", e)))?;

        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 3 || parts[0] != "row" {
            return Err(StorageError::Key(format!("Invalid row key format: {}", s)));
        }

        let id: u64 = parts[2]
            .parse()
            .map_err(|e| StorageError::Key(format!("Invalid row id: {}", e)))?;

        Ok(Self {
            entity_type: parts[1].to_string(),
            id,
        })
    }

    /// Prefix shared by all rows of a table
    pub fn table_prefix(entity_type: &str) -> Vec<u8> {
        format!("row:{}:", entity_type).into_bytes()
    }

    /// Exclusive upper bound of a table's key range (';' follows ':')
    pub fn table_upper_bound(entity_type: &str) -> Vec<u8> {
        format!("row:{};", entity_type).into_bytes()
    }
}

/// Key for checkpoint entries
/// Format: checkpoint:{name}
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointKey {
    pub name: String,
}

impl CheckpointKey {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        format!("checkpoint:{}", self.name).into_bytes()
    }

    pub fn prefix() -> &'static [u8] {
        b"checkpoint:"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_key_roundtrip() {
        let key = RowKey::new("Invoice", 12345).unwrap();
        let decoded = RowKey::from_bytes(&key.to_bytes()).unwrap();
        assert_eq!(key, decoded);
    }

    #[test]
    fn test_row_key_numeric_order() {
        let key9 = RowKey::new("Task", 9).unwrap();
        let key10 = RowKey::new("Task", 10).unwrap();
        assert!(key9.to_bytes() < key10.to_bytes());
    }

    #[test]
    fn test_table_range_contains_only_table() {
        let prefix = RowKey::table_prefix("Task");
        let upper = RowKey::table_upper_bound("Task");
        let inside = RowKey::new("Task", u64::MAX).unwrap().to_bytes();
        let other = RowKey::new("TaskGroup", 1).unwrap().to_bytes();

        assert!(inside.as_slice() >= prefix.as_slice());
        assert!(inside.as_slice() < upper.as_slice());
        assert!(!other.starts_with(&prefix));
    }

    #[test]
    fn test_row_key_rejects_colon() {
        assert!(RowKey::new("bad:type", 1).is_err());
        assert!(RowKey::new("", 1).is_err());
    }
}
