//! Entity registry: per-type metadata the reindex loop needs.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::error::IndexingError;
use crate::recalc::{InvoiceTotals, Recalculate};

/// Metadata of one indexable entity type.
#[derive(Clone)]
pub struct EntityDescriptor {
    /// Entity type name, e.g. "Invoice"
    pub name: String,
    /// Field holding the last modification time, if the type tracks one
    pub modified_at_field: Option<String>,
    /// Field the rows are ordered by ("id", "pk", ...)
    pub order_key_field: String,
    /// Hook recomputing derived fields before indexing
    pub recalculator: Option<Arc<dyn Recalculate>>,
}

impl EntityDescriptor {
    /// Descriptor ordered by `id` without a modification field.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            modified_at_field: None,
            order_key_field: "id".to_string(),
            recalculator: None,
        }
    }

    pub fn with_modified_at(mut self, field: impl Into<String>) -> Self {
        self.modified_at_field = Some(field.into());
        self
    }

    pub fn with_order_key(mut self, field: impl Into<String>) -> Self {
        self.order_key_field = field.into();
        self
    }

    pub fn with_recalculator(mut self, recalculator: impl Recalculate + 'static) -> Self {
        self.recalculator = Some(Arc::new(recalculator));
        self
    }

    /// Short type name used in summaries and log labels.
    pub fn short_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }
}

impl fmt::Debug for EntityDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityDescriptor")
            .field("name", &self.name)
            .field("modified_at_field", &self.modified_at_field)
            .field("order_key_field", &self.order_key_field)
            .field("recalculator", &self.recalculator.is_some())
            .finish()
    }
}

/// Registry of the entity types that can be reindexed.
#[derive(Debug, Clone, Default)]
pub struct EntityRegistry {
    entities: BTreeMap<String, EntityDescriptor>,
    history_type: Option<String>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in entity types.
    ///
    /// - `Invoice`: modified at `lastUpdate`, ordered by `id`, totals recalculated
    /// - `Task`: modified at `lastUpdate`, ordered by `id`
    /// - `HistoryRecord`: no modification field, ordered by `pk`; the history type
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(
            EntityDescriptor::new("Invoice")
                .with_modified_at("lastUpdate")
                .with_recalculator(InvoiceTotals),
        );
        registry.register(EntityDescriptor::new("Task").with_modified_at("lastUpdate"));
        registry.register(EntityDescriptor::new("HistoryRecord").with_order_key("pk"));
        registry.set_history_type(Some("HistoryRecord".to_string()));
        registry
    }

    /// Add or replace a descriptor.
    pub fn register(&mut self, descriptor: EntityDescriptor) {
        self.entities.insert(descriptor.name.clone(), descriptor);
    }

    /// Type reindexed along with others by the newest/full shortcuts.
    pub fn set_history_type(&mut self, history_type: Option<String>) {
        self.history_type = history_type;
    }

    pub fn history_type(&self) -> Option<&str> {
        self.history_type.as_deref()
    }

    pub fn get(&self, name: &str) -> Option<&EntityDescriptor> {
        self.entities.get(name)
    }

    /// Look up a descriptor, failing for unregistered types.
    pub fn resolve(&self, name: &str) -> Result<&EntityDescriptor, IndexingError> {
        self.get(name)
            .ok_or_else(|| IndexingError::UnknownEntityType(name.to_string()))
    }

    /// Registered type names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        self.entities.keys().map(String::as_str).collect()
    }
}
