//! Row queries handed to the row store.
//!
//! A query names one entity table plus an optional modified-since filter,
//! an optional ordering and an optional row limit. Filter values stay typed
//! parameters; only the table and field names (trusted metadata) appear in
//! the rendered form.

use std::fmt;

use chrono::{DateTime, Utc};

/// What a query returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    /// The rows themselves
    Rows,
    /// Only the number of matching rows
    Count,
}

/// Row filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowFilter {
    /// `field > :modifiedAt`
    ModifiedAfter {
        field: String,
        after: DateTime<Utc>,
    },
}

impl RowFilter {
    /// Name of the bound parameter in the rendered query.
    pub const MODIFIED_AT_PARAM: &'static str = "modifiedAt";
}

/// Ordering by a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub descending: bool,
}

impl OrderBy {
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: true,
        }
    }
}

/// Query over a single entity table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowQuery {
    pub entity_type: String,
    pub filter: Option<RowFilter>,
    pub order: Option<OrderBy>,
    pub limit: Option<usize>,
    pub projection: Projection,
}

impl RowQuery {
    /// Full, unordered scan of a table.
    pub fn all(entity_type: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            filter: None,
            order: None,
            limit: None,
            projection: Projection::Rows,
        }
    }

    pub fn with_filter(mut self, filter: RowFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_order(mut self, order: OrderBy) -> Self {
        self.order = Some(order);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Row-count variant sharing filter, order and limit.
    pub fn count_only(&self) -> Self {
        Self {
            projection: Projection::Count,
            ..self.clone()
        }
    }

    pub fn is_count(&self) -> bool {
        self.projection == Projection::Count
    }

    /// Value bound to the modified-at parameter, if any.
    pub fn modified_after(&self) -> Option<DateTime<Utc>> {
        match &self.filter {
            Some(RowFilter::ModifiedAfter { after, .. }) => Some(*after),
            None => None,
        }
    }
}

impl fmt::Display for RowQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.projection {
            Projection::Count => write!(f, "select count(*) from {}", self.entity_type)?,
            Projection::Rows => write!(f, "from {}", self.entity_type)?,
        }
        if let Some(RowFilter::ModifiedAfter { field, .. }) = &self.filter {
            write!(f, " where {} > :{}", field, RowFilter::MODIFIED_AT_PARAM)?;
        }
        if let Some(order) = &self.order {
            let direction = if order.descending { "desc" } else { "asc" };
            write!(f, " order by {} {}", order.field, direction)?;
        }
        if let Some(limit) = self.limit {
            write!(f, " limit {}", limit)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_render_full_scan() {
        let query = RowQuery::all("Task");
        assert_eq!(query.to_string(), "from Task");
        assert_eq!(query.count_only().to_string(), "select count(*) from Task");
    }

    #[test]
    fn test_render_filtered_keeps_value_out() {
        let after = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let query = RowQuery::all("Invoice").with_filter(RowFilter::ModifiedAfter {
            field: "lastUpdate".to_string(),
            after,
        });

        let rendered = query.to_string();
        assert_eq!(rendered, "from Invoice where lastUpdate > :modifiedAt");
        assert!(!rendered.contains("2024"));
        assert_eq!(query.modified_after(), Some(after));
    }

    #[test]
    fn test_render_last_n() {
        let query = RowQuery::all("HistoryRecord")
            .with_order(OrderBy::desc("pk"))
            .with_limit(1000);
        assert_eq!(
            query.to_string(),
            "from HistoryRecord order by pk desc limit 1000"
        );
    }

    #[test]
    fn test_count_only_preserves_filter() {
        let query = RowQuery::all("Task")
            .with_order(OrderBy::desc("id"))
            .with_limit(5);
        let count = query.count_only();
        assert!(count.is_count());
        assert_eq!(count.limit, Some(5));
        assert_eq!(count.order, query.order);
        assert!(!query.is_count());
    }
}
