//! Translation of reindex settings into row queries.

use chrono::{DateTime, Utc};
use tracing::warn;

use reindex_types::{OrderBy, ReindexSettings, RowFilter, RowQuery};

use crate::registry::EntityDescriptor;

/// Build the row query selecting what to reindex for one entity type.
///
/// Priority: `from_date` first, then `last_n_entries`, else a full scan.
/// A `from_date` on a type without a modification field falls back to a
/// full scan, logged as a warning.
pub fn build_query(descriptor: &EntityDescriptor, settings: Option<&ReindexSettings>) -> RowQuery {
    let (query, fallback) = resolve(descriptor, settings);
    if let Some(from_date) = fallback {
        warn!(
            entity = %descriptor.short_name(),
            from_date = %from_date,
            "Modified-since reindex not supported for this type: modification field unknown, selecting all entities"
        );
    }
    query
}

/// Count variant of [`build_query`], used to size progress reporting.
///
/// Does not log the fallback; the scan query of the same pass does.
pub fn build_count_query(
    descriptor: &EntityDescriptor,
    settings: Option<&ReindexSettings>,
) -> RowQuery {
    resolve(descriptor, settings).0.count_only()
}

/// The query, plus the ignored `from_date` when the type cannot filter by it.
fn resolve(
    descriptor: &EntityDescriptor,
    settings: Option<&ReindexSettings>,
) -> (RowQuery, Option<DateTime<Utc>>) {
    let query = RowQuery::all(descriptor.name.clone());
    let Some(settings) = settings else {
        return (query, None);
    };

    if let Some(from_date) = settings.from_date {
        return match &descriptor.modified_at_field {
            Some(field) => (
                query.with_filter(RowFilter::ModifiedAfter {
                    field: field.clone(),
                    after: from_date,
                }),
                None,
            ),
            None => (query, Some(from_date)),
        };
    }

    if let Some(last_n) = settings.last_n_entries {
        return (
            query
                .with_order(OrderBy::desc(descriptor.order_key_field.clone()))
                .with_limit(last_n),
            None,
        );
    }

    (query, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::EntityRegistry;
    use chrono::TimeZone;

    fn descriptor(name: &str) -> EntityDescriptor {
        EntityRegistry::with_defaults().resolve(name).unwrap().clone()
    }

    #[test]
    fn test_no_settings_is_full_scan() {
        let invoice = descriptor("Invoice");
        assert_eq!(build_query(&invoice, None), RowQuery::all("Invoice"));
        assert_eq!(
            build_query(&invoice, Some(&ReindexSettings::full())),
            RowQuery::all("Invoice")
        );
    }

    #[test]
    fn test_from_date_with_modified_field() {
        let from = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let query = build_query(&descriptor("Invoice"), Some(&ReindexSettings::since(from)));

        assert_eq!(query.to_string(), "from Invoice where lastUpdate > :modifiedAt");
        assert_eq!(query.modified_after(), Some(from));
        assert!(query.limit.is_none());
    }

    #[test]
    fn test_from_date_without_modified_field_falls_back() {
        let history = descriptor("HistoryRecord");
        let from = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        let query = build_query(&history, Some(&ReindexSettings::since(from)));
        assert_eq!(query, build_query(&history, None));
    }

    #[test]
    fn test_from_date_wins_over_last_n() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap();
        let settings = ReindexSettings::newest_at(now);

        let query = build_query(&descriptor("Task"), Some(&settings));
        assert!(query.filter.is_some());
        assert!(query.order.is_none());
        assert!(query.limit.is_none());

        // The fallback is a full scan, the limit does not apply either
        let query = build_query(&descriptor("HistoryRecord"), Some(&settings));
        assert_eq!(query, RowQuery::all("HistoryRecord"));
    }

    #[test]
    fn test_last_n_orders_by_order_key() {
        let query = build_query(&descriptor("Task"), Some(&ReindexSettings::last(50)));
        assert_eq!(query.to_string(), "from Task order by id desc limit 50");

        let query = build_query(&descriptor("HistoryRecord"), Some(&ReindexSettings::last(5)));
        assert_eq!(query.to_string(), "from HistoryRecord order by pk desc limit 5");
    }

    #[test]
    fn test_fallback_detected_once_per_pass() {
        let history = descriptor("HistoryRecord");
        let from = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let settings = ReindexSettings::since(from);

        assert_eq!(resolve(&history, Some(&settings)), (RowQuery::all("HistoryRecord"), Some(from)));
        assert_eq!(resolve(&descriptor("Invoice"), Some(&settings)).1, None);
        assert_eq!(
            build_count_query(&history, Some(&settings)),
            RowQuery::all("HistoryRecord").count_only()
        );
    }

    #[test]
    fn test_count_query_shares_filter() {
        let from = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let query = build_count_query(&descriptor("Invoice"), Some(&ReindexSettings::since(from)));

        assert!(query.is_count());
        assert_eq!(
            query.to_string(),
            "select count(*) from Invoice where lastUpdate > :modifiedAt"
        );
    }
}
