//! Offset pagination options and page envelopes shared by both collections.

use serde::{Deserialize, Serialize};

use crate::domain::types::SortOrder;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;
pub const DEFAULT_SORT_FIELD: &str = "createdAt";

/// Listing options accepted by the store layer.
///
/// Defaults are `{page: 1, limit: 10, sort_field: "createdAt", sort_order: desc}`.
/// `page` and `limit` are always at least one when built through
/// [`ListOptions::from_query`] or [`ListOptions::new`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListOptions {
    pub page: u32,
    pub limit: u32,
    pub sort_field: String,
    pub sort_order: SortOrder,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
            sort_field: DEFAULT_SORT_FIELD.to_string(),
            sort_order: SortOrder::Desc,
        }
    }
}

impl ListOptions {
    pub fn new(page: u32, limit: u32, sort_field: impl Into<String>, sort_order: SortOrder) -> Self {
        let sort_field = sort_field.into();
        Self {
            page: page.max(1),
            limit: limit.max(1),
            sort_field: if sort_field.is_empty() {
                DEFAULT_SORT_FIELD.to_string()
            } else {
                sort_field
            },
            sort_order,
        }
    }

    /// Build options from raw query-string values. Values that are missing,
    /// non-numeric or zero fall back to their defaults.
    pub fn from_query(
        page: Option<&str>,
        limit: Option<&str>,
        sort_field: Option<&str>,
        sort_order: Option<&str>,
    ) -> Self {
        Self::new(
            parse_positive(page, DEFAULT_PAGE),
            parse_positive(limit, DEFAULT_LIMIT),
            sort_field.unwrap_or(DEFAULT_SORT_FIELD),
            SortOrder::parse_lenient(sort_order),
        )
    }

    /// Keep the page window but reset ordering to newest-first.
    pub fn with_default_sort(self) -> Self {
        Self {
            sort_field: DEFAULT_SORT_FIELD.to_string(),
            sort_order: SortOrder::Desc,
            ..self
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }
}

fn parse_positive(raw: Option<&str>, default: u32) -> u32 {
    raw.and_then(|value| value.trim().parse::<u32>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(default)
}

/// One page of results plus the counters clients use to render pagers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u64,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, total: u64, options: &ListOptions) -> Self {
        Self {
            data,
            total,
            page: options.page,
            limit: options.limit,
            total_pages: total_pages(total, options.limit),
        }
    }
}

/// `ceil(total / limit)`, with a zero limit treated as one.
pub fn total_pages(total: u64, limit: u32) -> u64 {
    total.div_ceil(u64::from(limit.max(1)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let options = ListOptions::default();
        assert_eq!(options.page, 1);
        assert_eq!(options.limit, 10);
        assert_eq!(options.sort_field, "createdAt");
        assert_eq!(options.sort_order, SortOrder::Desc);
        assert_eq!(options, ListOptions::from_query(None, None, None, None));
    }

    #[test]
    fn malformed_numbers_fall_back_to_defaults() {
        let options = ListOptions::from_query(Some("abc"), Some("0"), Some(""), Some("up"));
        assert_eq!(options.page, 1);
        assert_eq!(options.limit, 10);
        assert_eq!(options.sort_field, "createdAt");
        assert_eq!(options.sort_order, SortOrder::Desc);

        let options = ListOptions::from_query(Some("-3"), Some("25"), Some("name"), Some("asc"));
        assert_eq!(options.page, 1);
        assert_eq!(options.limit, 25);
        assert_eq!(options.sort_field, "name");
        assert_eq!(options.sort_order, SortOrder::Asc);
    }

    #[test]
    fn offset_is_zero_based() {
        assert_eq!(ListOptions::new(1, 10, "createdAt", SortOrder::Desc).offset(), 0);
        assert_eq!(ListOptions::new(3, 10, "createdAt", SortOrder::Desc).offset(), 20);
        assert_eq!(
            ListOptions::new(u32::MAX, u32::MAX, "createdAt", SortOrder::Desc).offset(),
            u64::from(u32::MAX - 1) * u64::from(u32::MAX)
        );
    }

    #[test]
    fn total_pages_is_ceiling_division() {
        for limit in 1..=12u32 {
            for total in 0..=40u64 {
                let pages = total_pages(total, limit);
                assert!(pages * u64::from(limit) >= total);
                assert!(pages == 0 || (pages - 1) * u64::from(limit) < total);
            }
        }
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
    }

    #[test]
    fn empty_page_serializes_with_camel_case_counters() {
        let page: Paginated<u8> = Paginated::new(Vec::new(), 0, &ListOptions::default());
        let value = serde_json::to_value(&page).expect("serialize page");
        assert_eq!(
            value,
            serde_json::json!({"data": [], "total": 0, "page": 1, "limit": 10, "totalPages": 0})
        );
    }
}
