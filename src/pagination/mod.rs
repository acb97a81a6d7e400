//! Offset pagination.
//!
//! Callers filter first, count the filtered rows, slice the page window with
//! [`offset`] and hand the slice to [`paginate`]. `paginate` never re-slices
//! and never clamps: a page past the end is simply empty.

use serde::Serialize;

use crate::validation::{FieldRule, SchemaValidator};

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_PER_PAGE: u64 = 10;

/// One page of records plus the figures needed to navigate the rest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaginationResult<T> {
    pub current_page: u64,
    pub total_page: u64,
    pub total_records: u64,
    pub records: Vec<T>,
}

/// Build the page descriptor. `per_page` must be at least 1.
pub fn paginate<T>(count: u64, rows: Vec<T>, page: u64, per_page: u64) -> PaginationResult<T> {
    PaginationResult {
        current_page: page,
        total_page: count.div_ceil(per_page),
        total_records: count,
        records: rows,
    }
}

/// Number of rows to skip for `page`; pages below 1 start at the beginning.
pub fn offset(page: u64, per_page: u64) -> u64 {
    page.saturating_sub(1).saturating_mul(per_page)
}

/// Schema for the `page` and `perPage` query parameters, to be extended per endpoint.
pub fn pagination_schema<T>() -> SchemaValidator<T> {
    SchemaValidator::new()
        .field(
            "page",
            FieldRule::integer().min(1.0).default_value(DEFAULT_PAGE),
        )
        .field(
            "perPage",
            FieldRule::integer().min(1.0).default_value(DEFAULT_PER_PAGE),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_page_is_ceiling() {
        assert_eq!(paginate::<u8>(5, vec![], 1, 2).total_page, 3);
        assert_eq!(paginate::<u8>(4, vec![], 1, 2).total_page, 2);
        assert_eq!(paginate::<u8>(1, vec![], 1, 10).total_page, 1);
        assert_eq!(paginate::<u8>(0, vec![], 1, 10).total_page, 0);
    }

    #[test]
    fn test_ceiling_holds_across_ranges() {
        for count in 0..50u64 {
            for per_page in 1..12u64 {
                let result = paginate::<u8>(count, vec![], 1, per_page);
                let expected = (count + per_page - 1) / per_page;
                assert_eq!(result.total_page, expected, "count={count} per_page={per_page}");
            }
        }
    }

    #[test]
    fn test_rows_passed_through_unchanged() {
        let result = paginate(5, vec!["c", "d"], 2, 2);
        assert_eq!(result.current_page, 2);
        assert_eq!(result.total_records, 5);
        assert_eq!(result.records, vec!["c", "d"]);
    }

    #[test]
    fn test_page_past_end_is_empty_not_error() {
        let result = paginate::<u8>(5, vec![], 9, 2);
        assert_eq!(result.current_page, 9);
        assert_eq!(result.total_page, 3);
        assert!(result.records.is_empty());
    }

    #[test]
    fn test_offset() {
        assert_eq!(offset(1, 10), 0);
        assert_eq!(offset(3, 10), 20);
        assert_eq!(offset(0, 10), 0);
        assert_eq!(offset(u64::MAX, u64::MAX), u64::MAX);
    }

    #[test]
    fn test_serialized_field_names() {
        let body = serde_json::to_value(paginate(1, vec![1], 1, 10)).unwrap();
        assert_eq!(body["current_page"], 1);
        assert_eq!(body["total_page"], 1);
        assert_eq!(body["total_records"], 1);
        assert_eq!(body["records"][0], 1);
    }
}
