//! Query layer: search, exact-match filters, sorting and pagination over a
//! snapshot of table rows.
//!
//! Filters compose with AND. Empty filter values mean "no filter". An exact
//! filter value that matches nothing (including unknown enum names) simply
//! yields an empty page.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::db::Record;

pub const MAX_PAGE_SIZE: usize = 100;

#[derive(Debug, Error, PartialEq)]
pub enum QueryError {
    #[error("cannot sort {table} by '{field}'")]
    UnknownSortField { table: &'static str, field: String },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

/// The `sort`, `direction`, `page` and `pageSize` parameters every list
/// endpoint accepts alongside its own filters.
///
/// `page` and `pageSize` accept any integer and are clamped when applied; an
/// empty value counts as absent. Only non-numeric text is rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<SortDirection>,
    #[serde(
        default,
        deserialize_with = "lenient_integer",
        skip_serializing_if = "Option::is_none"
    )]
    pub page: Option<i64>,
    #[serde(
        default,
        deserialize_with = "lenient_integer",
        skip_serializing_if = "Option::is_none"
    )]
    pub page_size: Option<i64>,
}

/// Query strings carry numbers as text, so both forms are accepted.
fn lenient_integer<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(i64),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Number(n)) => Ok(Some(n)),
        Some(Raw::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(Raw::Text(text)) => text
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("'{text}' is not a whole number"))),
    }
}

/// Clamps a requested page or page size to at least 1.
fn at_least_one(value: Option<i64>) -> Option<usize> {
    value.map(|v| usize::try_from(v.max(1)).unwrap_or(usize::MAX))
}

impl ListParams {
    pub fn is_paged(&self) -> bool {
        self.page.is_some() || self.page_size.is_some()
    }
}

/// A comparable projection of one record field.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum SortValue {
    Time(DateTime<Utc>),
    Int(i64),
    Text(String),
}

/// Records that can be ordered by named fields.
pub trait Sortable: Record {
    /// Timestamp field used when the caller does not ask for a sort.
    const DEFAULT_SORT: &'static str;
    const SORT_FIELDS: &'static [&'static str];

    fn sort_value(&self, field: &str) -> Option<SortValue>;
}

/// The `{data, total, page, pageSize}` envelope returned by list endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub data: Vec<T>,
    pub total: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<usize>,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            data: self.data.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            page_size: self.page_size,
        }
    }
}

type Predicate<T> = Box<dyn Fn(&T) -> bool + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Window {
    page: usize,
    page_size: usize,
}

/// A filter/sort/paginate request over rows of `T`.
pub struct Query<T> {
    predicates: Vec<Predicate<T>>,
    sort_field: &'static str,
    custom_sort: Option<String>,
    direction: SortDirection,
    window: Option<Window>,
}

impl<T: Sortable> Default for Query<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Sortable> Query<T> {
    pub fn new() -> Self {
        Query {
            predicates: Vec::new(),
            sort_field: T::DEFAULT_SORT,
            custom_sort: None,
            direction: SortDirection::Desc,
            window: None,
        }
    }

    /// Case-insensitive substring match against any of `fields`.
    pub fn search(mut self, needle: Option<&str>, fields: fn(&T) -> Vec<&str>) -> Self {
        let Some(needle) = non_empty(needle) else {
            return self;
        };
        let needle = needle.to_lowercase();
        self.predicates.push(Box::new(move |row| {
            fields(row)
                .iter()
                .any(|field| field.to_lowercase().contains(&needle))
        }));
        self
    }

    /// Exact match of `field` against `value`.
    pub fn matching(mut self, value: Option<&str>, field: fn(&T) -> &str) -> Self {
        let Some(value) = non_empty(value) else {
            return self;
        };
        let value = value.to_string();
        self.predicates.push(Box::new(move |row| field(row) == value));
        self
    }

    /// Arbitrary predicate; rows must satisfy it to be kept.
    pub fn filter(mut self, predicate: impl Fn(&T) -> bool + Send + Sync + 'static) -> Self {
        self.predicates.push(Box::new(predicate));
        self
    }

    /// Overrides the default sort. Unknown fields are reported by `run`.
    pub fn sort(mut self, field: Option<&str>, direction: Option<SortDirection>) -> Self {
        if let Some(field) = non_empty(field) {
            self.custom_sort = Some(field.to_string());
        }
        if let Some(direction) = direction {
            self.direction = direction;
        }
        self
    }

    /// Restricts the result to one 1-indexed page. `page` below 1 is treated as 1
    /// and `page_size` is clamped to `1..=MAX_PAGE_SIZE`.
    pub fn paginate(
        mut self,
        page: Option<usize>,
        page_size: Option<usize>,
        default_size: usize,
    ) -> Self {
        self.window = Some(Window {
            page: page.unwrap_or(1).max(1),
            page_size: page_size.unwrap_or(default_size).clamp(1, MAX_PAGE_SIZE),
        });
        self
    }

    /// Applies `params`. With `default_size` the result is always paged;
    /// without it, only when the caller asked for a page.
    pub fn list(self, params: &ListParams, default_size: Option<usize>) -> Self {
        let query = self.sort(params.sort.as_deref(), params.direction);
        let (page, page_size) = (at_least_one(params.page), at_least_one(params.page_size));
        match default_size {
            Some(size) => query.paginate(page, page_size, size),
            None if params.is_paged() => query.paginate(page, page_size, MAX_PAGE_SIZE),
            None => query,
        }
    }

    pub fn run(self, rows: Vec<T>) -> Result<Page<T>, QueryError> {
        let field = self.custom_sort.as_deref().unwrap_or(self.sort_field);
        if !T::SORT_FIELDS.contains(&field) {
            return Err(QueryError::UnknownSortField {
                table: T::TABLE,
                field: field.to_string(),
            });
        }

        let mut matched: Vec<T> = rows
            .into_iter()
            .filter(|row| self.predicates.iter().all(|keep| keep(row)))
            .collect();

        let direction = self.direction;
        matched.sort_by(|a, b| {
            let ordering = a.sort_value(field).cmp(&b.sort_value(field));
            let ordering = match direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            };
            match ordering {
                Ordering::Equal => a.id().cmp(b.id()),
                other => other,
            }
        });

        let total = matched.len();
        let Some(Window { page, page_size }) = self.window else {
            return Ok(Page {
                data: matched,
                total,
                page: None,
                page_size: None,
            });
        };

        let data = matched
            .into_iter()
            .skip((page - 1).saturating_mul(page_size))
            .take(page_size)
            .collect();
        Ok(Page {
            data,
            total,
            page: Some(page),
            page_size: Some(page_size),
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::IndexSpec;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Row {
        id: String,
        name: String,
        email: String,
        stage: String,
        at: i64,
    }

    impl Record for Row {
        const TABLE: &'static str = "rows";
        const INDEXES: &'static [IndexSpec<Self>] = &[];

        fn id(&self) -> &str {
            &self.id
        }
    }

    impl Sortable for Row {
        const DEFAULT_SORT: &'static str = "at";
        const SORT_FIELDS: &'static [&'static str] = &["at", "name"];

        fn sort_value(&self, field: &str) -> Option<SortValue> {
            match field {
                "at" => Some(SortValue::Int(self.at)),
                "name" => Some(SortValue::Text(self.name.clone())),
                _ => None,
            }
        }
    }

    fn rows() -> Vec<Row> {
        (0..25)
            .map(|i| Row {
                id: format!("r{i:02}"),
                name: if i % 5 == 0 { format!("Priya {i}") } else { format!("Rahul {i}") },
                email: format!("user{i}@Example.com"),
                stage: ["applied", "screen", "tech"][i % 3].to_string(),
                at: i as i64,
            })
            .collect()
    }

    fn name_or_email(r: &Row) -> Vec<&str> {
        vec![r.name.as_str(), r.email.as_str()]
    }

    #[test]
    fn test_default_sort_is_newest_first() {
        let page = Query::new().run(rows()).unwrap();
        assert_eq!(page.total, 25);
        assert_eq!(page.data[0].at, 24);
        assert_eq!(page.data[24].at, 0);
        assert_eq!(page.page, None);
    }

    #[test]
    fn test_empty_search_matches_everything() {
        let unfiltered = Query::new().run(rows()).unwrap();
        for needle in ["", "   "] {
            let page = Query::new()
                .search(Some(needle), name_or_email)
                .matching(Some(""), |r| &r.stage)
                .run(rows())
                .unwrap();
            assert_eq!(page, unfiltered);
        }
    }

    #[test]
    fn test_search_is_case_insensitive_substring() {
        let page = Query::new()
            .search(Some("PRIYA"), name_or_email)
            .run(rows())
            .unwrap();
        assert_eq!(page.total, 5);

        let by_email = Query::new()
            .search(Some("example.COM"), name_or_email)
            .run(rows())
            .unwrap();
        assert_eq!(by_email.total, 25);
    }

    #[test]
    fn test_filters_compose_with_and() {
        let page = Query::new()
            .search(Some("priya"), name_or_email)
            .matching(Some("applied"), |r| &r.stage)
            .run(rows())
            .unwrap();
        // Priya rows are 0, 5, 10, 15, 20; applied rows are multiples of 3.
        let ids: Vec<_> = page.data.iter().map(|r| r.at).collect();
        assert_eq!(ids, [15, 0]);
    }

    #[test]
    fn test_unknown_enum_value_yields_empty_page() {
        let page = Query::<Row>::new()
            .matching(Some("onboarding"), |r| &r.stage)
            .paginate(Some(1), Some(10), 10)
            .run(rows())
            .unwrap();
        assert_eq!(page.total, 0);
        assert!(page.data.is_empty());
    }

    #[test]
    fn test_pages_are_bounded_and_report_filtered_total() {
        for page_size in [1, 7, 10, 25, 40] {
            let mut seen = 0;
            for page_no in 1..=30 {
                let page = Query::<Row>::new()
                    .matching(Some("screen"), |r| &r.stage)
                    .paginate(Some(page_no), Some(page_size), 10)
                    .run(rows())
                    .unwrap();
                assert!(page.data.len() <= page_size);
                assert_eq!(page.total, 8);
                seen += page.data.len();
            }
            assert_eq!(seen, 8);
        }
    }

    #[test]
    fn test_page_past_the_end_is_empty_not_error() {
        let page = Query::new()
            .paginate(Some(99), Some(10), 10)
            .run(rows())
            .unwrap();
        assert!(page.data.is_empty());
        assert_eq!(page.total, 25);
        assert_eq!(page.page, Some(99));
    }

    #[test]
    fn test_page_parameters_are_clamped() {
        let page = Query::new()
            .paginate(Some(0), Some(0), 10)
            .run(rows())
            .unwrap();
        assert_eq!(page.page, Some(1));
        assert_eq!(page.page_size, Some(1));
        assert_eq!(page.data.len(), 1);

        let huge = Query::new()
            .paginate(None, Some(10_000), 10)
            .run(rows())
            .unwrap();
        assert_eq!(huge.page_size, Some(MAX_PAGE_SIZE));
    }

    #[test]
    fn test_explicit_ascending_sort() {
        let page = Query::new()
            .sort(Some("name"), Some(SortDirection::Asc))
            .run(rows())
            .unwrap();
        assert!(page.data[0].name.starts_with("Priya"));
    }

    #[test]
    fn test_list_params_page_only_when_asked() {
        let unpaged = Query::new()
            .list(&ListParams::default(), None)
            .run(rows())
            .unwrap();
        assert_eq!(unpaged.data.len(), 25);
        assert_eq!(unpaged.page_size, None);

        let params = ListParams {
            page: Some(2),
            ..ListParams::default()
        };
        let paged = Query::new().list(&params, Some(10)).run(rows()).unwrap();
        assert_eq!(paged.data.len(), 10);
        assert_eq!(paged.data[0].at, 14);
    }

    #[test]
    fn test_out_of_range_list_params_are_clamped() {
        let params = ListParams {
            page: Some(-3),
            page_size: Some(0),
            ..ListParams::default()
        };
        let page = Query::<Row>::new().list(&params, Some(10)).run(rows()).unwrap();
        assert_eq!(page.page, Some(1));
        assert_eq!(page.page_size, Some(1));
        assert_eq!(page.data.len(), 1);
    }

    #[test]
    fn test_unknown_sort_field_is_rejected() {
        let err = Query::new()
            .sort(Some("salary"), None)
            .run(rows())
            .unwrap_err();
        assert!(matches!(err, QueryError::UnknownSortField { .. }));
    }
}
