//! List query parameters and the adaptors that parse them.
//!
//! A [`QueryAdaptor`] turns the raw query string of a list request into a
//! [`QueryParam`] and shapes the list output into a response. Three flavors
//! are provided:
//!
//! - [`StandardQueryAdaptor`]: JSON-encoded `filter`, `range` and `sort`
//! - [`ReactAdminQueryAdaptor`]: react-admin style `filter`, `range` and `sort`
//! - [`RefineQueryAdaptor`]: refine style `filters`, `pagination` and `sort`

use crud_schema::Record;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

use crate::error::ResourceResult;

mod react_admin;
mod refine;
mod standard;

pub use react_admin::ReactAdminQueryAdaptor;
pub use refine::RefineQueryAdaptor;
pub use standard::StandardQueryAdaptor;

/// Default page size.
pub const DEFAULT_LIMIT: u64 = 30;

/// Comparison applied by a [`QueryFilter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterOperator {
    /// Equal
    #[serde(rename = "=")]
    Eq,
    /// Not equal
    #[serde(rename = "!=")]
    Ne,
    /// Greater than
    #[serde(rename = ">")]
    Gt,
    /// Greater than or equal
    #[serde(rename = ">=")]
    Gte,
    /// Less than
    #[serde(rename = "<")]
    Lt,
    /// Less than or equal
    #[serde(rename = "<=")]
    Lte,
    /// Member of a list
    #[serde(rename = "in")]
    In,
    /// Not a member of a list
    #[serde(rename = "!in")]
    NotIn,
    /// Substring match
    #[serde(rename = "contains")]
    Contains,
    /// No substring match
    #[serde(rename = "!contains")]
    NotContains,
    /// Inside an inclusive `[low, high]` pair
    #[serde(rename = "between")]
    Between,
    /// Outside an inclusive `[low, high]` pair
    #[serde(rename = "!between")]
    NotBetween,
    /// Null or missing
    #[serde(rename = "null")]
    Null,
    /// Present and not null
    #[serde(rename = "!null")]
    NotNull,
}

impl FilterOperator {
    /// Wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOperator::Eq => "=",
            FilterOperator::Ne => "!=",
            FilterOperator::Gt => ">",
            FilterOperator::Gte => ">=",
            FilterOperator::Lt => "<",
            FilterOperator::Lte => "<=",
            FilterOperator::In => "in",
            FilterOperator::NotIn => "!in",
            FilterOperator::Contains => "contains",
            FilterOperator::NotContains => "!contains",
            FilterOperator::Between => "between",
            FilterOperator::NotBetween => "!between",
            FilterOperator::Null => "null",
            FilterOperator::NotNull => "!null",
        }
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One filter condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryFilter {
    /// Field to compare
    pub field: String,
    /// Comparison
    pub op: FilterOperator,
    /// Operand (a list for `in`, `between` and their negations)
    #[serde(default)]
    pub value: Value,
}

impl QueryFilter {
    /// Create a new filter.
    pub fn new(field: impl Into<String>, op: FilterOperator, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            op,
            value: value.into(),
        }
    }
}

/// Page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRange {
    /// Rows to skip
    pub offset: u64,
    /// Page size
    pub limit: u64,
}

impl Default for QueryRange {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: DEFAULT_LIMIT,
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    /// Ascending
    #[default]
    Asc,
    /// Descending
    Desc,
}

/// One sort key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuerySort {
    /// Field to sort by
    pub field: String,
    /// Direction
    #[serde(default)]
    pub direction: SortDirection,
}

impl Default for QuerySort {
    fn default() -> Self {
        Self {
            field: "id".to_string(),
            direction: SortDirection::Asc,
        }
    }
}

/// Parsed list query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryParam {
    /// Resource being listed
    pub resource: String,
    /// Conditions, all of which must hold
    pub filter: Vec<QueryFilter>,
    /// Page window
    pub range: QueryRange,
    /// Sort keys, most significant first
    pub sort: Vec<QuerySort>,
}

impl QueryParam {
    /// Default query for a resource: no filter, first page, sorted by id.
    pub fn new(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            filter: Vec::new(),
            range: QueryRange::default(),
            sort: vec![QuerySort::default()],
        }
    }

    /// Add a filter.
    pub fn with_filter(mut self, filter: QueryFilter) -> Self {
        self.filter.push(filter);
        self
    }

    /// Set the page window.
    pub fn with_range(mut self, offset: u64, limit: u64) -> Self {
        self.range = QueryRange { offset, limit };
        self
    }

    /// Replace the sort keys with a single key.
    pub fn sorted_by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.sort = vec![QuerySort {
            field: field.into(),
            direction,
        }];
        self
    }
}

/// Projected list result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListOutput {
    /// Matching rows before paging
    pub total: u64,
    /// Projected rows of the page, in model order
    pub data: Vec<Record>,
}

/// Wire response for a list request.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ListResponse {
    /// Extra response headers
    pub headers: HashMap<String, String>,
    /// Response body
    pub body: Value,
}

/// Parses list queries and shapes list responses.
pub trait QueryAdaptor: Send + Sync {
    /// Parse the query string parameters of a list request.
    fn parse(&self, resource: &str, query: &HashMap<String, String>) -> ResourceResult<QueryParam>;

    /// Shape a list result into a response.
    fn respond(&self, output: ListOutput, params: &QueryParam, name: &str) -> ListResponse;

    /// Query string parameters this adaptor reads.
    fn params(&self) -> &'static [&'static str];
}

/// Build the `Content-Range` header value `<name> <from>-<to>/<total>`.
///
/// The window comes from the client, so the end saturates.
pub(crate) fn content_range(name: &str, range: &QueryRange, total: u64) -> String {
    format!(
        "{} {}-{}/{}",
        name,
        range.offset,
        range.offset.saturating_add(range.limit),
        total
    )
}
