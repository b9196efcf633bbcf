use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

use super::{
    FilterOperator, ListOutput, ListResponse, QueryAdaptor, QueryFilter, QueryParam, QueryRange,
    QuerySort, SortDirection, DEFAULT_LIMIT,
};
use crate::error::{ResourceError, ResourceResult};

/// Adaptor for refine's simple REST data provider.
///
/// ```text
/// ?filters=[{"field":"age","operator":"between","value":[18,65]}]
/// &pagination={"current":2,"pageSize":30}
/// &sort={"field":"id","order":"desc"}
/// ```
///
/// `between` expands to a `>=` and a `<=` filter, `nbetween` to a `<=` and
/// a `>=` filter. Pages are 1-based. The total goes out in `x-total-count`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RefineQueryAdaptor;

impl RefineQueryAdaptor {
    /// Create a new adaptor.
    pub fn new() -> Self {
        Self
    }
}

#[derive(Debug, Deserialize)]
struct RefineFilter {
    field: String,
    operator: String,
    #[serde(default)]
    value: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefinePagination {
    current: u64,
    page_size: u64,
}

#[derive(Debug, Deserialize)]
struct RefineSort {
    field: String,
    order: String,
}

fn decode<T: DeserializeOwned>(
    query: &HashMap<String, String>,
    key: &str,
) -> ResourceResult<Option<T>> {
    match query.get(key) {
        Some(raw) if !raw.is_empty() => serde_json::from_str(raw)
            .map(Some)
            .map_err(|e| ResourceError::InvalidQuery(format!("{}: {}", key, e))),
        _ => Ok(None),
    }
}

fn operator(name: &str) -> Option<FilterOperator> {
    let op = match name {
        "eq" => FilterOperator::Eq,
        "ne" => FilterOperator::Ne,
        "lt" => FilterOperator::Lt,
        "gt" => FilterOperator::Gt,
        "lte" => FilterOperator::Lte,
        "gte" => FilterOperator::Gte,
        "in" => FilterOperator::In,
        "nin" => FilterOperator::NotIn,
        "contains" => FilterOperator::Contains,
        "ncontains" => FilterOperator::NotContains,
        _ => return None,
    };
    Some(op)
}

fn unsupported(field: &str, value: &Value) -> ResourceError {
    ResourceError::InvalidQuery(format!("Filter not support '{}': {}", field, value))
}

fn expand(filter: RefineFilter) -> ResourceResult<Vec<QueryFilter>> {
    let RefineFilter {
        field,
        operator: name,
        value,
    } = filter;

    if let Some(op) = operator(&name) {
        return Ok(vec![QueryFilter::new(field, op, value)]);
    }

    let (first, second) = match name.as_str() {
        "between" => (FilterOperator::Gte, FilterOperator::Lte),
        "nbetween" => (FilterOperator::Lte, FilterOperator::Gte),
        _ => return Err(unsupported(&field, &value)),
    };
    match value.as_array().map(Vec::as_slice) {
        Some([low, high]) => Ok(vec![
            QueryFilter::new(field.clone(), first, low.clone()),
            QueryFilter::new(field, second, high.clone()),
        ]),
        _ => Err(unsupported(&field, &value)),
    }
}

fn parse_range(pagination: RefinePagination) -> QueryRange {
    QueryRange {
        offset: pagination
            .current
            .saturating_sub(1)
            .saturating_mul(pagination.page_size),
        limit: pagination.page_size,
    }
}

fn parse_sort(sort: RefineSort) -> ResourceResult<QuerySort> {
    let direction = match sort.order.to_uppercase().as_str() {
        "ASC" => SortDirection::Asc,
        "DESC" => SortDirection::Desc,
        _ => {
            return Err(ResourceError::InvalidQuery(format!(
                "sort: unknown order '{}'",
                sort.order
            )))
        }
    };
    Ok(QuerySort {
        field: sort.field,
        direction,
    })
}

impl QueryAdaptor for RefineQueryAdaptor {
    fn parse(&self, resource: &str, query: &HashMap<String, String>) -> ResourceResult<QueryParam> {
        let mut params = QueryParam::new(resource);

        if let Some(filters) = decode::<Vec<RefineFilter>>(query, "filters")? {
            let mut expanded = Vec::with_capacity(filters.len());
            for filter in filters {
                expanded.extend(expand(filter)?);
            }
            params.filter = expanded;
        }
        if let Some(pagination) = decode(query, "pagination")? {
            params.range = parse_range(pagination);
        }
        if let Some(sort) = decode(query, "sort")? {
            params.sort = vec![parse_sort(sort)?];
        }

        Ok(params)
    }

    fn respond(&self, output: ListOutput, _params: &QueryParam, _name: &str) -> ListResponse {
        let mut headers = HashMap::new();
        headers.insert("x-total-count".to_string(), output.total.to_string());

        ListResponse {
            headers,
            body: Value::Array(output.data.into_iter().map(Value::Object).collect()),
        }
    }

    fn params(&self) -> &'static [&'static str] {
        &["filters", "pagination", "sort"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(pairs: &[(&str, &str)]) -> ResourceResult<QueryParam> {
        let query = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        RefineQueryAdaptor.parse("test", &query)
    }

    #[test]
    fn test_defaults() {
        let params = parse(&[]).unwrap();
        assert_eq!(params.range, QueryRange { offset: 0, limit: DEFAULT_LIMIT });
        assert_eq!(params.sort, vec![QuerySort::default()]);
        assert!(params.filter.is_empty());
    }

    #[test]
    fn test_simple_filter_page_and_sort() {
        let params = parse(&[
            ("filters", r#"[{"field":"test","operator":"eq","value":"simple"}]"#),
            ("sort", r#"{"field":"id","order":"desc"}"#),
            ("pagination", r#"{"current":2,"pageSize":30}"#),
        ])
        .unwrap();

        assert_eq!(
            params.filter,
            vec![QueryFilter::new("test", FilterOperator::Eq, "simple")]
        );
        assert_eq!(params.sort[0].field, "id");
        assert_eq!(params.sort[0].direction, SortDirection::Desc);
        assert_eq!(params.range, QueryRange { offset: 30, limit: 30 });
    }

    #[test]
    fn test_between_expands_to_bounds() {
        let params = parse(&[(
            "filters",
            r#"[
                {"field":"test","operator":"gt","value":100},
                {"field":"test2","operator":"contains","value":"test"},
                {"field":"count","operator":"between","value":[100,1000]},
                {"field":"id","operator":"in","value":[1,2,3,4,5]},
                {"field":"age","operator":"nbetween","value":[18,65]}
            ]"#,
        )])
        .unwrap();

        assert_eq!(
            params.filter,
            vec![
                QueryFilter::new("test", FilterOperator::Gt, 100),
                QueryFilter::new("test2", FilterOperator::Contains, "test"),
                QueryFilter::new("count", FilterOperator::Gte, 100),
                QueryFilter::new("count", FilterOperator::Lte, 1000),
                QueryFilter::new("id", FilterOperator::In, json!([1, 2, 3, 4, 5])),
                QueryFilter::new("age", FilterOperator::Lte, 18),
                QueryFilter::new("age", FilterOperator::Gte, 65),
            ]
        );
    }

    #[test]
    fn test_negated_operators() {
        let params = parse(&[(
            "filters",
            r#"[{"field":"a","operator":"nin","value":[1]},{"field":"b","operator":"ncontains","value":"x"}]"#,
        )])
        .unwrap();
        let ops: Vec<FilterOperator> = params.filter.iter().map(|f| f.op).collect();
        assert_eq!(ops, vec![FilterOperator::NotIn, FilterOperator::NotContains]);
    }

    #[test]
    fn test_unsupported_filters() {
        let err = parse(&[("filters", r#"[{"field":"name","operator":"containss","value":"x"}]"#)])
            .unwrap_err();
        assert!(err.to_string().contains("Filter not support 'name'"));

        let err = parse(&[("filters", r#"[{"field":"n","operator":"between","value":[1]}]"#)])
            .unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_page_zero_starts_at_offset_zero() {
        let params = parse(&[("pagination", r#"{"current":0,"pageSize":10}"#)]).unwrap();
        assert_eq!(params.range, QueryRange { offset: 0, limit: 10 });

        let params = parse(&[(
            "pagination",
            r#"{"current":18446744073709551615,"pageSize":10}"#,
        )])
        .unwrap();
        assert_eq!(params.range.offset, u64::MAX);
    }

    #[test]
    fn test_bad_sort_order() {
        assert!(parse(&[("sort", r#"{"field":"id","order":"sideways"}"#)]).is_err());
    }

    #[test]
    fn test_respond_sets_total_count() {
        let params = parse(&[]).unwrap();
        let output = ListOutput {
            total: 42,
            data: vec![json!({"id": 1}).as_object().cloned().unwrap()],
        };
        let response = RefineQueryAdaptor.respond(output, &params, "tests");

        assert_eq!(response.headers["x-total-count"], "42");
        assert!(!response.headers.contains_key("Content-Range"));
        assert_eq!(response.body, json!([{"id": 1}]));
    }
}
