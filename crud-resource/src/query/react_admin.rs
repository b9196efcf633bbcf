use serde_json::{Map, Value};
use std::collections::HashMap;

use super::{
    content_range, FilterOperator, ListOutput, ListResponse, QueryAdaptor, QueryFilter, QueryParam,
    QueryRange, QuerySort, SortDirection,
};
use crate::error::{ResourceError, ResourceResult};

/// Adaptor for react-admin's simple REST conventions.
///
/// ```text
/// ?filter={"status":"live","id":[1,2],"age":{"min":18}}
/// &range=[0,24]
/// &sort=["title","ASC"]
/// ```
///
/// Scalar filter values compare with `=`, arrays with `in`. Object values
/// map `min`/`begin`/`since` to `>=`, `max`/`end`/`until` to `<=`, `after`
/// to `>` and `before` to `<`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReactAdminQueryAdaptor;

impl ReactAdminQueryAdaptor {
    /// Create a new adaptor.
    pub fn new() -> Self {
        Self
    }
}

fn decode(query: &HashMap<String, String>, key: &str) -> ResourceResult<Option<Value>> {
    match query.get(key) {
        Some(raw) if !raw.is_empty() => serde_json::from_str(raw)
            .map(Some)
            .map_err(|e| ResourceError::InvalidQuery(format!("{}: {}", key, e))),
        _ => Ok(None),
    }
}

const BOUNDS: [(&[&str], FilterOperator); 4] = [
    (&["min", "begin", "since"], FilterOperator::Gte),
    (&["max", "end", "until"], FilterOperator::Lte),
    (&["after"], FilterOperator::Gt),
    (&["before"], FilterOperator::Lt),
];

/// First present, truthy bound among `keys`.
fn bound<'a>(range: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| range.get(*k))
        .find(|v| is_truthy(v))
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

fn parse_filter(filter: Value) -> ResourceResult<Vec<QueryFilter>> {
    let Value::Object(fields) = filter else {
        return Err(ResourceError::InvalidQuery("filter must be an object".into()));
    };

    let mut filters = Vec::new();
    for (field, value) in fields {
        match value {
            Value::String(_) | Value::Number(_) | Value::Bool(_) => {
                filters.push(QueryFilter::new(field, FilterOperator::Eq, value));
            }
            Value::Array(_) => {
                filters.push(QueryFilter::new(field, FilterOperator::In, value));
            }
            Value::Object(range) => {
                let before = filters.len();
                for (keys, op) in BOUNDS {
                    if let Some(v) = bound(&range, keys) {
                        filters.push(QueryFilter::new(field.clone(), op, v.clone()));
                    }
                }
                if filters.len() == before {
                    return Err(unsupported(&field, &Value::Object(range)));
                }
            }
            Value::Null => return Err(unsupported(&field, &Value::Null)),
        }
    }
    Ok(filters)
}

fn unsupported(field: &str, value: &Value) -> ResourceError {
    ResourceError::InvalidQuery(format!("Filter not support '{}': {}", field, value))
}

fn parse_range(range: Value) -> ResourceResult<QueryRange> {
    let pair: (u64, u64) = serde_json::from_value(range)
        .map_err(|e| ResourceError::InvalidQuery(format!("range: {}", e)))?;
    Ok(QueryRange {
        offset: pair.0,
        limit: pair.1,
    })
}

fn parse_sort(sort: Value) -> ResourceResult<QuerySort> {
    let (field, direction): (String, SortDirection) = serde_json::from_value(sort)
        .map_err(|e| ResourceError::InvalidQuery(format!("sort: {}", e)))?;
    Ok(QuerySort { field, direction })
}

impl QueryAdaptor for ReactAdminQueryAdaptor {
    fn parse(&self, resource: &str, query: &HashMap<String, String>) -> ResourceResult<QueryParam> {
        let mut params = QueryParam::new(resource);

        if let Some(filter) = decode(query, "filter")? {
            params.filter = parse_filter(filter)?;
        }
        if let Some(range) = decode(query, "range")? {
            params.range = parse_range(range)?;
        }
        if let Some(sort) = decode(query, "sort")? {
            params.sort = vec![parse_sort(sort)?];
        }

        Ok(params)
    }

    /// The `Content-Range` header carries the resource name, not the
    /// endpoint name.
    fn respond(&self, output: ListOutput, params: &QueryParam, _name: &str) -> ListResponse {
        let mut headers = HashMap::new();
        headers.insert(
            "Content-Range".to_string(),
            content_range(&params.resource, &params.range, output.total),
        );

        ListResponse {
            headers,
            body: Value::Array(output.data.into_iter().map(Value::Object).collect()),
        }
    }

    fn params(&self) -> &'static [&'static str] {
        &["filter", "range", "sort"]
    }
}
