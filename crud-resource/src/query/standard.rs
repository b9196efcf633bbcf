use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;

use super::{content_range, ListOutput, ListResponse, QueryAdaptor, QueryParam};
use crate::error::{ResourceError, ResourceResult};

/// Adaptor for JSON-encoded query parameters.
///
/// ```text
/// ?filter=[{"field":"age","op":">=","value":18}]
/// &range={"offset":0,"limit":30}
/// &sort={"field":"id","direction":"ASC"}
/// ```
///
/// Responds with the rows as body and a `Content-Range` header naming the
/// endpoint.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardQueryAdaptor;

impl StandardQueryAdaptor {
    /// Create a new adaptor.
    pub fn new() -> Self {
        Self
    }
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

impl QueryAdaptor for StandardQueryAdaptor {
    fn parse(&self, resource: &str, query: &HashMap<String, String>) -> ResourceResult<QueryParam> {
        let mut params = QueryParam::new(resource);

        if let Some(filter) = decode(query, "filter")? {
            params.filter = filter;
        }
        if let Some(range) = decode(query, "range")? {
            params.range = range;
        }
        if let Some(sort) = decode(query, "sort")? {
            params.sort = vec![sort];
        }

        Ok(params)
    }

    fn respond(&self, output: ListOutput, params: &QueryParam, name: &str) -> ListResponse {
        let mut headers = HashMap::new();
        headers.insert(
            "Content-Range".to_string(),
            content_range(name, &params.range, output.total),
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{FilterOperator, QueryFilter, QueryRange, SortDirection};
    use serde_json::json;

    fn query(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults_when_empty() {
        let params = StandardQueryAdaptor.parse("post", &HashMap::new()).unwrap();
        assert_eq!(params, QueryParam::new("post"));
    }

    #[test]
    fn test_parse_all_parts() {
        let q = query(&[
            ("filter", r#"[{"field":"age","op":">=","value":18}]"#),
            ("range", r#"{"offset":20,"limit":10}"#),
            ("sort", r#"{"field":"name","direction":"DESC"}"#),
        ]);
        let params = StandardQueryAdaptor.parse("user", &q).unwrap();

        assert_eq!(params.filter, vec![QueryFilter::new("age", FilterOperator::Gte, 18)]);
        assert_eq!(params.range, QueryRange { offset: 20, limit: 10 });
        assert_eq!(params.sort[0].field, "name");
        assert_eq!(params.sort[0].direction, SortDirection::Desc);
    }

    #[test]
    fn test_malformed_json_is_invalid_query() {
        let q = query(&[("range", "{oops")]);
        let err = StandardQueryAdaptor.parse("user", &q).unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert!(err.to_string().starts_with("Invalid query: range"));
    }

    #[test]
    fn test_respond_sets_content_range() {
        let params = QueryParam::new("user").with_range(0, 2);
        let output = ListOutput {
            total: 7,
            data: vec![json!({"id": 1}).as_object().cloned().unwrap()],
        };
        let response = StandardQueryAdaptor.respond(output, &params, "users");

        assert_eq!(response.headers["Content-Range"], "users 0-2/7");
        assert_eq!(response.body, json!([{"id": 1}]));
    }
}
