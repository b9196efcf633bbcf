//! Endpoint descriptors.
//!
//! [`Resource::endpoints`] compiles one [`ResourceEndpoint`] per enabled
//! action. Each descriptor carries the route, the JSON schemas of its
//! inputs and output, and a handler bound to the resource.

use async_trait::async_trait;
use crud_acl::Action;
use crud_schema::{RecordId, SchemaAction};
use serde_json::{json, Map, Value};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::HttpMethod;
use crate::error::{ResourceError, ResourceResult};
use crate::http::{EndpointHandler, HandlerRequest, HandlerResponse};
use crate::resource::Resource;

/// A route exposed by a resource.
#[derive(Clone)]
pub struct ResourceEndpoint {
    /// Route path, e.g. `/post/:id`
    pub path: String,
    /// HTTP method
    pub method: HttpMethod,
    /// Action served
    pub action: Action,
    /// Tags from the resource configuration
    pub tags: Vec<String>,
    /// Human-readable summary
    pub description: String,
    /// Schema of the query string (list only)
    pub query_schema: Option<Value>,
    /// Schema of the path parameters (record actions only)
    pub params_schema: Option<Value>,
    /// Schema of the request body (create, update, replace)
    pub body_schema: Option<Value>,
    /// Schema of the response body
    pub response_schema: Option<Value>,
    /// Request handler
    pub handler: Arc<dyn EndpointHandler>,
}

impl fmt::Debug for ResourceEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceEndpoint")
            .field("path", &self.path)
            .field("method", &self.method)
            .field("action", &self.action)
            .field("tags", &self.tags)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

fn id_params_schema() -> Value {
    json!({
        "type": "object",
        "properties": {"id": {"type": "string"}},
        "required": ["id"],
    })
}

fn list_query_schema(params: &[&str]) -> Value {
    let properties: Map<String, Value> = params
        .iter()
        .map(|p| (p.to_string(), json!({"type": "string"})))
        .collect();
    json!({"type": "object", "properties": properties})
}

fn description(action: Action, resource_name: &str) -> String {
    match action {
        Action::Create => format!("Create a {}", resource_name),
        Action::Get => format!("Get a {} by id", resource_name),
        Action::Update => format!("Update fields of a {}", resource_name),
        Action::Replace => format!("Replace a {}", resource_name),
        Action::Delete => format!("Delete a {}", resource_name),
        Action::List => format!("List {}", resource_name),
    }
}

pub(crate) fn compile(resource: &Arc<Resource>) -> Vec<ResourceEndpoint> {
    let name = resource.resource_name();
    let schema = resource.schema();
    let config = resource.config();
    let view = schema.json_schema(SchemaAction::View);

    config
        .actions
        .enabled()
        .into_iter()
        .map(|(action, method)| {
            let body_schema = match action {
                Action::Create | Action::Update | Action::Replace => {
                    schema.json_schema(SchemaAction::from(action))
                }
                _ => None,
            };
            let response_schema = match action {
                Action::Delete => Some(json!({
                    "type": "object",
                    "properties": {"deleted": {"type": "integer"}},
                })),
                Action::List => view.clone().map(|items| json!({"type": "array", "items": items})),
                _ => view.clone(),
            };

            ResourceEndpoint {
                path: config.path(name, action),
                method,
                action,
                tags: config.tags.clone(),
                description: description(action, name),
                query_schema: (action == Action::List)
                    .then(|| list_query_schema(resource.query_adaptor().params())),
                params_schema: action.targets_record().then(id_params_schema),
                body_schema,
                response_schema,
                handler: Arc::new(ActionHandler {
                    resource: Arc::clone(resource),
                    action,
                }),
            }
        })
        .collect()
}

/// Handler serving one action of a resource.
struct ActionHandler {
    resource: Arc<Resource>,
    action: Action,
}

impl ActionHandler {
    fn id(request: &HandlerRequest) -> ResourceResult<RecordId> {
        request
            .params
            .get("id")
            .map(|id| RecordId::parse(id))
            .ok_or_else(|| ResourceError::InvalidQuery("missing path parameter id".into()))
    }

    async fn dispatch(&self, request: &HandlerRequest) -> ResourceResult<HandlerResponse> {
        let resource = &self.resource;
        let actor = request.actor.as_ref();

        match self.action {
            Action::Create => {
                let record = resource.create(actor, &request.body).await?;
                Ok(HandlerResponse::created(Value::Object(record)))
            }
            Action::Get => {
                let id = Self::id(request)?;
                match resource.get(actor, &id).await? {
                    Some(record) => Ok(HandlerResponse::ok(Value::Object(record))),
                    None => Ok(HandlerResponse::new(404, json!({"message": "Not found."}))),
                }
            }
            Action::Update => {
                let id = Self::id(request)?;
                let record = resource.update(actor, &id, &request.body).await?;
                Ok(HandlerResponse::ok(Value::Object(record)))
            }
            Action::Replace => {
                let id = Self::id(request)?;
                let record = resource.replace(actor, &id, &request.body).await?;
                Ok(HandlerResponse::ok(Value::Object(record)))
            }
            Action::Delete => {
                let id = Self::id(request)?;
                let deleted = resource.delete(actor, &id).await?;
                Ok(HandlerResponse::ok(json!({ "deleted": deleted })))
            }
            Action::List => {
                let query = resource.parse_query(&request.query)?;
                let output = resource.list(actor, &query).await?;
                let adaptor = resource.query_adaptor();
                let list = adaptor.respond(output, &query, resource.resource_name());
                Ok(HandlerResponse::ok(list.body).with_headers(list.headers))
            }
        }
    }
}

#[async_trait]
impl EndpointHandler for ActionHandler {
    async fn handle(&self, request: HandlerRequest) -> HandlerResponse {
        match self.dispatch(&request).await {
            Ok(response) => response,
            Err(error) => {
                let status = error.status_code();
                if status >= 500 {
                    warn!(
                        resource = %self.resource.resource_name(),
                        action = %self.action,
                        error = %error,
                        "Request failed"
                    );
                } else {
                    debug!(status, error = %error, "Request rejected");
                }
                HandlerResponse::from_error(&error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResourceConfig;
    use crate::memory::MemoryModel;
    use crate::model::ModelBinding;
    use crud_schema::{FieldDescriptor, ResourceSchema};

    fn resource(config: ResourceConfig) -> Arc<Resource> {
        let schema = ResourceSchema::builder("post")
            .field(FieldDescriptor::integer("id").read_only())
            .field(FieldDescriptor::string("title").required())
            .field(FieldDescriptor::text("secret").hidden())
            .build()
            .unwrap();
        Arc::new(
            Resource::builder(schema)
                .model(ModelBinding::fixed(MemoryModel::new()))
                .config(config)
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn test_compiles_every_enabled_action() {
        let endpoints = resource(ResourceConfig::default().with_tag("blog")).endpoints();
        let routes: Vec<(HttpMethod, &str)> = endpoints
            .iter()
            .map(|e| (e.method, e.path.as_str()))
            .collect();

        assert_eq!(
            routes,
            vec![
                (HttpMethod::Post, "/post"),
                (HttpMethod::Get, "/post/:id"),
                (HttpMethod::Patch, "/post/:id"),
                (HttpMethod::Put, "/post/:id"),
                (HttpMethod::Delete, "/post/:id"),
                (HttpMethod::Get, "/post"),
            ]
        );
        assert!(endpoints.iter().all(|e| e.tags == vec!["blog".to_string()]));
    }

    #[test]
    fn test_schemas_attached() {
        let endpoints = resource(ResourceConfig::default()).endpoints();
        let by_action = |a: Action| endpoints.iter().find(|e| e.action == a).unwrap();

        let create = by_action(Action::Create);
        assert_eq!(create.body_schema.as_ref().unwrap()["required"], json!(["title"]));
        assert!(create.params_schema.is_none());

        let get = by_action(Action::Get);
        assert_eq!(get.params_schema, Some(id_params_schema()));
        let response = get.response_schema.as_ref().unwrap();
        assert!(response["properties"].get("secret").is_none());

        let list = by_action(Action::List);
        assert_eq!(list.response_schema.as_ref().unwrap()["type"], "array");
        let query = list.query_schema.as_ref().unwrap();
        assert_eq!(query["properties"]["range"], json!({"type": "string"}));
    }

    #[test]
    fn test_disabled_actions_and_base_path() {
        let config = ResourceConfig::default().with_base_path("/api");
        let mut config = config;
        config.actions.set(Action::Delete, None);
        config.actions.set(Action::Replace, None);

        let endpoints = resource(config).endpoints();
        assert_eq!(endpoints.len(), 4);
        assert!(endpoints.iter().all(|e| e.path.starts_with("/api/post")));
        assert!(endpoints.iter().all(|e| e.action != Action::Delete));
    }
}
