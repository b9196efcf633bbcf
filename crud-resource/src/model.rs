//! The database model seam.
//!
//! A [`DatabaseModel`] is the storage collaborator of a resource. Every
//! operation is optional: a model advertises what it implements through
//! [`DatabaseModel::capabilities`], and the orchestrator answers `404` for
//! anything else before doing any other work.

use async_trait::async_trait;
use crud_acl::{Action, ActionSet};
use crud_schema::{Record, RecordId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::error::{ModelError, ModelResult};
use crate::query::QueryParam;

/// Rows returned by [`DatabaseModel::list`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListResult {
    /// Matching rows before paging
    pub total: u64,
    /// Rows of the requested page
    pub rows: Vec<Record>,
}

/// Storage backing a resource.
///
/// Unimplemented operations default to [`ModelError::Unsupported`].
#[async_trait]
pub trait DatabaseModel: Send + Sync {
    /// Actions this model implements.
    fn capabilities(&self) -> ActionSet;

    /// Fetch one record.
    async fn get(&self, _id: &RecordId) -> ModelResult<Option<Record>> {
        Err(ModelError::Unsupported(Action::Get))
    }

    /// Insert a record and return it as stored.
    async fn create(&self, _data: Record) -> ModelResult<Record> {
        Err(ModelError::Unsupported(Action::Create))
    }

    /// Merge `patch` into a record and return it as stored.
    async fn update(&self, _id: &RecordId, _patch: Record) -> ModelResult<Record> {
        Err(ModelError::Unsupported(Action::Update))
    }

    /// Overwrite a record and return it as stored.
    async fn replace(&self, _id: &RecordId, _data: Record) -> ModelResult<Record> {
        Err(ModelError::Unsupported(Action::Replace))
    }

    /// Delete a record, returning the number of rows removed.
    async fn delete(&self, _id: &RecordId) -> ModelResult<u64> {
        Err(ModelError::Unsupported(Action::Delete))
    }

    /// Query a page of records.
    async fn list(&self, _query: &QueryParam) -> ModelResult<ListResult> {
        Err(ModelError::Unsupported(Action::List))
    }
}

/// Shared model handle.
pub type ModelRef = Arc<dyn DatabaseModel>;

/// Picks a model for `(resource name, action)`.
pub type ModelResolver = Arc<dyn Fn(&str, Action) -> Option<ModelRef> + Send + Sync>;

/// How a resource finds its model.
#[derive(Clone)]
pub enum ModelBinding {
    /// One model for every action
    Fixed(ModelRef),
    /// A model chosen per call
    Resolver(ModelResolver),
}

impl ModelBinding {
    /// Bind a single model.
    pub fn fixed(model: impl DatabaseModel + 'static) -> Self {
        ModelBinding::Fixed(Arc::new(model))
    }

    /// Bind a resolver closure.
    pub fn resolver<F>(f: F) -> Self
    where
        F: Fn(&str, Action) -> Option<ModelRef> + Send + Sync + 'static,
    {
        ModelBinding::Resolver(Arc::new(f))
    }

    /// Resolve the model for an action.
    pub fn resolve(&self, resource_name: &str, action: Action) -> Option<ModelRef> {
        match self {
            ModelBinding::Fixed(model) => Some(model.clone()),
            ModelBinding::Resolver(f) => f(resource_name, action),
        }
    }
}

impl From<ModelRef> for ModelBinding {
    fn from(model: ModelRef) -> Self {
        ModelBinding::Fixed(model)
    }
}

impl fmt::Debug for ModelBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelBinding::Fixed(_) => f.write_str("Fixed(..)"),
            ModelBinding::Resolver(_) => f.write_str("Resolver(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ReadOnly;

    #[async_trait]
    impl DatabaseModel for ReadOnly {
        fn capabilities(&self) -> ActionSet {
            ActionSet::read_only()
        }

        async fn get(&self, id: &RecordId) -> ModelResult<Option<Record>> {
            let mut record = Record::new();
            record.insert("id".into(), id.to_value());
            Ok(Some(record))
        }
    }

    #[tokio::test]
    async fn test_default_operations_unsupported() {
        let model = ReadOnly;
        assert!(model.get(&RecordId::Int(1)).await.unwrap().is_some());

        let err = model.create(Record::new()).await.unwrap_err();
        assert!(matches!(err, ModelError::Unsupported(Action::Create)));
        assert_eq!(err.status_code(), 404);
    }

    #[test]
    fn test_resolver_binding() {
        let binding = ModelBinding::resolver(|resource, action| {
            (resource == "post" && action.is_read_only()).then(|| Arc::new(ReadOnly) as ModelRef)
        });

        assert!(binding.resolve("post", Action::Get).is_some());
        assert!(binding.resolve("post", Action::Create).is_none());
        assert!(binding.resolve("user", Action::Get).is_none());
        assert_eq!(format!("{:?}", binding), "Resolver(..)");
    }
}
