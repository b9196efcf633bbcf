//! In-memory database model.
//!
//! Useful for tests, prototypes and fixtures. Rows live behind a tokio
//! `RwLock`; ids are assigned from an auto-increment counter unless the
//! created record carries its own `id`.

use async_trait::async_trait;
use crud_acl::{Action, ActionSet};
use crud_schema::{Record, RecordId};
use serde_json::Value;
use std::cmp::Ordering;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::{ModelError, ModelResult};
use crate::model::{DatabaseModel, ListResult};
use crate::query::{FilterOperator, QueryFilter, QueryParam, QuerySort, SortDirection};

#[derive(Debug, Default)]
struct MemoryState {
    rows: Vec<Record>,
    next_id: i64,
}

impl MemoryState {
    fn position(&self, id: &RecordId) -> Option<usize> {
        self.rows
            .iter()
            .position(|row| RecordId::of(row).as_ref() == Some(id))
    }

    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// A [`DatabaseModel`] holding rows in memory.
#[derive(Debug, Clone)]
pub struct MemoryModel {
    state: Arc<RwLock<MemoryState>>,
    capabilities: ActionSet,
}

impl Default for MemoryModel {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryModel {
    /// Create an empty model supporting every action.
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(MemoryState::default())),
            capabilities: ActionSet::all(),
        }
    }

    /// Create a model seeded with rows.
    ///
    /// The id counter continues after the largest integer id found.
    pub fn with_rows(rows: impl IntoIterator<Item = Record>) -> Self {
        let rows: Vec<Record> = rows.into_iter().collect();
        let next_id = rows
            .iter()
            .filter_map(|row| match RecordId::of(row) {
                Some(RecordId::Int(n)) => Some(n),
                _ => None,
            })
            .max()
            .unwrap_or(0);

        Self {
            state: Arc::new(RwLock::new(MemoryState { rows, next_id })),
            capabilities: ActionSet::all(),
        }
    }

    /// Restrict the actions this model advertises.
    pub fn with_capabilities(mut self, capabilities: ActionSet) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Check if the model advertises `action`.
    pub fn supports(&self, action: Action) -> bool {
        self.capabilities.contains(action)
    }

    /// Number of stored rows.
    pub async fn len(&self) -> usize {
        self.state.read().await.rows.len()
    }

    /// Check if no rows are stored.
    pub async fn is_empty(&self) -> bool {
        self.state.read().await.rows.is_empty()
    }

    /// Snapshot of every stored row.
    pub async fn rows(&self) -> Vec<Record> {
        self.state.read().await.rows.clone()
    }
}

#[async_trait]
impl DatabaseModel for MemoryModel {
    fn capabilities(&self) -> ActionSet {
        self.capabilities
    }

    async fn get(&self, id: &RecordId) -> ModelResult<Option<Record>> {
        let state = self.state.read().await;
        Ok(state.position(id).map(|i| state.rows[i].clone()))
    }

    async fn create(&self, data: Record) -> ModelResult<Record> {
        let mut state = self.state.write().await;

        let id = match RecordId::of(&data) {
            Some(id) if state.position(&id).is_some() => {
                return Err(ModelError::Backend(format!("Duplicate id {}", id)))
            }
            Some(id) => {
                if let RecordId::Int(n) = &id {
                    state.next_id = state.next_id.max(*n);
                }
                id.to_value()
            }
            None => Value::from(state.allocate_id()),
        };

        let mut row = Record::new();
        row.insert("id".into(), id);
        row.extend(data.into_iter().filter(|(k, _)| k != "id"));

        state.rows.push(row.clone());
        Ok(row)
    }

    async fn update(&self, id: &RecordId, patch: Record) -> ModelResult<Record> {
        let mut state = self.state.write().await;
        let i = state
            .position(id)
            .ok_or_else(|| ModelError::NotFound(id.clone()))?;

        let row = &mut state.rows[i];
        row.extend(patch.into_iter().filter(|(k, _)| k != "id"));
        Ok(row.clone())
    }

    async fn replace(&self, id: &RecordId, data: Record) -> ModelResult<Record> {
        let mut state = self.state.write().await;
        let i = state
            .position(id)
            .ok_or_else(|| ModelError::NotFound(id.clone()))?;

        let mut row = Record::new();
        row.insert("id".into(), id.to_value());
        row.extend(data.into_iter().filter(|(k, _)| k != "id"));
        state.rows[i] = row.clone();
        Ok(row)
    }

    async fn delete(&self, id: &RecordId) -> ModelResult<u64> {
        let mut state = self.state.write().await;
        let before = state.rows.len();
        state
            .rows
            .retain(|row| RecordId::of(row).as_ref() != Some(id));
        Ok((before - state.rows.len()) as u64)
    }

    async fn list(&self, query: &QueryParam) -> ModelResult<ListResult> {
        let state = self.state.read().await;

        let mut rows: Vec<&Record> = state
            .rows
            .iter()
            .filter(|row| query.filter.iter().all(|f| matches_filter(row, f)))
            .collect();
        rows.sort_by(|a, b| compare_rows(a, b, &query.sort));

        let total = rows.len() as u64;
        let rows = rows
            .into_iter()
            .skip(query.range.offset as usize)
            .take(query.range.limit as usize)
            .cloned()
            .collect();

        Ok(ListResult { total, rows })
    }
}

fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        (Value::Null, _) => Some(Ordering::Less),
        (_, Value::Null) => Some(Ordering::Greater),
        _ => None,
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    compare_values(a, b) == Some(Ordering::Equal) || a == b
}

fn matches_filter(row: &Record, filter: &QueryFilter) -> bool {
    let value = row.get(&filter.field).unwrap_or(&Value::Null);
    let operand = &filter.value;

    match filter.op {
        FilterOperator::Eq => values_equal(value, operand),
        FilterOperator::Ne => !values_equal(value, operand),
        FilterOperator::Gt => compare_values(value, operand) == Some(Ordering::Greater),
        FilterOperator::Gte => matches!(
            compare_values(value, operand),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        FilterOperator::Lt => compare_values(value, operand) == Some(Ordering::Less),
        FilterOperator::Lte => matches!(
            compare_values(value, operand),
            Some(Ordering::Less | Ordering::Equal)
        ),
        FilterOperator::In => is_member(value, operand),
        FilterOperator::NotIn => !is_member(value, operand),
        FilterOperator::Contains => contains(value, operand),
        FilterOperator::NotContains => !contains(value, operand),
        FilterOperator::Between => is_between(value, operand),
        FilterOperator::NotBetween => !is_between(value, operand),
        FilterOperator::Null => value.is_null(),
        FilterOperator::NotNull => !value.is_null(),
    }
}

fn is_member(value: &Value, operand: &Value) -> bool {
    match operand {
        Value::Array(items) => items.iter().any(|item| values_equal(value, item)),
        other => values_equal(value, other),
    }
}

fn contains(value: &Value, operand: &Value) -> bool {
    match (value, operand) {
        (Value::String(haystack), Value::String(needle)) => haystack.contains(needle.as_str()),
        (Value::Array(items), needle) => items.iter().any(|item| values_equal(item, needle)),
        _ => false,
    }
}

fn is_between(value: &Value, operand: &Value) -> bool {
    let Some([low, high]) = operand.as_array().map(Vec::as_slice) else {
        return false;
    };
    matches!(
        compare_values(value, low),
        Some(Ordering::Greater | Ordering::Equal)
    ) && matches!(
        compare_values(value, high),
        Some(Ordering::Less | Ordering::Equal)
    )
}

fn compare_rows(a: &Record, b: &Record, sort: &[QuerySort]) -> Ordering {
    for key in sort {
        let left = a.get(&key.field).unwrap_or(&Value::Null);
        let right = b.get(&key.field).unwrap_or(&Value::Null);
        let ordering = compare_values(left, right).unwrap_or(Ordering::Equal);
        let ordering = match key.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}
