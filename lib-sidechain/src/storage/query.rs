//! Document filters, sorting and paging.

use std::cmp::Ordering;

use serde_json::{Number, Value};

use super::{document_id, Document};

/// Hard cap on documents returned by one `find`.
pub const MAX_PAGE_SIZE: usize = 1000;

/// Predicate on a single field
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Eq(Value),
    Range {
        gt: Option<Value>,
        gte: Option<Value>,
        lt: Option<Value>,
        lte: Option<Value>,
    },
    In(Vec<Value>),
}

impl Condition {
    fn matches(&self, value: Option<&Value>) -> bool {
        let value = match value {
            Some(v) => v,
            None => return false,
        };
        match self {
            Condition::Eq(expected) => compare_values(value, expected) == Some(Ordering::Equal),
            Condition::In(set) => set
                .iter()
                .any(|candidate| compare_values(value, candidate) == Some(Ordering::Equal)),
            Condition::Range { gt, gte, lt, lte } => {
                let bound = |limit: &Option<Value>, accept: fn(Ordering) -> bool| match limit {
                    Some(limit) => compare_values(value, limit).map_or(false, accept),
                    None => true,
                };
                bound(gt, |o| o == Ordering::Greater)
                    && bound(gte, |o| o != Ordering::Less)
                    && bound(lt, |o| o == Ordering::Less)
                    && bound(lte, |o| o != Ordering::Greater)
            }
        }
    }
}

/// Conjunction of field conditions. Field names may use `a.b` paths.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    clauses: Vec<(String, Condition)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(self, field: &str, value: impl Into<Value>) -> Self {
        self.with(field, Condition::Eq(value.into()))
    }

    pub fn gt(self, field: &str, value: impl Into<Value>) -> Self {
        self.range(field, Some(value.into()), None, None, None)
    }

    pub fn gte(self, field: &str, value: impl Into<Value>) -> Self {
        self.range(field, None, Some(value.into()), None, None)
    }

    pub fn lt(self, field: &str, value: impl Into<Value>) -> Self {
        self.range(field, None, None, Some(value.into()), None)
    }

    pub fn lte(self, field: &str, value: impl Into<Value>) -> Self {
        self.range(field, None, None, None, Some(value.into()))
    }

    pub fn one_of(self, field: &str, values: Vec<Value>) -> Self {
        self.with(field, Condition::In(values))
    }

    pub fn with(mut self, field: &str, condition: Condition) -> Self {
        self.clauses.push((field.to_string(), condition));
        self
    }

    fn range(
        self,
        field: &str,
        gt: Option<Value>,
        gte: Option<Value>,
        lt: Option<Value>,
        lte: Option<Value>,
    ) -> Self {
        self.with(field, Condition::Range { gt, gte, lt, lte })
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn matches(&self, doc: &Document) -> bool {
        self.clauses
            .iter()
            .all(|(field, condition)| condition.matches(field_value(doc, field)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// Filter plus sort keys and paging.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub filter: Filter,
    pub sort: Vec<(String, SortOrder)>,
    pub limit: usize,
    pub offset: usize,
}

impl Default for Query {
    fn default() -> Self {
        Self {
            filter: Filter::new(),
            sort: Vec::new(),
            limit: MAX_PAGE_SIZE,
            offset: 0,
        }
    }
}

impl Query {
    pub fn new(filter: Filter) -> Self {
        Self {
            filter,
            ..Self::default()
        }
    }

    pub fn sort_by(mut self, field: &str, order: SortOrder) -> Self {
        self.sort.push((field.to_string(), order));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn effective_limit(&self) -> usize {
        self.limit.min(MAX_PAGE_SIZE)
    }

    /// Sort `docs` by the query keys, ties broken by ascending `_id`, then page.
    pub fn apply(&self, mut docs: Vec<Document>) -> Vec<Document> {
        docs.sort_by(|a, b| {
            for (field, order) in &self.sort {
                let ordering = compare_optional(field_value(a, field), field_value(b, field));
                let ordering = match order {
                    SortOrder::Ascending => ordering,
                    SortOrder::Descending => ordering.reverse(),
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            document_id(a).cmp(&document_id(b))
        });
        docs.into_iter()
            .skip(self.offset)
            .take(self.effective_limit())
            .collect()
    }
}

/// Resolve a dotted field path inside a document.
pub fn field_value<'a>(doc: &'a Document, path: &str) -> Option<&'a Value> {
    let mut parts = path.split('.');
    let mut current = doc.get(parts.next()?)?;
    for part in parts {
        current = current.as_object()?.get(part)?;
    }
    Some(current)
}

/// Order two JSON scalars of the same type for filter matching. Mixed types are incomparable.
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => Some(x.cmp(&y)),
            _ => x.as_f64()?.partial_cmp(&y.as_f64()?),
        },
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ if a == b => Some(Ordering::Equal),
        _ => None,
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

// (float value, is float, exact integer). Lexicographic order on this key
// agrees with exact integer order and never reports two distinct numbers equal.
fn number_key(n: &Number) -> (f64, bool, i128) {
    let exact = n
        .as_i64()
        .map(i128::from)
        .or_else(|| n.as_u64().map(i128::from))
        .unwrap_or(0);
    (n.as_f64().unwrap_or(0.0), n.is_f64(), exact)
}

/// Total order over JSON values used for sorting.
///
/// Values of different types order by type: null, bool, number, string,
/// array, object. Arrays and objects order by their JSON text.
pub fn sort_order(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let (xf, x_float, xi) = number_key(x);
            let (yf, y_float, yi) = number_key(y);
            xf.total_cmp(&yf)
                .then(x_float.cmp(&y_float))
                .then(xi.cmp(&yi))
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Array(_), Value::Array(_)) | (Value::Object(_), Value::Object(_)) => {
            a.to_string().cmp(&b.to_string())
        }
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

// Missing fields sort first.
fn compare_optional(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => sort_order(a, b),
    }
}
