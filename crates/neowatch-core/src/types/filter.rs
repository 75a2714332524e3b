//! Filter specification types for dynamic query building.
//!
//! A filter is a field name paired with a closed operator enum and a
//! dynamic value. The string suffix form (`"earth_moid_au__lte"`) used by
//! callers parses into the enum up front, so unknown operators are rejected
//! at construction time rather than at query time. All conditions in a
//! [`FilterSet`] combine with logical AND; there is no OR or grouping.

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::result::AppResult;
use crate::types::schema::{ColumnKind, TableSchema};
use crate::types::value::Value;

/// Filter comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOp {
    /// Exact equality.
    Eq,
    /// Not equal.
    Ne,
    /// Greater than.
    Gt,
    /// Greater than or equal.
    Gte,
    /// Less than.
    Lt,
    /// Less than or equal.
    Lte,
    /// List membership.
    In,
    /// Case-insensitive substring match (text columns only).
    Contains,
}

impl FilterOp {
    /// Parse an operator suffix token. Returns `None` for unknown tokens.
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "eq" => Some(Self::Eq),
            "ne" => Some(Self::Ne),
            "gt" => Some(Self::Gt),
            "gte" => Some(Self::Gte),
            "lt" => Some(Self::Lt),
            "lte" => Some(Self::Lte),
            "in" => Some(Self::In),
            "contains" => Some(Self::Contains),
            _ => None,
        }
    }

    /// The suffix token for this operator.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::In => "in",
            Self::Contains => "contains",
        }
    }
}

/// A single filter condition on a named field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    /// The column name to filter on.
    pub field: String,
    /// The comparison operator.
    pub op: FilterOp,
    /// The value to compare against.
    pub value: Value,
}

impl Filter {
    /// Create a new filter condition.
    pub fn new(field: impl Into<String>, op: FilterOp, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    /// Parse a `"field"` or `"field__operator"` key into a condition.
    ///
    /// A bare field name means equality. An unknown operator suffix is a
    /// contract violation and fails immediately.
    pub fn parse(key: &str, value: impl Into<Value>) -> AppResult<Self> {
        let (field, op) = match key.rsplit_once("__") {
            Some((field, token)) => {
                let op = FilterOp::parse(token).ok_or_else(|| {
                    AppError::invalid_filter(format!("unknown operator '{token}' in key '{key}'"))
                })?;
                (field, op)
            }
            None => (key, FilterOp::Eq),
        };
        if field.is_empty() {
            return Err(AppError::invalid_filter(format!(
                "empty field name in key '{key}'"
            )));
        }
        Ok(Self::new(field, op, value))
    }

    /// Validate this condition against a table schema and coerce its value
    /// to the column's storage type.
    pub fn validate(&self, schema: &TableSchema) -> AppResult<CoercedFilter> {
        let column = schema.column(&self.field).ok_or_else(|| {
            AppError::invalid_filter(format!(
                "unknown field '{}' for table '{}'",
                self.field, schema.table
            ))
        })?;

        let value = match (self.op, &self.value) {
            (FilterOp::Contains, value) => {
                if column.kind != ColumnKind::Text {
                    return Err(AppError::invalid_filter(format!(
                        "operator 'contains' requires a text column, '{}' is {}",
                        column.name, column.kind
                    )));
                }
                match value {
                    Value::Text(_) => value.clone(),
                    other => {
                        return Err(AppError::invalid_filter(format!(
                            "operator 'contains' on '{}' requires a text value, got {}",
                            column.name,
                            other.kind_name()
                        )))
                    }
                }
            }
            (FilterOp::In, Value::List(items)) => {
                let coerced = items
                    .iter()
                    .map(|item| {
                        item.coerce_to(column.kind).map_err(|reason| {
                            AppError::invalid_filter(format!(
                                "bad value in 'in' list for '{}': {reason}",
                                column.name
                            ))
                        })
                    })
                    .collect::<AppResult<Vec<_>>>()?;
                Value::List(coerced)
            }
            (FilterOp::In, other) => {
                return Err(AppError::invalid_filter(format!(
                    "operator 'in' on '{}' requires a list value, got {}",
                    column.name,
                    other.kind_name()
                )))
            }
            (FilterOp::Eq | FilterOp::Ne, Value::Null) => Value::Null,
            (op, Value::Null) => {
                return Err(AppError::invalid_filter(format!(
                    "operator '{}' on '{}' does not accept null",
                    op.as_str(),
                    column.name
                )))
            }
            (_, value) => value.coerce_to(column.kind).map_err(|reason| {
                AppError::invalid_filter(format!("bad value for '{}': {reason}", column.name))
            })?,
        };

        Ok(CoercedFilter {
            field: column.name,
            kind: column.kind,
            op: self.op,
            value,
        })
    }
}

/// A condition validated against a schema, ready for SQL generation.
#[derive(Debug, Clone, PartialEq)]
pub struct CoercedFilter {
    /// Declared column name (`'static`, safe to splice into SQL).
    pub field: &'static str,
    /// Storage type of the column.
    pub kind: ColumnKind,
    /// The comparison operator.
    pub op: FilterOp,
    /// The coerced comparison value.
    pub value: Value,
}

/// An AND-combined set of filter conditions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSet(Vec<Filter>);

impl FilterSet {
    /// Create an empty filter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a condition, builder-style.
    pub fn with(mut self, filter: Filter) -> Self {
        self.0.push(filter);
        self
    }

    /// Add a condition.
    pub fn push(&mut self, filter: Filter) {
        self.0.push(filter);
    }

    /// Build a filter set from `(key, value)` pairs in the suffix form.
    pub fn from_pairs<K, V, I>(pairs: I) -> AppResult<Self>
    where
        K: AsRef<str>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut set = Self::new();
        for (key, value) in pairs {
            set.push(Filter::parse(key.as_ref(), value)?);
        }
        Ok(set)
    }

    /// Validate every condition against a schema, coercing values.
    pub fn validate(&self, schema: &TableSchema) -> AppResult<Vec<CoercedFilter>> {
        self.0.iter().map(|f| f.validate(schema)).collect()
    }

    /// Iterate over the conditions.
    pub fn iter(&self) -> impl Iterator<Item = &Filter> {
        self.0.iter()
    }

    /// Number of conditions.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set has no conditions.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
