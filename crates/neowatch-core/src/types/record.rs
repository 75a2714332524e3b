//! Write-side record data.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::value::Value;

/// An ordered column-name → value map used as write input for create,
/// update, and bulk upsert operations.
///
/// Ordering is deterministic (sorted by column name) so generated SQL is
/// stable for a given field set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordData {
    fields: BTreeMap<String, Value>,
}

impl RecordData {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, builder-style.
    pub fn set(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Set a field in place.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Get a field value.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Whether the record carries the named field.
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Iterate over `(name, value)` pairs in column-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for RecordData {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Self::new();
        for (k, v) in iter {
            record.insert(k, v);
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iteration_is_name_ordered() {
        let record = RecordData::new()
            .set("name", "Eros")
            .set("designation", "433");
        let names: Vec<_> = record.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["designation", "name"]);
    }

    #[test]
    fn later_set_wins() {
        let record = RecordData::new().set("name", "Eros").set("name", "Eros II");
        assert_eq!(record.get("name"), Some(&Value::Text("Eros II".into())));
        assert_eq!(record.len(), 1);
    }
}
