//! Static table schema descriptors.
//!
//! Each persisted entity declares its table name, column set, and natural
//! conflict key as a `'static` descriptor. The generic repository validates
//! filters and write data against these descriptors instead of reflecting
//! over model metadata at query time.

use std::fmt;

/// Storage type of a column, used to validate filter operators and coerce
/// incoming values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    /// UTF-8 text.
    Text,
    /// 64-bit signed integer.
    Integer,
    /// 64-bit float.
    Float,
    /// Boolean.
    Boolean,
    /// UTC timestamp.
    Timestamp,
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Integer => write!(f, "integer"),
            Self::Float => write!(f, "float"),
            Self::Boolean => write!(f, "boolean"),
            Self::Timestamp => write!(f, "timestamp"),
        }
    }
}

/// One declared column of an entity table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    /// Column name as it appears in the table.
    pub name: &'static str,
    /// Storage type.
    pub kind: ColumnKind,
    /// Whether a value must be present on create.
    pub required: bool,
}

impl Column {
    /// Declare a required column.
    pub const fn required(name: &'static str, kind: ColumnKind) -> Self {
        Self {
            name,
            kind,
            required: true,
        }
    }

    /// Declare an optional (nullable) column.
    pub const fn optional(name: &'static str, kind: ColumnKind) -> Self {
        Self {
            name,
            kind,
            required: false,
        }
    }
}

/// Columns assigned by the store layer; callers may filter and order by
/// them but must never supply them on a write.
pub const STORE_MANAGED_COLUMNS: [&str; 3] = ["id", "created_at", "updated_at"];

/// Static schema descriptor for one entity table.
#[derive(Debug, Clone, Copy)]
pub struct TableSchema {
    /// Table name.
    pub table: &'static str,
    /// Declared columns, including the store-managed ones.
    pub columns: &'static [Column],
    /// Natural-identifier columns used by bulk upsert to match incoming
    /// records to existing rows.
    pub conflict_key: &'static [&'static str],
}

impl TableSchema {
    /// Look up a declared column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Whether the named column is declared.
    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Whether the named column is maintained by the store layer.
    pub fn is_store_managed(&self, name: &str) -> bool {
        STORE_MANAGED_COLUMNS.contains(&name)
    }

    /// Columns a caller must supply on create.
    pub fn required_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns
            .iter()
            .filter(|c| c.required && !STORE_MANAGED_COLUMNS.contains(&c.name))
    }
}

/// A persisted entity type bound to a static table schema.
///
/// Implementors are plain row structs decodable by sqlx; the surrogate key
/// is always a store-assigned `BIGSERIAL`.
pub trait Entity:
    for<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> + Send + Sync + Unpin + 'static
{
    /// The static schema descriptor for this entity's table.
    fn schema() -> &'static TableSchema;

    /// The surrogate key of this row.
    fn id(&self) -> i64;
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA: TableSchema = TableSchema {
        table: "probes",
        columns: &[
            Column::required("id", ColumnKind::Integer),
            Column::required("designation", ColumnKind::Text),
            Column::optional("mass_kg", ColumnKind::Float),
            Column::required("created_at", ColumnKind::Timestamp),
            Column::required("updated_at", ColumnKind::Timestamp),
        ],
        conflict_key: &["designation"],
    };

    #[test]
    fn column_lookup() {
        assert!(SCHEMA.has_column("mass_kg"));
        assert!(!SCHEMA.has_column("velocity"));
        assert_eq!(
            SCHEMA.column("designation").map(|c| c.kind),
            Some(ColumnKind::Text)
        );
    }

    #[test]
    fn required_columns_exclude_store_managed() {
        let required: Vec<_> = SCHEMA.required_columns().map(|c| c.name).collect();
        assert_eq!(required, vec!["designation"]);
    }
}
