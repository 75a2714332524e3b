//! Schema-generic repository.
//!
//! One implementation serves every entity type: operations are
//! parameterized by the entity's static [`TableSchema`] and run against the
//! transaction owned by the enclosing [`UnitOfWork`](crate::uow::UnitOfWork).
//! Nothing here commits — durability always comes from the scope's commit.
//!
//! Dynamic SQL goes through `sqlx::QueryBuilder`; column and table names
//! spliced into the text are always the `'static` names from a schema
//! descriptor, never caller input, and every value is a bound parameter.

use std::marker::PhantomData;

use sqlx::{Connection, PgConnection, Postgres, QueryBuilder};

use neowatch_core::error::AppError;
use neowatch_core::result::AppResult;
use neowatch_core::types::{
    CoercedFilter, ColumnKind, Entity, FilterOp, FilterSet, RecordData, TableSchema, Value,
};

/// How bulk upsert treats an incoming record whose conflict key matches an
/// existing row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConflictAction {
    /// Merge incoming non-null fields over the existing row.
    #[default]
    Update,
    /// Leave the existing row untouched.
    Skip,
}

/// A validated write row: schema column names paired with coerced values.
type ValidRow = Vec<(&'static str, Value)>;

/// Generic repository over one entity type, bound to one transaction.
///
/// Handles are cheap views over the scope's connection; all state lives in
/// the shared transaction, so every handle created from the same scope
/// observes the same uncommitted writes. Not safe to share across
/// concurrent callers — each scope has exactly one logical caller.
pub struct Repository<'t, E: Entity> {
    conn: &'t mut PgConnection,
    _entity: PhantomData<E>,
}

impl<'t, E: Entity> Repository<'t, E> {
    pub(crate) fn new(conn: &'t mut PgConnection) -> Self {
        Self {
            conn,
            _entity: PhantomData,
        }
    }

    /// The schema this repository operates on.
    pub fn schema() -> &'static TableSchema {
        E::schema()
    }

    /// Insert one record and return the stored row.
    ///
    /// `created_at`/`updated_at` are assigned by the store layer; supplying
    /// them (or `id`) is a validation error, as is any unknown column or a
    /// missing required column.
    pub async fn create(&mut self, data: &RecordData) -> AppResult<E> {
        let schema = E::schema();
        let row = validate_write(schema, data, WriteMode::Create)?;

        let mut qb = insert_statement(schema, &row);
        qb.push(" RETURNING *");
        let entity = qb
            .build_query_as::<E>()
            .fetch_one(&mut *self.conn)
            .await?;

        tracing::debug!(table = schema.table, id = entity.id(), "Created record");
        Ok(entity)
    }

    /// Fetch one record by surrogate key. Absence is a normal outcome.
    pub async fn get_by_id(&mut self, id: i64) -> AppResult<Option<E>> {
        let schema = E::schema();
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM ");
        qb.push(schema.table);
        qb.push(" WHERE id = ");
        qb.push_bind(id);

        Ok(qb
            .build_query_as::<E>()
            .fetch_optional(&mut *self.conn)
            .await?)
    }

    /// List records in insertion (id) order with pagination.
    pub async fn get_all(&mut self, skip: i64, limit: Option<i64>) -> AppResult<Vec<E>> {
        let schema = E::schema();
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM ");
        qb.push(schema.table);
        qb.push(" ORDER BY id");
        push_pagination(&mut qb, skip, limit);

        Ok(qb.build_query_as::<E>().fetch_all(&mut *self.conn).await?)
    }

    /// List records matching all conditions of a filter specification.
    ///
    /// Results come back in `order_by` order when given (descending with
    /// `order_desc`), id order otherwise.
    pub async fn filter(
        &mut self,
        filters: &FilterSet,
        skip: i64,
        limit: Option<i64>,
        order_by: Option<&str>,
        order_desc: bool,
    ) -> AppResult<Vec<E>> {
        let schema = E::schema();
        let conditions = filters.validate(schema)?;
        let order_column = match order_by {
            Some(name) => Some(
                schema
                    .column(name)
                    .map(|c| c.name)
                    .ok_or_else(|| {
                        AppError::invalid_filter(format!(
                            "unknown order field '{name}' for table '{}'",
                            schema.table
                        ))
                    })?,
            ),
            None => None,
        };

        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM ");
        qb.push(schema.table);
        push_conditions(&mut qb, &conditions);
        push_order(&mut qb, order_column, order_desc);
        push_pagination(&mut qb, skip, limit);

        Ok(qb.build_query_as::<E>().fetch_all(&mut *self.conn).await?)
    }

    /// Case-insensitive substring search across the given text fields,
    /// OR-combined. A non-text field in the list is a filter error.
    pub async fn search(
        &mut self,
        term: &str,
        fields: &[&str],
        skip: i64,
        limit: Option<i64>,
    ) -> AppResult<Vec<E>> {
        let schema = E::schema();
        if fields.is_empty() {
            return Ok(Vec::new());
        }

        let mut columns = Vec::with_capacity(fields.len());
        for field in fields {
            let column = schema.column(field).ok_or_else(|| {
                AppError::invalid_filter(format!(
                    "unknown search field '{field}' for table '{}'",
                    schema.table
                ))
            })?;
            if column.kind != ColumnKind::Text {
                return Err(AppError::invalid_filter(format!(
                    "search field '{}' is {}, not text",
                    column.name, column.kind
                )));
            }
            columns.push(column.name);
        }

        let pattern = format!("%{term}%");
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM ");
        qb.push(schema.table);
        qb.push(" WHERE (");
        for (i, name) in columns.iter().enumerate() {
            if i > 0 {
                qb.push(" OR ");
            }
            qb.push(*name);
            qb.push(" ILIKE ");
            qb.push_bind(pattern.clone());
        }
        qb.push(") ORDER BY id");
        push_pagination(&mut qb, skip, limit);

        Ok(qb.build_query_as::<E>().fetch_all(&mut *self.conn).await?)
    }

    /// Apply a partial update to one record. Returns the updated row, or
    /// `None` if the id is unknown.
    pub async fn update(&mut self, id: i64, data: &RecordData) -> AppResult<Option<E>> {
        let schema = E::schema();
        let row = validate_write(schema, data, WriteMode::Patch)?;
        if row.is_empty() {
            return self.get_by_id(id).await;
        }

        let mut qb = QueryBuilder::<Postgres>::new("UPDATE ");
        qb.push(schema.table);
        qb.push(" SET ");
        for (i, (name, value)) in row.iter().enumerate() {
            if i > 0 {
                qb.push(", ");
            }
            qb.push(*name);
            qb.push(" = ");
            push_scalar(&mut qb, value);
        }
        qb.push(", updated_at = now() WHERE id = ");
        qb.push_bind(id);
        qb.push(" RETURNING *");

        Ok(qb
            .build_query_as::<E>()
            .fetch_optional(&mut *self.conn)
            .await?)
    }

    /// Delete one record by id. Returns whether a row was removed.
    pub async fn delete(&mut self, id: i64) -> AppResult<bool> {
        let schema = E::schema();
        let mut qb = QueryBuilder::<Postgres>::new("DELETE FROM ");
        qb.push(schema.table);
        qb.push(" WHERE id = ");
        qb.push_bind(id);

        let result = qb.build().execute(&mut *self.conn).await?;
        Ok(result.rows_affected() > 0)
    }

    /// Total row count, ignoring pagination.
    pub async fn count(&mut self) -> AppResult<i64> {
        let schema = E::schema();
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM ");
        qb.push(schema.table);

        Ok(qb
            .build_query_scalar::<i64>()
            .fetch_one(&mut *self.conn)
            .await?)
    }

    /// Bulk create-or-update against a conflict key.
    ///
    /// The whole batch is validated before anything touches the store, then
    /// applied inside a savepoint on the owning transaction: a mid-batch
    /// failure (validation or an ambiguous conflict key) leaves nothing
    /// staged. Duplicate conflict-key values within the batch collapse
    /// last-write-wins before reconciliation. Returns
    /// `(created_count, updated_count)`.
    pub async fn bulk_create(
        &mut self,
        batch: &[RecordData],
        action: ConflictAction,
        conflict_key: Option<&[&str]>,
    ) -> AppResult<(u64, u64)> {
        let schema = E::schema();
        if batch.is_empty() {
            return Ok((0, 0));
        }

        let key_columns = resolve_conflict_key(schema, conflict_key)?;

        let mut rows = Vec::with_capacity(batch.len());
        for data in batch {
            let row = validate_write(schema, data, WriteMode::Create)?;
            for key in &key_columns {
                match row.iter().find(|(name, _)| name == key) {
                    Some((_, value)) if !value.is_null() => {}
                    _ => {
                        return Err(AppError::validation(format!(
                            "bulk upsert row is missing conflict key field '{key}'"
                        )))
                    }
                }
            }
            rows.push(row);
        }
        let rows = dedupe_last_write_wins(rows, &key_columns);

        let mut savepoint = self.conn.begin().await?;
        let result = apply_upsert_batch(&mut savepoint, schema, &rows, action, &key_columns).await;
        match result {
            Ok(counts) => {
                savepoint.commit().await?;
                tracing::debug!(
                    table = schema.table,
                    created = counts.0,
                    updated = counts.1,
                    "Bulk upsert applied"
                );
                Ok(counts)
            }
            Err(err) => {
                savepoint.rollback().await?;
                Err(err)
            }
        }
    }

    /// Delete every record matching a filter specification. Returns the
    /// number of rows removed.
    pub async fn bulk_delete(&mut self, filters: &FilterSet) -> AppResult<u64> {
        let schema = E::schema();
        let conditions = filters.validate(schema)?;

        let mut qb = QueryBuilder::<Postgres>::new("DELETE FROM ");
        qb.push(schema.table);
        push_conditions(&mut qb, &conditions);

        let result = qb.build().execute(&mut *self.conn).await?;
        tracing::debug!(
            table = schema.table,
            deleted = result.rows_affected(),
            "Bulk delete applied"
        );
        Ok(result.rows_affected())
    }
}

/// Reconcile a deduplicated batch against the store, one record at a time,
/// on the given savepoint.
async fn apply_upsert_batch(
    savepoint: &mut sqlx::Transaction<'_, Postgres>,
    schema: &'static TableSchema,
    rows: &[ValidRow],
    action: ConflictAction,
    key_columns: &[&'static str],
) -> AppResult<(u64, u64)> {
    let mut created = 0u64;
    let mut updated = 0u64;

    for row in rows {
        let key_values: Vec<&Value> = key_columns
            .iter()
            .filter_map(|key| {
                row.iter()
                    .find(|(name, _)| name == key)
                    .map(|(_, value)| value)
            })
            .collect();

        let mut lookup = QueryBuilder::<Postgres>::new("SELECT id FROM ");
        lookup.push(schema.table);
        for (i, (key, value)) in key_columns.iter().zip(&key_values).enumerate() {
            lookup.push(if i == 0 { " WHERE " } else { " AND " });
            lookup.push(*key);
            lookup.push(" = ");
            push_scalar(&mut lookup, value);
        }
        lookup.push(" LIMIT 2");
        let existing: Vec<i64> = lookup
            .build_query_scalar::<i64>()
            .fetch_all(&mut **savepoint)
            .await?;

        match existing.len() {
            0 => {
                let mut qb = insert_statement(schema, row);
                qb.build().execute(&mut **savepoint).await?;
                created += 1;
            }
            1 => {
                if action == ConflictAction::Skip {
                    continue;
                }
                let merge: Vec<&(&'static str, Value)> = row
                    .iter()
                    .filter(|(name, value)| !key_columns.contains(name) && !value.is_null())
                    .collect();

                let mut qb = QueryBuilder::<Postgres>::new("UPDATE ");
                qb.push(schema.table);
                qb.push(" SET ");
                for (name, value) in merge.iter().map(|(n, v)| (n, v)) {
                    qb.push(*name);
                    qb.push(" = ");
                    push_scalar(&mut qb, value);
                    qb.push(", ");
                }
                qb.push("updated_at = now() WHERE id = ");
                qb.push_bind(existing[0]);
                qb.build().execute(&mut **savepoint).await?;
                updated += 1;
            }
            _ => {
                return Err(AppError::conflict_ambiguity(format!(
                    "conflict key ({}) matches multiple rows in '{}'",
                    key_columns.join(", "),
                    schema.table
                )));
            }
        }
    }

    Ok((created, updated))
}

/// What a write validation allows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriteMode {
    /// All required columns must be present and non-null.
    Create,
    /// Partial data; required columns may be absent but not null.
    Patch,
}

/// Validate write data against a schema: reject unknown and store-managed
/// columns, coerce values, and enforce required-column presence.
fn validate_write(
    schema: &'static TableSchema,
    data: &RecordData,
    mode: WriteMode,
) -> AppResult<ValidRow> {
    let mut row: ValidRow = Vec::with_capacity(data.len());

    for (name, value) in data.iter() {
        let column = schema.column(name).ok_or_else(|| {
            AppError::validation(format!(
                "unknown column '{name}' for table '{}'",
                schema.table
            ))
        })?;
        if schema.is_store_managed(name) {
            return Err(AppError::validation(format!(
                "column '{name}' is maintained by the store and cannot be written"
            )));
        }
        if column.required && value.is_null() {
            return Err(AppError::validation(format!(
                "required column '{name}' cannot be null"
            )));
        }
        let coerced = value
            .coerce_to(column.kind)
            .map_err(|reason| AppError::validation(format!("bad value for '{name}': {reason}")))?;
        row.push((column.name, coerced));
    }

    if mode == WriteMode::Create {
        for column in schema.required_columns() {
            if !data.contains(column.name) {
                return Err(AppError::validation(format!(
                    "missing required column '{}' for table '{}'",
                    column.name, schema.table
                )));
            }
        }
    }

    Ok(row)
}

/// Resolve and validate the conflict key, defaulting to the schema's.
fn resolve_conflict_key(
    schema: &'static TableSchema,
    requested: Option<&[&str]>,
) -> AppResult<Vec<&'static str>> {
    let names: Vec<&str> = match requested {
        Some(names) => names.to_vec(),
        None => schema.conflict_key.to_vec(),
    };
    if names.is_empty() {
        return Err(AppError::validation(format!(
            "no conflict key declared for table '{}'",
            schema.table
        )));
    }
    names
        .iter()
        .map(|name| {
            schema
                .column(name)
                .map(|c| c.name)
                .ok_or_else(|| {
                    AppError::validation(format!(
                        "conflict key field '{name}' is not a column of '{}'",
                        schema.table
                    ))
                })
        })
        .collect()
}

/// Collapse duplicate conflict-key values within one batch; the last
/// occurrence wins, keeping the position of the first.
fn dedupe_last_write_wins(rows: Vec<ValidRow>, key_columns: &[&'static str]) -> Vec<ValidRow> {
    let mut tokens: Vec<String> = Vec::new();
    let mut out: Vec<ValidRow> = Vec::new();

    for row in rows {
        let token = key_columns
            .iter()
            .map(|key| {
                row.iter()
                    .find(|(name, _)| name == key)
                    .map(|(_, value)| format!("{value:?}"))
                    .unwrap_or_default()
            })
            .collect::<Vec<_>>()
            .join("\u{1f}");
        match tokens.iter().position(|t| *t == token) {
            Some(i) => out[i] = row,
            None => {
                tokens.push(token);
                out.push(row);
            }
        }
    }

    out
}

/// Build `INSERT INTO t (cols..., created_at, updated_at) VALUES (..., now(), now())`.
fn insert_statement<'args>(
    schema: &'static TableSchema,
    row: &ValidRow,
) -> QueryBuilder<'args, Postgres> {
    let mut qb = QueryBuilder::<Postgres>::new("INSERT INTO ");
    qb.push(schema.table);
    qb.push(" (");
    for (name, _) in row {
        qb.push(*name);
        qb.push(", ");
    }
    qb.push("created_at, updated_at) VALUES (");
    for (_, value) in row {
        push_scalar(&mut qb, value);
        qb.push(", ");
    }
    qb.push("now(), now())");
    qb
}

/// Append validated filter conditions as a `WHERE` clause.
fn push_conditions<'args>(qb: &mut QueryBuilder<'args, Postgres>, conditions: &[CoercedFilter]) {
    for (i, condition) in conditions.iter().enumerate() {
        qb.push(if i == 0 { " WHERE " } else { " AND " });
        push_condition(qb, condition);
    }
}

fn push_condition<'args>(qb: &mut QueryBuilder<'args, Postgres>, condition: &CoercedFilter) {
    qb.push(condition.field);
    match (&condition.op, &condition.value) {
        (FilterOp::Eq, Value::Null) => {
            qb.push(" IS NULL");
        }
        (FilterOp::Ne, Value::Null) => {
            qb.push(" IS NOT NULL");
        }
        (FilterOp::In, Value::List(items)) => {
            qb.push(" = ANY(");
            push_list(qb, condition.kind, items);
            qb.push(")");
        }
        (FilterOp::Contains, Value::Text(term)) => {
            qb.push(" ILIKE ");
            qb.push_bind(format!("%{term}%"));
        }
        (op, value) => {
            qb.push(match op {
                FilterOp::Eq => " = ",
                FilterOp::Ne => " <> ",
                FilterOp::Gt => " > ",
                FilterOp::Gte => " >= ",
                FilterOp::Lt => " < ",
                FilterOp::Lte => " <= ",
                // Handled by the arms above; coercion rejects other shapes.
                FilterOp::In | FilterOp::Contains => " = ",
            });
            push_scalar(qb, value);
        }
    }
}

/// Bind one scalar value. `Null` renders as the SQL literal.
fn push_scalar<'args>(qb: &mut QueryBuilder<'args, Postgres>, value: &Value) {
    match value {
        Value::Text(s) => {
            qb.push_bind(s.clone());
        }
        Value::Integer(i) => {
            qb.push_bind(*i);
        }
        Value::Float(f) => {
            qb.push_bind(*f);
        }
        Value::Boolean(b) => {
            qb.push_bind(*b);
        }
        Value::Timestamp(t) => {
            qb.push_bind(*t);
        }
        Value::Null | Value::List(_) => {
            qb.push("NULL");
        }
    }
}

/// Bind a homogeneous list as a typed array parameter.
fn push_list<'args>(qb: &mut QueryBuilder<'args, Postgres>, kind: ColumnKind, items: &[Value]) {
    match kind {
        ColumnKind::Text => {
            let values: Vec<String> = items
                .iter()
                .filter_map(|v| match v {
                    Value::Text(s) => Some(s.clone()),
                    _ => None,
                })
                .collect();
            qb.push_bind(values);
        }
        ColumnKind::Integer => {
            let values: Vec<i64> = items
                .iter()
                .filter_map(|v| match v {
                    Value::Integer(i) => Some(*i),
                    _ => None,
                })
                .collect();
            qb.push_bind(values);
        }
        ColumnKind::Float => {
            let values: Vec<f64> = items
                .iter()
                .filter_map(|v| match v {
                    Value::Float(f) => Some(*f),
                    _ => None,
                })
                .collect();
            qb.push_bind(values);
        }
        ColumnKind::Boolean => {
            let values: Vec<bool> = items
                .iter()
                .filter_map(|v| match v {
                    Value::Boolean(b) => Some(*b),
                    _ => None,
                })
                .collect();
            qb.push_bind(values);
        }
        ColumnKind::Timestamp => {
            let values: Vec<chrono::DateTime<chrono::Utc>> = items
                .iter()
                .filter_map(|v| match v {
                    Value::Timestamp(t) => Some(*t),
                    _ => None,
                })
                .collect();
            qb.push_bind(values);
        }
    }
}

/// Append the `ORDER BY` clause. A caller-chosen column always gets `id`
/// as a tie-breaker so pages stay stable when order-key values repeat.
fn push_order<'args>(
    qb: &mut QueryBuilder<'args, Postgres>,
    order_column: Option<&'static str>,
    order_desc: bool,
) {
    qb.push(" ORDER BY ");
    match order_column {
        Some(column) => {
            qb.push(column);
            if order_desc {
                qb.push(" DESC");
            }
            qb.push(", id");
        }
        None => {
            qb.push("id");
        }
    }
}

/// Append `OFFSET`/`LIMIT`. A `None` limit means unbounded.
fn push_pagination<'args>(qb: &mut QueryBuilder<'args, Postgres>, skip: i64, limit: Option<i64>) {
    if let Some(limit) = limit {
        qb.push(" LIMIT ");
        qb.push_bind(limit.max(0));
    }
    if skip > 0 {
        qb.push(" OFFSET ");
        qb.push_bind(skip);
    }
}
