// src/store/query.rs
//
// SQL construction for the record store. Table names come from `Table`
// constants; column names are validated and quoted before they reach SQL.

use std::collections::BTreeMap;

use sqlx::{Postgres, QueryBuilder};

use super::{
    table::{ID_COLUMN, Table},
    value::{ColumnValue, RecordId},
};
use crate::error::{StoreError, StoreResult};

/// Exact-match filters, ANDed together.
pub type Conditions = BTreeMap<String, ColumnValue>;

/// Page request. `page_no` is 1-based; a `page_limit` of zero or less
/// returns every matching row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page_no: i64,
    pub page_limit: i64,
}

impl Page {
    pub fn new(page_no: i64, page_limit: i64) -> Self {
        Self {
            page_no,
            page_limit,
        }
    }

    pub fn all() -> Self {
        Self::new(1, -1)
    }

    /// `(limit, offset)` for a bounded page, `None` when unbounded.
    pub fn bounds(&self) -> StoreResult<Option<(i64, i64)>> {
        if self.page_limit <= 0 {
            return Ok(None);
        }
        if self.page_no < 1 {
            return Err(StoreError::InvalidArgument(format!(
                "pageNo must be at least 1, got {}",
                self.page_no
            )));
        }
        let offset = (self.page_no - 1)
            .checked_mul(self.page_limit)
            .ok_or_else(|| StoreError::InvalidArgument("page offset overflows".to_string()))?;
        Ok(Some((self.page_limit, offset)))
    }
}

pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn quoted(column: &str) -> StoreResult<String> {
    if !is_identifier(column) {
        return Err(StoreError::InvalidArgument(format!(
            "invalid column name {:?}",
            column
        )));
    }
    Ok(format!("\"{}\"", column))
}

/// Pushes a value as a bind parameter. Null goes in as a literal so it never
/// carries a parameter type that clashes with the column.
pub fn push_value(builder: &mut QueryBuilder<'static, Postgres>, value: &ColumnValue) {
    match value {
        ColumnValue::Null => {
            builder.push("NULL");
        }
        ColumnValue::Bool(b) => {
            builder.push_bind(*b);
        }
        ColumnValue::Int(i) => {
            builder.push_bind(*i);
        }
        ColumnValue::Float(f) => {
            builder.push_bind(*f);
        }
        ColumnValue::Text(s) => {
            builder.push_bind(s.clone());
        }
        composite @ (ColumnValue::List(_) | ColumnValue::Object(_)) => {
            builder.push_bind(composite.to_json().to_string());
        }
    }
}

fn push_id(builder: &mut QueryBuilder<'static, Postgres>, id: &RecordId) {
    match id {
        RecordId::Int(i) => {
            builder.push_bind(*i);
        }
        RecordId::Text(s) => {
            builder.push_bind(s.clone());
        }
    }
}

/// `exclusions` drop rows whose column holds the given value. Rows where
/// that column is NULL are kept unless the excluded value is NULL itself.
fn push_conditions(
    builder: &mut QueryBuilder<'static, Postgres>,
    conditions: &Conditions,
    exclusions: &Conditions,
) -> StoreResult<()> {
    builder.push(" WHERE 1=1");
    for (column, value) in conditions {
        builder.push(" AND ");
        builder.push(quoted(column)?);
        if value.is_null() {
            builder.push(" IS NULL");
        } else {
            builder.push(" = ");
            push_value(builder, value);
        }
    }
    for (column, value) in exclusions {
        builder.push(" AND ");
        builder.push(quoted(column)?);
        if value.is_null() {
            builder.push(" IS NOT NULL");
        } else {
            builder.push(" IS DISTINCT FROM ");
            push_value(builder, value);
        }
    }
    Ok(())
}

pub fn count(
    table: &Table,
    conditions: &Conditions,
    exclusions: &Conditions,
) -> StoreResult<QueryBuilder<'static, Postgres>> {
    let mut builder = QueryBuilder::new(format!("SELECT COUNT(*) FROM {}", table.name));
    push_conditions(&mut builder, conditions, exclusions)?;
    Ok(builder)
}

pub fn select_page(
    table: &Table,
    page: Page,
    conditions: &Conditions,
    exclusions: &Conditions,
) -> StoreResult<QueryBuilder<'static, Postgres>> {
    let mut builder = QueryBuilder::new(format!("SELECT * FROM {}", table.name));
    push_conditions(&mut builder, conditions, exclusions)?;
    builder.push(" ORDER BY id");
    if let Some((limit, offset)) = page.bounds()? {
        builder.push(" LIMIT ");
        builder.push_bind(limit);
        builder.push(" OFFSET ");
        builder.push_bind(offset);
    }
    Ok(builder)
}

pub fn select_by_id(table: &Table, id: &RecordId) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(format!("SELECT * FROM {} WHERE id = ", table.name));
    push_id(&mut builder, id);
    builder
}

/// Locks the row until the surrounding transaction ends.
pub fn lock_by_id(table: &Table, id: &RecordId) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(format!("SELECT id FROM {} WHERE id = ", table.name));
    push_id(&mut builder, id);
    builder.push(" FOR UPDATE");
    builder
}

pub fn select_by_ids(table: &Table, ids: &[i64]) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(format!("SELECT * FROM {} WHERE id IN (", table.name));
    let mut separated = builder.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(")");
    builder
}

pub fn insert(
    table: &Table,
    id: i64,
    columns: &[(String, ColumnValue)],
) -> StoreResult<QueryBuilder<'static, Postgres>> {
    let mut names = vec![quoted(ID_COLUMN)?];
    for (column, _) in columns {
        names.push(quoted(column)?);
    }

    let mut builder = QueryBuilder::new(format!(
        "INSERT INTO {} ({}) VALUES (",
        table.name,
        names.join(", ")
    ));
    builder.push_bind(id);
    for (_, value) in columns {
        builder.push(", ");
        push_value(&mut builder, value);
    }
    builder.push(")");
    Ok(builder)
}

pub fn update(
    table: &Table,
    id: &RecordId,
    columns: &[(String, ColumnValue)],
) -> StoreResult<QueryBuilder<'static, Postgres>> {
    let mut builder = QueryBuilder::new(format!("UPDATE {} SET ", table.name));
    for (i, (column, value)) in columns.iter().enumerate() {
        if i > 0 {
            builder.push(", ");
        }
        builder.push(quoted(column)?);
        builder.push(" = ");
        push_value(&mut builder, value);
    }
    builder.push(" WHERE id = ");
    push_id(&mut builder, id);
    Ok(builder)
}

pub fn delete(table: &Table, id: &RecordId) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(format!("DELETE FROM {} WHERE id = ", table.name));
    push_id(&mut builder, id);
    builder
}
