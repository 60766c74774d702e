// src/store/mod.rs

//! Table-agnostic CRUD over Postgres.
//!
//! Records are written through their serde mapping: every serialized field is
//! a column, nested structs and lists are stored as JSON text. Reads come back
//! as [`Row`]s whose declared JSON columns are already decoded.

pub mod query;
pub mod table;
pub mod value;

use std::collections::HashMap;

use rand::Rng;
use serde::{Serialize, de::DeserializeOwned};
use sqlx::PgPool;

use crate::error::{StoreError, StoreResult};

pub use query::{Conditions, Page};
pub use table::{ID_COLUMN, Table};
pub use value::{ColumnValue, RecordId, Row, into_record};

/// Generated ids are drawn from `1..RECORD_ID_SPACE`.
pub const RECORD_ID_SPACE: i64 = 1_000_000;

/// Fresh ids tried before an insert gives up on primary-key collisions.
pub const INSERT_ATTEMPTS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertMode {
    Create,
    Update,
}

#[derive(Clone)]
pub struct RecordStore {
    pool: PgPool,
}

fn query_failed(table: &Table, op: &'static str) -> impl FnOnce(sqlx::Error) -> StoreError {
    let name = table.name;
    move |e| {
        tracing::error!(table = name, "{} failed: {:?}", op, e);
        StoreError::Query(e)
    }
}

fn generate_id() -> i64 {
    rand::rng().random_range(1..RECORD_ID_SPACE)
}

fn is_id_collision(table: &Table, err: &sqlx::Error) -> bool {
    let pkey = format!("{}_pkey", table.name);
    err.as_database_error().is_some_and(|db| {
        db.is_unique_violation() && db.constraint().is_none_or(|c| c == pkey)
    })
}

/// Splits a record into `(column, value)` pairs following its serde mapping.
fn columns_of<R: Serialize>(record: &R) -> StoreResult<Vec<(String, ColumnValue)>> {
    let encoded = serde_json::to_value(record)
        .map_err(|e| StoreError::Validation(format!("record cannot be encoded: {}", e)))?;

    let serde_json::Value::Object(fields) = encoded else {
        return Err(StoreError::Validation(
            "record must encode to an object".to_string(),
        ));
    };

    Ok(fields
        .into_iter()
        .map(|(column, value)| {
            let value = match value {
                composite @ (serde_json::Value::Array(_) | serde_json::Value::Object(_)) => {
                    ColumnValue::Text(composite.to_string())
                }
                scalar => ColumnValue::from(scalar),
            };
            (column, value)
        })
        .collect())
}

impl RecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Lists rows matching every condition, one page at a time.
    /// Returns the page together with the total number of matches.
    pub async fn paginated_query(
        &self,
        table: &Table,
        page: Page,
        conditions: &Conditions,
    ) -> StoreResult<(Vec<Row>, i64)> {
        self.paginated_query_excluding(table, page, conditions, &Conditions::new())
            .await
    }

    /// [`paginated_query`](Self::paginated_query) that also skips rows whose
    /// column equals the value given for it in `exclusions`.
    pub async fn paginated_query_excluding(
        &self,
        table: &Table,
        page: Page,
        conditions: &Conditions,
        exclusions: &Conditions,
    ) -> StoreResult<(Vec<Row>, i64)> {
        let mut count = query::count(table, conditions, exclusions)?;
        let mut select = query::select_page(table, page, conditions, exclusions)?;

        let total: i64 = count
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(query_failed(table, "count"))?;

        let rows = select
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(query_failed(table, "paginated query"))?;

        let rows = rows
            .iter()
            .map(|row| value::decode_row(table, row))
            .collect::<Result<Vec<_>, _>>()?;

        Ok((rows, total))
    }

    pub async fn get_by_id(&self, table: &Table, id: impl Into<RecordId>) -> StoreResult<Row> {
        let id = id.into();
        let mut select = query::select_by_id(table, &id);

        let row = select
            .build()
            .fetch_optional(&self.pool)
            .await
            .map_err(query_failed(table, "get by id"))?
            .ok_or_else(|| StoreError::NotFound {
                table: table.name,
                id: id.to_string(),
            })?;

        Ok(value::decode_row(table, &row)?)
    }

    /// Loads a row and maps it onto `T`.
    pub async fn fetch<T: DeserializeOwned>(
        &self,
        table: &Table,
        id: impl Into<RecordId>,
    ) -> StoreResult<T> {
        into_record(self.get_by_id(table, id).await?)
    }

    /// Rows whose id is in `ids`, in whatever order the database returns them.
    /// An empty `ids` is a no-op.
    pub async fn get_by_ids(&self, table: &Table, ids: &[i64]) -> StoreResult<Vec<Row>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut select = query::select_by_ids(table, ids);
        let rows = select
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(query_failed(table, "get by ids"))?;

        rows.iter()
            .map(|row| value::decode_row(table, row).map_err(StoreError::from))
            .collect()
    }

    /// Like [`get_by_ids`](Self::get_by_ids) but follows the order of `ids`.
    /// Repeated ids repeat the row; ids with no row are skipped.
    pub async fn get_by_ids_ordered(&self, table: &Table, ids: &[i64]) -> StoreResult<Vec<Row>> {
        let rows = self.get_by_ids(table, ids).await?;
        let by_id: HashMap<i64, Row> = rows
            .into_iter()
            .filter_map(|row| {
                let id = row.get(ID_COLUMN).and_then(ColumnValue::as_i64)?;
                Some((id, row))
            })
            .collect();

        Ok(ids.iter().filter_map(|id| by_id.get(id).cloned()).collect())
    }

    /// Inserts or updates `record`.
    ///
    /// `Create` ignores any id on the record and returns the generated one.
    /// `Update` needs a non-empty id that already exists and returns `None`.
    pub async fn upsert<R: Serialize>(
        &self,
        table: &Table,
        record: &R,
        mode: UpsertMode,
    ) -> StoreResult<Option<i64>> {
        let columns = columns_of(record)?;
        match mode {
            UpsertMode::Create => self.insert(table, columns).await.map(Some),
            UpsertMode::Update => self.update(table, columns).await.map(|_| None),
        }
    }

    pub async fn create<R: Serialize>(&self, table: &Table, record: &R) -> StoreResult<i64> {
        self.insert(table, columns_of(record)?).await
    }

    pub async fn update_record<R: Serialize>(&self, table: &Table, record: &R) -> StoreResult<()> {
        self.update(table, columns_of(record)?).await
    }

    async fn insert(
        &self,
        table: &Table,
        mut columns: Vec<(String, ColumnValue)>,
    ) -> StoreResult<i64> {
        columns.retain(|(column, _)| column != ID_COLUMN);

        let mut last_err = None;
        for attempt in 1..=INSERT_ATTEMPTS {
            let id = generate_id();
            let mut insert = query::insert(table, id, &columns)?;

            match insert.build().execute(&self.pool).await {
                Ok(_) => return Ok(id),
                Err(e) if is_id_collision(table, &e) => {
                    tracing::warn!(
                        table = table.name,
                        "generated id {} already taken (attempt {}/{})",
                        id,
                        attempt,
                        INSERT_ATTEMPTS
                    );
                    last_err = Some(e);
                }
                Err(e) => return Err(query_failed(table, "insert")(e)),
            }
        }

        let err = last_err.unwrap_or(sqlx::Error::RowNotFound);
        Err(query_failed(table, "insert")(err))
    }

    async fn update(&self, table: &Table, mut columns: Vec<(String, ColumnValue)>) -> StoreResult<()> {
        let id_value = columns
            .iter()
            .position(|(column, _)| column == ID_COLUMN)
            .map(|idx| columns.remove(idx).1);
        let id = id_value
            .as_ref()
            .and_then(RecordId::from_column)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| StoreError::Validation("id cannot be empty".to_string()))?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(query_failed(table, "begin update"))?;

        let mut lock = query::lock_by_id(table, &id);
        let exists = lock
            .build()
            .fetch_optional(&mut *tx)
            .await
            .map_err(query_failed(table, "existence check"))?
            .is_some();

        if !exists {
            return Err(StoreError::NotFound {
                table: table.name,
                id: id.to_string(),
            });
        }

        if !columns.is_empty() {
            let mut update = query::update(table, &id, &columns)?;
            update
                .build()
                .execute(&mut *tx)
                .await
                .map_err(query_failed(table, "update"))?;
        }

        tx.commit().await.map_err(query_failed(table, "commit update"))?;
        Ok(())
    }

    /// Deletes by id and reports how many rows went. Zero is not an error.
    pub async fn delete_by_id(&self, table: &Table, id: impl Into<RecordId>) -> StoreResult<u64> {
        let id = id.into();
        let mut delete = query::delete(table, &id);
        let result = delete
            .build()
            .execute(&self.pool)
            .await
            .map_err(query_failed(table, "delete"))?;

        Ok(result.rows_affected())
    }
}
