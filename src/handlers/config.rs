// src/handlers/config.rs

//! Test content: listening, reading, writing and full-test sets and their
//! parts. One generic set of handlers serves every `Content` type.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;

use crate::{
    error::AppError,
    handlers::ListParams,
    models::{Content, USER_OWNED},
    store::{ColumnValue, Conditions, RecordStore, Row, Table},
    utils::jwt::{Claims, MaybeClaims},
};

fn login_required() -> AppError {
    AppError::AuthError("Login required for user content".to_string())
}

/// Replaces every part-id column of a set with the part rows, in id order.
async fn expand<C: Content>(store: &RecordStore, mut row: Row) -> Result<Row, AppError> {
    for part_ref in C::PART_REFS {
        let ids = row
            .get(part_ref.ids_column)
            .map(ColumnValue::id_list)
            .unwrap_or_default();

        let parts = store.get_by_ids_ordered(&part_ref.table, &ids).await?;
        row.insert(
            part_ref.expand_as.to_string(),
            ColumnValue::List(parts.into_iter().map(ColumnValue::Object).collect()),
        );
    }
    Ok(row)
}

/// Loads an item. User content is only visible to its owner; anyone else
/// is told it does not exist.
async fn owned_content(
    store: &RecordStore,
    table: &Table,
    id: i64,
    claims: Option<&Claims>,
) -> Result<Row, AppError> {
    let row = store.get_by_id(table, id).await?;
    let user_owned = row.get("type").and_then(ColumnValue::as_i64) == Some(USER_OWNED.into());
    if !user_owned {
        return Ok(row);
    }

    let claims = claims.ok_or_else(login_required)?;
    let owner = row.get("user_id").and_then(ColumnValue::as_str);
    if owner != Some(claims.sub.as_str()) {
        return Err(AppError::NotFound(format!("No {} with id {}", table, id)));
    }
    Ok(row)
}

fn stamp_owner<C: Content>(item: &mut C, claims: Option<&Claims>) -> Result<(), AppError> {
    if item.source_type() == USER_OWNED {
        let claims = claims.ok_or_else(login_required)?;
        item.set_owner(claims.sub.clone());
    }
    Ok(())
}

/// Lists content, with sets' parts resolved.
///
/// `type=3` lists the caller's own content and needs a token. Without a
/// `type` filter user content is left out.
pub async fn list<C: Content>(
    State(store): State<RecordStore>,
    MaybeClaims(claims): MaybeClaims,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, AppError> {
    let table = C::TABLE;
    let mut conditions = params.conditions(C::FILTERS);
    let mut exclusions = Conditions::new();

    match params.source_type {
        Some(USER_OWNED) => {
            let claims = claims.ok_or_else(login_required)?;
            conditions.insert("user_id".to_string(), claims.sub.into());
        }
        Some(_) => {}
        None => {
            exclusions.insert("type".to_string(), USER_OWNED.into());
        }
    }

    let (rows, total) = store
        .paginated_query_excluding(&table, params.page(), &conditions, &exclusions)
        .await?;

    let mut items = Vec::with_capacity(rows.len());
    for row in rows {
        items.push(expand::<C>(&store, row).await?);
    }

    Ok(Json(json!({
        "items": items,
        "total": total,
    })))
}

/// Returns a single item, with its parts resolved.
pub async fn detail<C: Content>(
    State(store): State<RecordStore>,
    MaybeClaims(claims): MaybeClaims,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let table = C::TABLE;
    let row = owned_content(&store, &table, id, claims.as_ref()).await?;
    Ok(Json(expand::<C>(&store, row).await?))
}

/// Creates an item and returns its generated id.
pub async fn create<C: Content>(
    State(store): State<RecordStore>,
    MaybeClaims(claims): MaybeClaims,
    Json(mut item): Json<C>,
) -> Result<impl IntoResponse, AppError> {
    item.validate()?;
    stamp_owner(&mut item, claims.as_ref())?;

    let table = C::TABLE;
    let id = store.create(&table, &item).await?;
    tracing::info!("Created {} {}", table, id);

    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

/// Replaces an existing item. The body carries the id.
pub async fn update<C: Content>(
    State(store): State<RecordStore>,
    MaybeClaims(claims): MaybeClaims,
    Json(mut item): Json<C>,
) -> Result<impl IntoResponse, AppError> {
    item.validate()?;

    let table = C::TABLE;
    if item.id() != 0 {
        owned_content(&store, &table, item.id(), claims.as_ref()).await?;
    }
    stamp_owner(&mut item, claims.as_ref())?;

    store.update_record(&table, &item).await?;
    Ok(Json(json!({ "id": item.id() })))
}

/// Deletes an item. 404 when nothing was deleted.
pub async fn delete<C: Content>(
    State(store): State<RecordStore>,
    MaybeClaims(claims): MaybeClaims,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let table = C::TABLE;
    owned_content(&store, &table, id, claims.as_ref()).await?;

    let deleted = store.delete_by_id(&table, id).await?;
    if deleted == 0 {
        return Err(AppError::NotFound(format!("No {} with id {}", table, id)));
    }

    tracing::info!("Deleted {} {}", table, id);
    Ok(StatusCode::NO_CONTENT)
}
