// src/handlers/record.rs

//! Users' attempts. Every handler here runs behind `auth_middleware` and only
//! ever sees the caller's own rows.

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use validator::Validate;

use crate::{
    error::AppError,
    handlers::ListParams,
    models::{
        Attempt, Record, SUBMITTED, SectionAttempt,
        record::{TestingRecord, WritingRecord},
        tables::{LISTENING_PARTS, READING_PARTS},
        testing::TestingSet,
    },
    scoring,
    store::{ColumnValue, RecordStore, Table},
    utils::jwt::Claims,
};

fn not_found(table: &Table, id: i64) -> AppError {
    AppError::NotFound(format!("No {} with id {}", table, id))
}

/// Loads an attempt, treating someone else's attempt as missing.
async fn owned_attempt<A: Attempt>(
    store: &RecordStore,
    id: i64,
    claims: &Claims,
) -> Result<A, AppError> {
    let table = A::TABLE;
    let attempt: A = store.fetch(&table, id).await?;
    if attempt.owner() != Some(claims.sub.as_str()) {
        return Err(not_found(&table, id));
    }
    Ok(attempt)
}

/// Checks the caller owns the stored attempt and carries its results over.
/// An id of zero is left to the store, which rejects it.
async fn resume_owned<A: Attempt>(
    store: &RecordStore,
    attempt: &mut A,
    claims: &Claims,
) -> Result<(), AppError> {
    if attempt.id() != 0 {
        let stored: A = owned_attempt(store, attempt.id(), claims).await?;
        attempt.resume(&stored);
    }
    Ok(())
}

/// Lists the caller's attempts.
pub async fn list<A: Attempt>(
    State(store): State<RecordStore>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, AppError> {
    let table = A::TABLE;
    let mut conditions = params.conditions(A::FILTERS);
    conditions.insert("user_id".to_string(), claims.sub.into());

    let (items, total) = store
        .paginated_query(&table, params.page(), &conditions)
        .await?;

    Ok(Json(json!({
        "items": items,
        "total": total,
    })))
}

pub async fn detail<A: Attempt>(
    State(store): State<RecordStore>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(owned_attempt::<A>(&store, id, &claims).await?))
}

/// Starts a new attempt for the caller.
pub async fn create<A: Attempt>(
    State(store): State<RecordStore>,
    Extension(claims): Extension<Claims>,
    Json(mut attempt): Json<A>,
) -> Result<impl IntoResponse, AppError> {
    attempt.validate()?;
    attempt.start(&claims.sub);

    let table = A::TABLE;
    let id = store.create(&table, &attempt).await?;
    tracing::info!("User {} started {} {}", claims.sub, table, id);

    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

/// Saves progress on an attempt: answers so far and time left. Status and
/// scores stay as stored.
pub async fn update<A: Attempt>(
    State(store): State<RecordStore>,
    Extension(claims): Extension<Claims>,
    Json(mut attempt): Json<A>,
) -> Result<impl IntoResponse, AppError> {
    attempt.validate()?;
    resume_owned(&store, &mut attempt, &claims).await?;

    store.update_record(&A::TABLE, &attempt).await?;
    Ok(Json(json!({ "id": attempt.id() })))
}

pub async fn delete<A: Attempt>(
    State(store): State<RecordStore>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let table = A::TABLE;
    owned_attempt::<A>(&store, id, &claims).await?;

    if store.delete_by_id(&table, id).await? == 0 {
        return Err(not_found(&table, id));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Submits a listening or reading attempt.
///
/// * Resolves the parts of the set in `test_id`.
/// * Scores the answers against them.
/// * Stores the band in `score` and the raw count in `correct_count`.
pub async fn submit_section<A: SectionAttempt>(
    State(store): State<RecordStore>,
    Extension(claims): Extension<Claims>,
    Json(mut attempt): Json<A>,
) -> Result<impl IntoResponse, AppError> {
    attempt.validate()?;
    resume_owned(&store, &mut attempt, &claims).await?;

    let sets = A::SETS;
    let set = store.get_by_id(&sets, attempt.test_id()).await?;
    let part_ids = set
        .get("part_list")
        .map(ColumnValue::id_list)
        .unwrap_or_default();
    let parts = store.get_by_ids_ordered(&A::PARTS, &part_ids).await?;

    let score = scoring::score(&parts, attempt.answers());
    attempt.record_score(score);

    store.update_record(&A::TABLE, &attempt).await?;
    tracing::info!(
        "User {} submitted {} {}: {} correct, band {}",
        claims.sub,
        A::TABLE,
        attempt.id(),
        score.raw,
        score.band
    );

    Ok(Json(json!({
        "id": attempt.id(),
        "score": score.band,
        "correct_count": score.raw,
    })))
}

/// Submits a full mock test.
///
/// Answers must be tagged with their section. Listening and reading are
/// scored separately and stored as `[listening band, reading band]`; writing
/// answers are kept for manual marking.
pub async fn submit_testing(
    State(store): State<RecordStore>,
    Extension(claims): Extension<Claims>,
    Json(mut attempt): Json<TestingRecord>,
) -> Result<impl IntoResponse, AppError> {
    attempt.validate()?;
    resume_owned(&store, &mut attempt, &claims).await?;

    let sections = scoring::split_sections(attempt.answers.clone())
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let set: TestingSet = store
        .fetch(&<TestingSet as Record>::TABLE, attempt.test_id)
        .await?;
    let listening_parts = store
        .get_by_ids_ordered(&LISTENING_PARTS, &set.listening_ids)
        .await?;
    let reading_parts = store
        .get_by_ids_ordered(&READING_PARTS, &set.reading_ids)
        .await?;

    let listening = scoring::score(&listening_parts, &sections.listening);
    let reading = scoring::score(&reading_parts, &sections.reading);

    attempt.score = vec![listening.band, reading.band];
    attempt.status = SUBMITTED;

    store
        .update_record(&<TestingRecord as Record>::TABLE, &attempt)
        .await?;
    tracing::info!(
        "User {} submitted testing record {}: listening {}, reading {}",
        claims.sub,
        attempt.id,
        listening.band,
        reading.band
    );

    Ok(Json(json!({
        "id": attempt.id,
        "score": attempt.score,
        "correct_count": [listening.raw, reading.raw],
    })))
}

/// Submits a writing attempt. Nothing is scored automatically.
pub async fn submit_writing(
    State(store): State<RecordStore>,
    Extension(claims): Extension<Claims>,
    Json(mut attempt): Json<WritingRecord>,
) -> Result<impl IntoResponse, AppError> {
    attempt.validate()?;
    resume_owned(&store, &mut attempt, &claims).await?;

    attempt.status = SUBMITTED;

    store
        .update_record(&<WritingRecord as Record>::TABLE, &attempt)
        .await?;
    Ok(Json(json!({ "id": attempt.id, "status": attempt.status })))
}
