// src/handlers/auth.rs

use std::{sync::Arc, time::Duration};

use axum::{Extension, Json, extract::State, response::IntoResponse};
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    models::{
        tables::USERS,
        user::{LoginRequest, SendCodeRequest, User},
    },
    store::RecordStore,
    utils::{
        code::{CodeStore, generate_code},
        jwt::{Claims, sign_jwt},
        mail::Mailer,
    },
};

/// Emails a one-time login code.
///
/// A new request replaces any code issued earlier for the same address.
pub async fn send_code(
    State(config): State<Config>,
    State(codes): State<Arc<dyn CodeStore>>,
    State(mailer): State<Arc<dyn Mailer>>,
    Json(payload): Json<SendCodeRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let code = generate_code();
    codes
        .put(&payload.email, &code, Duration::from_secs(config.code_ttl))
        .await;
    mailer.send_code(&payload.email, &code).await?;

    Ok(Json(json!({ "expires_in": config.code_ttl })))
}

/// Logs in with an emailed code.
///
/// First-time addresses get a new account. Returns a signed session token
/// and the user.
pub async fn login(
    State(pool): State<PgPool>,
    State(config): State<Config>,
    State(codes): State<Arc<dyn CodeStore>>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    if !codes.take(&payload.email, &payload.code).await {
        return Err(AppError::AuthError(
            "Invalid verification code".to_string(),
        ));
    }

    let email = payload.email.trim().to_lowercase();
    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO user_list (id, email, role_id)
        VALUES ($1, $2, 0)
        ON CONFLICT (email) DO UPDATE SET email = EXCLUDED.email
        RETURNING id, email, role_id, created_at
        "#,
    )
    .bind(uuid::Uuid::new_v4().to_string())
    .bind(&email)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to find or create user {}: {:?}", email, e);
        AppError::InternalServerError(e.to_string())
    })?;

    let token = sign_jwt(
        &user.id,
        &user.email,
        &config.jwt_secret,
        config.jwt_expiration,
    )?;
    tracing::info!("User {} logged in", user.id);

    Ok(Json(json!({
        "token": token,
        "type": "Bearer",
        "user": user,
    })))
}

/// Returns the logged-in user.
pub async fn user_info(
    State(store): State<RecordStore>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user: User = store.fetch(&USERS, claims.sub).await?;
    Ok(Json(user))
}
