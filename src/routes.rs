// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{auth, config, record},
    models::{
        Attempt, Content,
        listening::{ListeningPart, ListeningSet},
        reading::{ReadingPart, ReadingSet},
        record::{ListeningRecord, ReadingRecord, TestingRecord, WritingRecord},
        testing::TestingSet,
        writing::{WritingPart, WritingSet},
    },
    state::AppState,
    utils::jwt::{auth_middleware, optional_auth_middleware},
};

/// CRUD routes for one kind of content.
fn content_routes<C: Content>() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(config::list::<C>)
                .post(config::create::<C>)
                .put(config::update::<C>),
        )
        .route(
            "/{id}",
            get(config::detail::<C>).delete(config::delete::<C>),
        )
}

/// CRUD routes for one kind of attempt.
fn attempt_routes<A: Attempt>() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(record::list::<A>)
                .post(record::create::<A>)
                .put(record::update::<A>),
        )
        .route(
            "/{id}",
            get(record::detail::<A>).delete(record::delete::<A>),
        )
}

/// Assembles the main application router.
///
/// * Config routes accept anonymous callers; user content needs a token.
/// * Record routes and user info always need a token.
/// * Applies global middleware (Trace, CORS).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        HeaderValue::from_static("http://localhost:3000"),
        HeaderValue::from_static("http://127.0.0.1:3000"),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let auth_routes = Router::new()
        .route("/send-code", post(auth::send_code))
        .route("/login", post(auth::login))
        .merge(
            Router::new()
                .route("/user/info", get(auth::user_info))
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    auth_middleware,
                )),
        );

    let config_routes = Router::new()
        .nest("/listening", content_routes::<ListeningSet>())
        .nest("/listening-part", content_routes::<ListeningPart>())
        .nest("/reading", content_routes::<ReadingSet>())
        .nest("/reading-part", content_routes::<ReadingPart>())
        .nest("/writing", content_routes::<WritingSet>())
        .nest("/writing-part", content_routes::<WritingPart>())
        .nest("/testing", content_routes::<TestingSet>())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            optional_auth_middleware,
        ));

    let record_routes = Router::new()
        .nest(
            "/listening",
            attempt_routes::<ListeningRecord>()
                .route("/submit", post(record::submit_section::<ListeningRecord>)),
        )
        .nest(
            "/reading",
            attempt_routes::<ReadingRecord>()
                .route("/submit", post(record::submit_section::<ReadingRecord>)),
        )
        .nest(
            "/writing",
            attempt_routes::<WritingRecord>().route("/submit", post(record::submit_writing)),
        )
        .nest(
            "/testing",
            attempt_routes::<TestingRecord>().route("/submit", post(record::submit_testing)),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .nest("/api", auth_routes)
        .nest("/api/config", config_routes)
        .nest("/api/record", record_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
