// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post, put},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{auth, blog, contact, quiz, score},
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware},
};

/// Assembles the main application router.
///
/// * Each resource gets a public, an authenticated and an admin sub-router,
///   merged under its `/api` prefix.
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (Database Pool and Config).
pub fn create_router(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .merge(
            Router::new()
                .route("/me", get(auth::me))
                .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware)),
        );

    let blog_routes = Router::new()
        .route("/", get(blog::list_blogs))
        .route("/{id}", get(blog::get_blog))
        .merge(
            Router::new()
                .route("/{id}/like", post(blog::like_blog))
                .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware)),
        )
        .merge(
            Router::new()
                .route("/admin", get(blog::list_all_blogs))
                .route("/", post(blog::create_blog))
                .route("/{id}", put(blog::update_blog).delete(blog::delete_blog))
                // Auth runs first, then the admin check
                .route_layer(middleware::from_fn(admin_middleware))
                .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware)),
        );

    let quiz_routes = Router::new()
        .route("/", get(quiz::list_quizzes))
        .route("/{id}", get(quiz::get_quiz))
        .merge(
            Router::new()
                .route("/{id}/submit", post(quiz::submit_quiz))
                .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware)),
        )
        .merge(
            Router::new()
                .route("/admin", get(quiz::list_all_quizzes))
                .route("/", post(quiz::create_quiz))
                .route("/{id}", put(quiz::update_quiz).delete(quiz::delete_quiz))
                .route_layer(middleware::from_fn(admin_middleware))
                .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware)),
        );

    let score_routes = Router::new()
        .route("/leaderboard/{quiz_id}", get(score::leaderboard))
        .merge(
            Router::new()
                .route("/user", get(score::user_scores))
                .route("/quiz/{quiz_id}", get(score::quiz_score))
                .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware)),
        )
        .merge(
            Router::new()
                .route("/admin/all", get(score::all_scores))
                .route("/admin/statistics", get(score::statistics))
                .route_layer(middleware::from_fn(admin_middleware))
                .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware)),
        );

    let contact_routes = Router::new()
        .route("/", post(contact::create_contact))
        .merge(
            Router::new()
                .route("/admin", get(contact::list_contacts))
                .route(
                    "/admin/{id}",
                    get(contact::get_contact).delete(contact::delete_contact),
                )
                .route("/admin/{id}/status", put(contact::update_contact_status))
                .route_layer(middleware::from_fn(admin_middleware))
                .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware)),
        );

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/blogs", blog_routes)
        .nest("/api/quizzes", quiz_routes)
        .nest("/api/scores", score_routes)
        .nest("/api/contact", contact_routes)
        // Global middleware, outermost first
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
