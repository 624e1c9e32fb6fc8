//! Router configuration for Web API.

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use std::any::Any;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

use super::error::{expose_internal_errors, ApiError};
use super::handlers::{auth, category, comment, contact, health, image, oauth, post, user, AppState};
use super::middleware::{
    access_log, api_rate_limit, create_cors_layer, login_rate_limit, security_headers,
    RateLimitState,
};

/// Multipart framing allowance on top of the image size limit.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Create the main API router.
pub fn create_router(state: Arc<AppState>, limits: Arc<RateLimitState>) -> Router {
    let login_limits = limits.clone();
    let credential_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route_layer(middleware::from_fn(move |req, next| {
            let limits = login_limits.clone();
            login_rate_limit(limits, req, next)
        }));

    let auth_routes = Router::new()
        .merge(credential_routes)
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
        .route("/profile", put(auth::update_profile))
        .route("/change-password", put(auth::change_password))
        .route("/google", get(oauth::google_login))
        .route("/google/callback", get(oauth::google_callback));

    let post_routes = Router::new()
        .route("/", get(post::list_posts).post(post::create_post))
        .route("/categories/list", get(post::post_categories))
        .route("/tags/list", get(post::post_tags))
        .route("/author/:username", get(post::author_posts))
        .route(
            "/:slug",
            get(post::get_post)
                .put(post::update_post)
                .delete(post::delete_post),
        );

    let comment_routes = Router::new()
        .route("/", post(comment::create_comment))
        .route("/post/:post_id", get(comment::list_post_comments))
        .route("/user/:user_id", get(comment::user_comments))
        .route("/admin/pending", get(comment::pending_comments))
        .route(
            "/:id",
            put(comment::update_comment).delete(comment::delete_comment),
        )
        .route("/:id/like", post(comment::toggle_like))
        .route("/:id/approve", put(comment::approve_comment));

    let category_routes = Router::new()
        .route(
            "/",
            get(category::list_categories).post(category::create_category),
        )
        .route(
            "/:id",
            put(category::update_category).delete(category::delete_category),
        );

    // `:user` is a username for reads and an id for writes and stats.
    let user_routes = Router::new()
        .route("/", get(user::list_users))
        .route(
            "/:user",
            get(user::get_user)
                .put(user::update_user)
                .delete(user::delete_user),
        )
        .route("/:user/posts", get(user::user_posts))
        .route("/:user/stats", get(user::user_stats));

    let contact_routes = Router::new()
        .route(
            "/",
            get(contact::list_contacts).post(contact::create_contact),
        )
        .route(
            "/:id",
            get(contact::get_contact)
                .put(contact::update_contact)
                .delete(contact::delete_contact),
        );

    let upload_limit = state.config.media.max_upload_mb as usize * 1024 * 1024;
    let image_routes = Router::new()
        .route("/upload", post(image::upload_image))
        .layer(DefaultBodyLimit::max(upload_limit + MULTIPART_OVERHEAD));

    let api_limits = limits;
    let api_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/posts", post_routes)
        .nest("/comments", comment_routes)
        .nest("/categories", category_routes)
        .nest("/users", user_routes)
        .nest("/contact", contact_routes)
        .nest("/image", image_routes)
        .route("/health", get(health::health))
        .layer(middleware::from_fn(move |req, next| {
            let limits = api_limits.clone();
            api_rate_limit(limits, req, next)
        }));

    let mut router = Router::new()
        .nest("/api", api_routes)
        .fallback(route_not_found)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn(access_log))
                .layer(create_cors_layer(&state.config.cors.allowed_origins()))
                .layer(middleware::from_fn(security_headers))
                .layer(CatchPanicLayer::custom(panic_response)),
        );

    if state.config.server.is_development() {
        router = router.layer(middleware::from_fn(expose_internal_errors));
    }

    router.with_state(state)
}

async fn route_not_found() -> ApiError {
    ApiError::not_found("Route not found")
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "handler panicked".to_string()
    };
    tracing::error!(panic = %detail, "Request handler panicked");
    ApiError::internal(detail).into_response()
}
