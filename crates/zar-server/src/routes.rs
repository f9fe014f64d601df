//! Route definitions and the middleware stack.

use crate::funnel;
use crate::handlers::{self, admin, auth, metrics, shortener, user};
use crate::middleware::{edge, response_cache};
use crate::state::AppState;
use axum::routing::{delete, get, patch, post};
use axum::{middleware, Router};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Build the application router with its full middleware stack.
pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        // Shortener
        .route("/url", post(shortener::shorten_url))
        .route("/url/urls", get(shortener::list_urls))
        .route("/url/{short_code}/stats", get(shortener::url_stats))
        .route("/{short_code}", get(shortener::redirect_from_short_code))
        .route("/{short_code}/verify", post(shortener::verify_password))
        // Auth
        .route("/auth/signup", post(auth::signup))
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/logout-all", post(auth::logout_all))
        .route("/auth/sessions", get(auth::list_sessions))
        // User
        .route("/user/urls", get(user::list_urls))
        .route("/user/url", delete(user::delete_url))
        .route("/user/url/favorite", patch(user::set_favorite))
        // Admin
        .route("/admin/admin-login", post(admin::admin_login))
        .route("/admin/users", get(admin::list_users))
        .route("/admin/users/{user_id}", delete(admin::delete_user))
        .route("/admin/logs", get(admin::list_logs).delete(admin::delete_logs))
        .route("/admin/logs/stats", get(admin::log_stats))
        .route(
            "/admin/rate-limit-violations",
            get(admin::list_violations),
        )
        .route(
            "/admin/domains",
            get(admin::list_domains).put(admin::update_domain),
        )
        .route("/admin/urls/{url_id}", delete(admin::delete_url))
        .route("/admin/urls/{url_id}/tags", get(admin::url_tags))
        .route("/admin/urls/expire", post(admin::expire_urls))
        .route(
            "/admin/cache",
            delete(admin::clear_cache),
        )
        .route("/admin/cache/stats", get(admin::cache_stats))
        .route("/admin/cache/health", get(admin::cache_health))
        // Metrics
        .route("/metrics", get(metrics::snapshot))
        .route("/metrics/memory", get(metrics::memory_history))
        .route("/metrics/cpu", get(metrics::cpu_history));

    // Layer order, innermost first: panics are caught next to the
    // handlers, the response cache sits above them, the funnel finalises
    // every error, and the edge pipeline wraps the lot.
    Router::new()
        .route("/healthz", get(handlers::healthz))
        .nest("/api/v1", api)
        .layer(CatchPanicLayer::custom(funnel::panic_response))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            response_cache::response_cache,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            funnel::error_funnel,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            edge::edge_middleware,
        ))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
