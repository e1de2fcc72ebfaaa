//! Application setup and server configuration.

use std::sync::Arc;

use axum::{
    extract::Extension,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        Method,
    },
    middleware,
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::domains::auth::JwtService;
use crate::domains::notifications::Notifier;
use crate::domains::results::ScoreBounds;
use crate::server::middleware::jwt_auth_middleware;
use crate::server::routes::{
    activate_session_handler, batch_decision_handler, current_session_handler, decision_handler,
    derive_registration_handler, health_handler, list_records_handler, record_ledger_handler,
    student_results_handler, submit_score_handler,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub notifier: Arc<dyn Notifier>,
    pub jwt_service: Arc<JwtService>,
    pub score_bounds: ScoreBounds,
}

/// Build the Axum application router
pub fn build_app(
    pool: PgPool,
    jwt_service: Arc<JwtService>,
    notifier: Arc<dyn Notifier>,
    score_bounds: ScoreBounds,
) -> Router {
    let app_state = AppState {
        db_pool: pool,
        notifier,
        jwt_service: jwt_service.clone(),
        score_bounds,
    };

    // CORS configuration - allow any origin for development
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]);

    // Rate limiting configuration
    // Mutating admin endpoints are cheap per call; 10/sec with a burst of 20
    // per IP keeps a misbehaving client from exhausting the pool.
    let rate_limit_config = std::sync::Arc::new(
        GovernorConfigBuilder::default()
            .per_second(10) // Base rate: 10 requests per second
            .burst_size(20) // Allow bursts up to 20
            .finish()
            .expect("Rate limiter configuration is valid and should never fail"),
    );

    let rate_limit_layer = GovernorLayer {
        config: rate_limit_config,
    };

    Router::new()
        // Score submission and review listing
        .route(
            "/api/results",
            post(submit_score_handler).get(list_records_handler),
        )
        // Approval decisions: batch first so it is not captured by :id
        .route("/api/results/decisions", post(batch_decision_handler))
        .route("/api/results/:id/decision", post(decision_handler))
        .route("/api/results/:id/ledger", get(record_ledger_handler))
        // Student visibility boundary
        .route("/api/students/:id/results", get(student_results_handler))
        // Registration derivation
        .route(
            "/api/registrations/:id/derive",
            post(derive_registration_handler),
        )
        // Active session management
        .route(
            "/api/session",
            get(current_session_handler).put(activate_session_handler),
        )
        // Health check
        .route("/health", get(health_handler))
        // Middleware layers (applied in reverse order - last added runs first)
        .layer(middleware::from_fn(move |req, next| {
            jwt_auth_middleware(jwt_service.clone(), req, next)
        })) // JWT authentication
        .layer(rate_limit_layer)
        .layer(Extension(app_state)) // Shared state (after middlewares that need it)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
