//! HTTP routes for the drinks service.
//!
//! Defines the Axum router and application state.

use crate::auth::{JwksClient, JwtValidator, Permission, ValidationSettings};
use crate::config::Config;
use crate::handlers;
use crate::middleware::{http_metrics_middleware, require_permission, AuthState};
use crate::repositories::DrinkStore;
use axum::{
    http::{header, Method},
    middleware,
    routing::{delete, get, patch, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Service configuration.
    pub config: Config,

    /// Drinks catalog store.
    pub store: Arc<dyn DrinkStore>,
}

/// Build the application routes.
///
/// Creates an Axum router with:
/// - `GET /drinks` - short catalog, public
/// - `GET /drinks-detail` - long catalog, `get:drinks-detail`
/// - `POST /drinks` - create, `post:drinks`
/// - `PATCH /drinks/:id` - update, `patch:drinks`
/// - `DELETE /drinks/:id` - delete, `delete:drinks`
/// - `/health`, `/ready`, `/metrics` - operational, public
/// - JSON 404 fallback for unknown paths
/// - CORS, TraceLayer, 30 second request timeout, HTTP metrics
pub fn build_routes(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let jwks_client = Arc::new(JwksClient::new(state.config.jwks_url.clone()));
    let jwt_validator = Arc::new(JwtValidator::new(
        jwks_client,
        ValidationSettings::from_config(&state.config),
    ));

    // Each gated method carries its own required permission
    let gate = |permission: Permission| {
        middleware::from_fn_with_state(
            Arc::new(AuthState {
                jwt_validator: jwt_validator.clone(),
                permission,
            }),
            require_permission,
        )
    };

    let drink_routes = Router::new()
        .route(
            "/drinks",
            get(handlers::list_drinks)
                .merge(post(handlers::create_drink).route_layer(gate(Permission::PostDrinks))),
        )
        .route(
            "/drinks-detail",
            get(handlers::list_drinks_detail).route_layer(gate(Permission::GetDrinksDetail)),
        )
        .route(
            "/drinks/:id",
            patch(handlers::update_drink)
                .route_layer(gate(Permission::PatchDrinks))
                .merge(delete(handlers::delete_drink).route_layer(gate(Permission::DeleteDrinks))),
        )
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .fallback(handlers::not_found)
        .with_state(state);

    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(metrics_handle);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ]);

    // Layer order (bottom-to-top execution):
    // 1. TimeoutLayer (innermost)
    // 2. TraceLayer
    // 3. CorsLayer - answers preflight before auth runs
    // 4. http_metrics_middleware (outermost) - records ALL responses
    drink_routes
        .merge(metrics_routes)
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(middleware::from_fn(http_metrics_middleware))
}
