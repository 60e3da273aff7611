use crate::handlers;
use crate::middleware::require_bearer;
use crate::state::AppState;
use autorest_core::ServerConfig;
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Build the application router.
///
/// Static `/api/tables/...` routes take precedence over the generic
/// `/api/{schema}/{table}` ones. `/healthz` sits outside the bearer gate.
pub fn create_router(state: Arc<AppState>, server: &ServerConfig) -> Router {
    let api = Router::new()
        .route("/tables", get(handlers::list_tables))
        .route("/tables/refresh", post(handlers::refresh_tables))
        .route("/tables/{schema}/{table}/schema", get(handlers::table_schema))
        .route(
            "/{schema}/{table}",
            get(handlers::list_rows).post(handlers::create_row),
        )
        .route(
            "/{schema}/{table}/{id}",
            get(handlers::get_row)
                .put(handlers::update_row)
                .delete(handlers::delete_row),
        )
        .method_not_allowed_fallback(handlers::method_not_allowed)
        .route_layer(middleware::from_fn_with_state(state.clone(), require_bearer));

    let mut router = Router::new()
        .route("/healthz", get(handlers::healthz))
        .nest("/api", api)
        .method_not_allowed_fallback(handlers::method_not_allowed)
        .fallback(handlers::fallback)
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if let Some(cors) = cors_layer(&server.cors_allowed_origins) {
        router = router.layer(cors);
    }
    router
}

fn cors_layer(origins: &[String]) -> Option<CorsLayer> {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    if origins.is_empty() {
        return None;
    }
    Some(
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]),
    )
}
