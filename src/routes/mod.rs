pub mod graphql;
pub mod health;

use axum::http::{header, HeaderValue, Method};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// The full HTTP surface with middleware applied.
pub fn app(state: AppState) -> Router {
    let cors = cors_layer(&state.config.server.public_url);
    Router::new()
        .merge(graphql::router())
        .merge(health::router())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Credentialed CORS for the front end origin only.
fn cors_layer(public_url: &str) -> CorsLayer {
    let origin = public_url.trim_end_matches('/');
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true);
    match HeaderValue::from_str(origin) {
        Ok(origin) => layer.allow_origin(origin),
        Err(_) => {
            tracing::warn!(origin, "public_url is not a valid origin; CORS disabled");
            layer
        }
    }
}
