use async_graphql::http::{playground_source, GraphQLPlaygroundConfig};
use axum::extract::State;
use axum::http::{HeaderName, HeaderValue};
use axum::response::{Html, IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;

use crate::extractors::Viewer;
use crate::graphql::prepare_request;
use crate::state::AppState;

/// GraphQL endpoint handler. Anonymous requests are allowed; resolvers that
/// need a user reject with an `UNAUTHORIZED` error.
async fn graphql_handler(
    State(state): State<AppState>,
    viewer: Viewer,
    Json(req): Json<async_graphql::Request>,
) -> Response {
    let request = prepare_request(req, &state.repos, viewer);
    let response = state.graphql_schema.execute(request).await;

    // Resolvers set cookies through the GraphQL response headers
    let headers: Vec<(HeaderName, HeaderValue)> = response
        .http_headers
        .iter()
        .filter_map(|(name, value)| {
            let name = HeaderName::from_bytes(name.as_str().as_bytes()).ok()?;
            let value = HeaderValue::from_bytes(value.as_bytes()).ok()?;
            Some((name, value))
        })
        .collect();

    let mut http = Json(response).into_response();
    for (name, value) in headers {
        http.headers_mut().append(name, value);
    }
    http
}

/// GraphQL Playground UI (development tool)
async fn graphql_playground() -> impl IntoResponse {
    Html(playground_source(GraphQLPlaygroundConfig::new("/graphql")))
}

/// GraphQL router
pub fn router() -> Router<AppState> {
    Router::new().route("/graphql", get(graphql_playground).post(graphql_handler))
}
