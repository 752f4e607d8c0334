//! HTTP API route definitions.

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::web::handlers::{generate, health};
use crate::web::rate_limit;
use crate::web::state::WebAppState;

/// Build the API router. Only bundle generation counts against the rate limit.
pub fn api_routes(state: &WebAppState) -> Router<WebAppState> {
    let mut generate_routes = Router::new().route("/generate-app", post(generate::generate_app));
    if state.rate_limiter().is_some() {
        generate_routes = generate_routes.route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit::enforce,
        ));
    }

    Router::new()
        .route("/health", get(health::health))
        .merge(generate_routes)
}
