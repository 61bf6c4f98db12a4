use axum::{
    http::HeaderValue,
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, patch, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::handlers::{auth, groups, health, members};
use crate::middleware::{authenticate, ensure_group_admin, ensure_logged_in, ensure_site_admin};
use crate::state::AppState;

/// Full HTTP surface. Every request passes through `authenticate` first;
/// the gate stages a route needs are attached to its sub-router.
pub fn app(state: AppState) -> Router {
    let router = Router::new()
        .merge(public_routes())
        .merge(logged_in_routes())
        .merge(site_admin_routes())
        .merge(group_admin_routes(state.clone()))
        .layer(from_fn_with_state(state.clone(), authenticate))
        .layer(cors_layer(&state.config.security.cors_origins));

    let router = if state.config.api.enable_request_logging {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    };

    router.with_state(state)
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/groups", get(groups::list))
        .route("/groups/:group_id", get(groups::get))
        .route("/members", get(members::list))
        .route("/members/:id", get(members::get))
}

fn logged_in_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/whoami", get(auth::whoami))
        .route("/groups", post(groups::create))
        .route_layer(from_fn(ensure_logged_in))
}

fn site_admin_routes() -> Router<AppState> {
    Router::new()
        .route("/members/:id", delete(members::remove_by_id))
        .route_layer(from_fn(ensure_site_admin))
        .route_layer(from_fn(ensure_logged_in))
}

fn group_admin_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/groups/:group_id", patch(groups::update).delete(groups::remove))
        .route("/groups/:group_id/members", post(members::add))
        .route(
            "/groups/:group_id/members/:username",
            patch(members::update).delete(members::remove),
        )
        // Last added runs first: logged in, then group admin
        .route_layer(from_fn_with_state(state, ensure_group_admin))
        .route_layer(from_fn(ensure_logged_in))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", o);
                None
            }
        })
        .collect();
    layer.allow_origin(origins)
}
