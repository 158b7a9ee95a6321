use axum::{
    middleware as axum_middleware,
    routing::{any, get},
    Router,
};
use std::convert::Infallible;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::api::handlers;
use crate::api::middleware::metrics_middleware;
use crate::utils::response::method_not_allowed;
use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let metered = axum_middleware::from_fn_with_state(state.clone(), metrics_middleware);

    // Only requests that reach a handler are metered; the method fallback is
    // attached after the layer so it stays outside it
    Router::new()
        .route(
            "/users",
            get(handlers::users::list_users)
                .post(handlers::users::create_users)
                .delete(handlers::users::delete_users)
                .layer::<_, Infallible>(metered.clone())
                .fallback(method_not_allowed),
        )
        .route("/health", any(handlers::health::health_check).layer(metered))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
