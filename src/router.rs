//! Route table
//!
//! Every route is served both at the root and under `/api`.

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers::{auth::require_auth, operation, record, status, user};
use crate::AppState;

pub fn create_router(state: AppState) -> Router {
    let routes = api_routes(state);

    Router::new()
        .nest("/api", routes.clone())
        .merge(routes)
        .layer(TraceLayer::new_for_http())
        .layer(create_cors_layer())
}

fn api_routes(state: AppState) -> Router {
    let protected = Router::new()
        .route("/logout", post(user::logout))
        .route("/user", get(user::get_user))
        .route("/record", post(record::create_record))
        .route("/record/delete", delete(record::delete_record))
        .route("/records", get(record::list_records))
        .route("/operations", get(operation::list_operations))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/login", post(user::login))
        .route("/status", get(status::status))
        .merge(protected)
        .with_state(state)
}

fn create_cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}
