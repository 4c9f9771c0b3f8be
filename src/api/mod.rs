pub mod circles;
pub mod health;
pub mod users;

use crate::db::Repository;
use crate::ledger::Ledger;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<Ledger>,
}

impl AppState {
    pub fn new(repo: Arc<Repository>) -> Self {
        Self {
            ledger: Arc::new(Ledger::new(repo)),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/user", post(users::post_user))
        .route("/circles/:user_id", get(circles::list_circles))
        .route("/circle", post(circles::create_circle))
        .route(
            "/circle/:circle_id",
            get(circles::get_circle).delete(circles::delete_circle),
        )
        .route("/circle/:circle_id/sell", post(circles::record_sell))
        .layer(cors)
        .with_state(state)
}
