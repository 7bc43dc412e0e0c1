/*
 * Responsibility
 * - v1 の URL 構造を定義
 * - /health, /containers/{container_id}/access
 */
use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use crate::api::v1::handlers::{access::check_access, health::health};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/containers/{container_id}/access", post(check_access))
}
