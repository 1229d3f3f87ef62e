/*
 * Responsibility
 * - URL 構造を定義
 * - /health は認証なし
 * - /server_api/{key}/... はインスタンスからのコールバック (AuthorizedInstance で認可)
 */
use axum::{
    Router,
    routing::{get, post},
};

use crate::api::handlers::{health::health, ping::ping};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/server_api/{key}/ping", post(ping))
}
