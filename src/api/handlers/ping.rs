/*
 * Responsibility
 * - POST /server_api/{key}/ping
 * - インスタンスからの liveness 通知。認可は AuthorizedInstance extractor で完了している
 */
use axum::http::StatusCode;

use crate::api::extractors::AuthorizedInstance;

pub async fn ping(AuthorizedInstance(instance): AuthorizedInstance) -> StatusCode {
    instance.ping_received();
    StatusCode::OK
}
