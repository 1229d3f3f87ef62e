/*
 * Responsibility
 * - middleware の公開インターフェース
 * - 認可は extractor (api::extractors) 側で行うため、ここは横断的な HTTP 層のみ
 */
pub mod http;
