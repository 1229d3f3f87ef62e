/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - registry: InMemoryRegistry, gate: AuthorizationGate
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 */
use std::sync::Arc;

use crate::services::{auth::AuthorizationGate, registry::InMemoryRegistry};

#[derive(Clone, Debug)]
pub struct AppState {
    pub registry: Arc<InMemoryRegistry>,
    pub gate: AuthorizationGate,
}

impl AppState {
    pub fn new(registry: Arc<InMemoryRegistry>) -> Self {
        // The gate only sees the read-only lookup capability
        let gate = AuthorizationGate::new(registry.clone());
        Self { registry, gate }
    }
}
