/*
 * Responsibility
 * - tracing / panic hook の初期化
 * - Config読み込み → Registry 生成 → Router 組み立て
 * - Middleware の適用 (request id / timeout / trace など)
 * - axum::serve() で起動
 */
use std::{panic, process, sync::Arc};

use anyhow::Result;
use axum::Router;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    api,
    config::Config,
    middleware,
    services::registry::InMemoryRegistry,
    state::AppState,
};

fn init_tracing() {
    // Prefer RUST_LOG if set; otherwise use a sensible default.
    // Ex:
    // RUST_LOG=info,watchdog_api=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        tracing::error!(?info, "panic");

        // Development: crash the whole process so it gets noticed.
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env()?;
    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        "starting watchdog api in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let state = build_state(&config);
    let app = build_app(state, &config);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_state(config: &Config) -> AppState {
    let registry = InMemoryRegistry::from_entries(
        config
            .instances
            .iter()
            .map(|entry| (entry.key.clone(), entry.secret.clone())),
    );

    for entry in config.instances.iter().filter(|e| e.secret.is_none()) {
        tracing::warn!(
            key = %entry.key,
            "instance registered without a secret; callbacks will be rejected"
        );
    }
    tracing::info!(count = config.instances.len(), "instances loaded");

    AppState::new(Arc::new(registry))
}

fn build_router(state: AppState) -> Router {
    api::routes().with_state(state)
}

fn build_app(state: AppState, config: &Config) -> Router {
    middleware::http::apply(build_router(state), config)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::{
        body::Body,
        http::{Method, Request, StatusCode, header},
    };
    use base64::{Engine as _, engine::general_purpose::STANDARD};
    use tower::ServiceExt;

    use super::*;
    use crate::config::{AppEnv, InstanceEntry};
    use crate::services::auth::credential::encode_basic;
    use crate::services::registry::InstanceRegistry;

    fn test_config() -> Config {
        Config {
            addr: "127.0.0.1:0".parse().unwrap(),
            app_env: AppEnv::Development,
            instances: vec![
                InstanceEntry {
                    key: "alpha".into(),
                    secret: Some("s3cr3t".into()),
                },
                InstanceEntry {
                    key: "pending".into(),
                    secret: None,
                },
            ],
            request_timeout: Duration::from_secs(5),
            request_body_limit_bytes: 1024,
        }
    }

    fn ping_request(key: &str, authorization: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(format!("/server_api/{key}/ping"));
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn error_code(res: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        body["error"]["code"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn authorized_ping_records_liveness() {
        let state = build_state(&test_config());
        let app = build_router(state.clone());

        let header = encode_basic("alpha", "s3cr3t");
        let res = app.oneshot(ping_request("alpha", Some(&header))).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let alpha = state.registry.lookup("alpha").await.unwrap();
        assert_eq!(alpha.ping_count(), 1);
        assert!(alpha.last_ping().is_some());
    }

    #[tokio::test]
    async fn denied_pings_map_to_status_codes() {
        let no_colon = format!("Basic {}", STANDARD.encode("alpha_no_colon"));
        let wrong_identity = encode_basic("alpha", "s3cr3t");
        let unknown = encode_basic("ghost", "s3cr3t");
        let pending = encode_basic("pending", "");
        let wrong_secret = encode_basic("alpha", "s3cr3T");

        let cases: Vec<(&str, Option<&str>, StatusCode, &str)> = vec![
            ("alpha", None, StatusCode::UNAUTHORIZED, "MISSING_AUTHORIZATION"),
            ("alpha", Some("Bearer xyz"), StatusCode::UNAUTHORIZED, "UNSUPPORTED_SCHEME"),
            ("alpha", Some(no_colon.as_str()), StatusCode::BAD_REQUEST, "MALFORMED_CREDENTIAL"),
            ("pending", Some(wrong_identity.as_str()), StatusCode::FORBIDDEN, "IDENTITY_MISMATCH"),
            ("ghost", Some(unknown.as_str()), StatusCode::NOT_FOUND, "UNKNOWN_INSTANCE"),
            ("pending", Some(pending.as_str()), StatusCode::UNAUTHORIZED, "SECRET_NOT_CONFIGURED"),
            ("alpha", Some(wrong_secret.as_str()), StatusCode::UNAUTHORIZED, "SECRET_MISMATCH"),
        ];

        let state = build_state(&test_config());
        for (key, authorization, status, code) in cases {
            let res = build_router(state.clone())
                .oneshot(ping_request(key, authorization))
                .await
                .unwrap();
            assert_eq!(res.status(), status, "{code}");
            assert_eq!(error_code(res).await, code);
        }

        let alpha = state.registry.lookup("alpha").await.unwrap();
        assert_eq!(alpha.ping_count(), 0);
    }

    #[tokio::test]
    async fn error_body_never_contains_secret() {
        let state = build_state(&test_config());
        let header = encode_basic("alpha", "wrong-secret");
        let res = build_router(state)
            .oneshot(ping_request("alpha", Some(&header)))
            .await
            .unwrap();

        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(!text.contains("wrong-secret"));
        assert!(!text.contains("s3cr3t"));
    }

    #[tokio::test]
    async fn non_ascii_header_is_malformed_not_missing() {
        let state = build_state(&test_config());
        let req = Request::builder()
            .method(Method::POST)
            .uri("/server_api/alpha/ping")
            .header(
                header::AUTHORIZATION,
                header::HeaderValue::from_bytes(b"Basic \xffabc").unwrap(),
            )
            .body(Body::empty())
            .unwrap();

        let res = build_router(state).oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn health_reports_instance_count() {
        let state = build_state(&test_config());
        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let res = build_router(state).oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["instances"], 2);
    }

    #[tokio::test]
    async fn http_layer_sets_request_id() {
        let config = test_config();
        let app = build_app(build_state(&config), &config);

        let header = encode_basic("alpha", "s3cr3t");
        let res = app.oneshot(ping_request("alpha", Some(&header))).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert!(
            res.headers()
                .contains_key(middleware::http::REQUEST_ID_HEADER)
        );
    }

    #[tokio::test]
    async fn ping_requires_post() {
        let state = build_state(&test_config());
        let req = Request::builder()
            .method(Method::GET)
            .uri("/server_api/alpha/ping")
            .body(Body::empty())
            .unwrap();
        let res = build_router(state).oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
