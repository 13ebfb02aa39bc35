//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing)
//! - Bind server to listener
//! - Stop on the lifecycle shutdown broadcast

use std::future::Future;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::http::handlers::{get_config, get_health, get_reload_timestamp, post_reload};
use crate::lifecycle::Shutdown;
use crate::reload::{ConfigStore, ReloadHandle};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<ConfigStore<Config>>,
    /// Present only while the config file is being watched.
    pub reload: Option<ReloadHandle>,
}

/// HTTP server exposing the live configuration.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(state: AppState) -> Self {
        Self {
            router: Self::build_router(state),
        }
    }

    /// Build the Axum router with all middleware layers.
    pub fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/health", get(get_health))
            .route("/config", get(get_config))
            .route("/config/reload-timestamp", get(get_reload_timestamp))
            .route("/config/reload", post(post_reload))
            .with_state(state)
            .layer(TraceLayer::new_for_http())
    }

    /// Serve until `shutdown` fires.
    ///
    /// The shutdown subscription is taken when this is called, not when the
    /// returned future is first polled.
    pub fn run(
        self,
        listener: TcpListener,
        shutdown: &Shutdown,
    ) -> impl Future<Output = Result<(), std::io::Error>> + Send + 'static {
        let mut stop = shutdown.subscribe();

        async move {
            let addr = listener.local_addr()?;
            tracing::info!(address = %addr, "HTTP server starting");

            axum::serve(listener, self.router)
                .with_graceful_shutdown(async move {
                    let _ = stop.recv().await;
                })
                .await?;

            tracing::info!("HTTP server stopped");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;
    use crate::reload::{ChangeDetector, ReloadCoordinator};
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn store() -> Arc<ConfigStore<Config>> {
        let config = Config {
            immich_url: "http://photos.local".into(),
            immich_api_key: "secret".into(),
            ..Config::default()
        };
        Arc::new(ConfigStore::new(config, None))
    }

    async fn get_json(router: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_get_config_is_redacted() {
        let router = HttpServer::build_router(AppState {
            store: store(),
            reload: None,
        });

        let (status, body) = get_json(router, "/config").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["immich_api_key"], "********");
        assert_eq!(body["refresh"], 60);
    }

    #[tokio::test]
    async fn test_get_config_with_overrides() {
        let store = store();
        let router = HttpServer::build_router(AppState {
            store: Arc::clone(&store),
            reload: None,
        });

        let (status, body) =
            get_json(router, "/config?refresh=10&person=p1&person=p2&theme=BUBBLE").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["refresh"], 10);
        assert_eq!(body["person"], serde_json::json!(["p1", "p2"]));
        assert_eq!(body["theme"], "bubble");

        // The stored snapshot is untouched.
        assert_eq!(store.get().refresh, 60);
    }

    #[tokio::test]
    async fn test_bad_override_is_400() {
        let router = HttpServer::build_router(AppState {
            store: store(),
            reload: None,
        });

        let (status, body) = get_json(router, "/config?refresh=soon").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("refresh"));
    }

    #[tokio::test]
    async fn test_reload_timestamp() {
        let store = store();
        store.replace(store.get().config().clone(), None);
        let router = HttpServer::build_router(AppState {
            store: Arc::clone(&store),
            reload: None,
        });

        let (status, body) = get_json(router, "/config/reload-timestamp").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["generation"], 1);
        assert_eq!(body["reload_timestamp"], store.reload_timestamp());
        assert_eq!(body["watching"], false);
    }

    #[tokio::test]
    async fn test_shutdown_before_first_poll_stops_server() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let shutdown = Shutdown::new();
        let server = HttpServer::new(AppState {
            store: store(),
            reload: None,
        });

        let serving = server.run(listener, &shutdown);
        shutdown.trigger();

        tokio::time::timeout(std::time::Duration::from_secs(5), serving)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_post_reload_without_watcher() {
        let router = HttpServer::build_router(AppState {
            store: store(),
            reload: None,
        });

        let response = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/config/reload")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_post_reload_queues_request() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "refresh = 60").unwrap();

        let store = store();
        let initial = store.get().config().clone();
        let loader = move || -> Result<Config, ConfigError> { Ok(initial.clone()) };
        let detector = ChangeDetector::new(&path, 12).unwrap();
        let coordinator = ReloadCoordinator::new(
            loader,
            Arc::clone(&store),
            detector,
            std::time::Duration::from_secs(60),
        );

        let router = HttpServer::build_router(AppState {
            store,
            reload: Some(coordinator.handle()),
        });

        let response = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/config/reload")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }
}
