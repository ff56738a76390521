//! Web server module.

mod handlers;

pub use handlers::*;

use crate::config::ServerConfig;
use crate::metrics::PrometheusMetrics;
use crate::service::Monitor;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: ServerConfig,
    pub monitor: Arc<Monitor>,
    pub metrics: Arc<PrometheusMetrics>,
}

/// Web server for sitewatch.
pub struct Server {
    state: AppState,
}

impl Server {
    /// Create a new server with the given dependencies.
    pub fn new(config: ServerConfig, monitor: Arc<Monitor>, metrics: Arc<PrometheusMetrics>) -> Self {
        Self {
            state: AppState {
                config,
                monitor,
                metrics,
            },
        }
    }

    /// Build the router with all routes.
    fn routes(&self) -> Router {
        let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

        Router::new()
            // API endpoints
            .route("/api/sites", get(handlers::handle_get_sites).post(handlers::handle_create_site))
            .route(
                "/api/sites/{id}",
                get(handlers::handle_get_site)
                    .put(handlers::handle_update_site)
                    .delete(handlers::handle_delete_site),
            )
            .route("/api/sites/{id}/check", post(handlers::handle_check_site))
            .route("/api/sites/{id}/history", get(handlers::handle_get_history))
            .route("/api/sites/{id}/uptime", get(handlers::handle_get_uptime))
            // Operations
            .route("/health", get(handlers::handle_health))
            .route("/metrics", get(handlers::handle_metrics))
            .layer(TraceLayer::new_for_http())
            .layer(cors)
            .layer(DefaultBodyLimit::max(64 * 1024))
            .with_state(self.state.clone())
    }

    /// Serve on the configured port until `shutdown` resolves.
    pub async fn start<F>(&self, shutdown: F) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.state.config.http_port));
        let router = self.routes();

        tracing::info!("Web server listening on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil;
    use reqwest::StatusCode;
    use serde_json::{json, Value};

    async fn spawn_app() -> (String, Arc<Monitor>) {
        let config = ServerConfig::default();
        let metrics = Arc::new(PrometheusMetrics::new().unwrap());
        let monitor = Arc::new(Monitor::new(&config.monitor, metrics.clone()));
        let server = Server::new(config, monitor.clone(), metrics);
        let base = testutil::serve(server.routes()).await;
        (base.trim_end_matches('/').to_string(), monitor)
    }

    #[tokio::test]
    async fn test_health() {
        let (base, _) = spawn_app().await;
        let body: Value = reqwest::get(format!("{}/health", base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body, json!({ "status": "healthy" }));
    }

    #[tokio::test]
    async fn test_site_lifecycle() {
        let (base, _) = spawn_app().await;
        let site_url = testutil::serve_status(200).await;
        let client = reqwest::Client::new();

        let resp = client
            .post(format!("{}/api/sites", base))
            .json(&json!({ "url": site_url, "check_interval": "3" }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
        let site: Value = resp.json().await.unwrap();
        assert_eq!(site["url"], site_url);
        assert_eq!(site["name"], site_url);
        assert_eq!(site["check_interval"], 10);
        assert_eq!(site["status"], "OK (200)");
        let id = site["id"].as_u64().unwrap();

        let resp = client
            .put(format!("{}/api/sites/{}", base, id))
            .json(&json!({ "name": "Renamed" }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let site: Value = resp.json().await.unwrap();
        assert_eq!(site["name"], "Renamed");

        let resp = client
            .post(format!("{}/api/sites/{}/check", base, id))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let history: Value = client
            .get(format!("{}/api/sites/{}/history?limit=2", base, id))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(history.as_array().unwrap().len(), 2);

        let uptime: Value = client
            .get(format!("{}/api/sites/{}/uptime", base, id))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(uptime, json!({ "id": id, "uptime": 100.0 }));

        let metrics = client
            .get(format!("{}/metrics", base))
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert!(metrics.contains("site_monitor_up"));

        let resp = client
            .delete(format!("{}/api/sites/{}", base, id))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = client
            .get(format!("{}/api/sites/{}", base, id))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_create_requires_url() {
        let (base, monitor) = spawn_app().await;
        let client = reqwest::Client::new();

        for body in [json!({}), json!({ "url": "" }), json!({ "name": "x" })] {
            let resp = client
                .post(format!("{}/api/sites", base))
                .json(&body)
                .send()
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
            let err: Value = resp.json().await.unwrap();
            assert_eq!(err["error"], "URL is required");
        }
        assert!(monitor.list_targets().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_site_is_404() {
        let (base, _) = spawn_app().await;
        let client = reqwest::Client::new();

        let get = client.get(format!("{}/api/sites/99", base)).send().await.unwrap();
        assert_eq!(get.status(), StatusCode::NOT_FOUND);

        let check = client
            .post(format!("{}/api/sites/99/check", base))
            .send()
            .await
            .unwrap();
        assert_eq!(check.status(), StatusCode::NOT_FOUND);

        let delete = client
            .delete(format!("{}/api/sites/99", base))
            .send()
            .await
            .unwrap();
        assert_eq!(delete.status(), StatusCode::NOT_FOUND);

        let uptime = client
            .get(format!("{}/api/sites/99/uptime", base))
            .send()
            .await
            .unwrap();
        assert_eq!(uptime.status(), StatusCode::NOT_FOUND);
    }
}
