//! Local HTTP servers for tests.

use axum::{http::StatusCode, routing::get, Router};
use std::time::Duration;

/// Serve `router` on an ephemeral localhost port and return its base URL.
pub async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}/", addr)
}

/// A server that answers every GET with `code`.
pub async fn serve_status(code: u16) -> String {
    let status = StatusCode::from_u16(code).unwrap();
    serve(Router::new().route("/", get(move || async move { status }))).await
}

/// A server that waits `delay` before answering 200.
pub async fn serve_slow(delay: Duration) -> String {
    serve(Router::new().route("/", get(move || async move {
        tokio::time::sleep(delay).await;
        StatusCode::OK
    })))
    .await
}
