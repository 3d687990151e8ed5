//! Local server helpers

use std::net::SocketAddr;
use std::path::PathBuf;
use tower_http::services::ServeDir;

/// Serve the crate's `fixtures/` directory on an ephemeral localhost port
#[allow(dead_code)]
pub async fn serve_fixtures() -> SocketAddr {
    let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures");
    let app = axum::Router::new().fallback_service(ServeDir::new(dir));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Should bind fixture server");
    let addr = listener.local_addr().expect("Should have local address");

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            eprintln!("Fixture server error: {}", e);
        }
    });

    addr
}

/// Check if a local server is available
#[allow(dead_code)]
pub async fn is_server_available(url: &str) -> bool {
    match reqwest::get(url).await {
        Ok(resp) => resp.status().is_success(),
        Err(_) => false,
    }
}

/// Macro to skip test if local server isn't running
#[macro_export]
macro_rules! require_local_server {
    ($url:expr) => {{
        if !server::is_server_available($url).await {
            eprintln!("Skipping: Local server not running at {}", $url);
            eprintln!("  To run these tests, serve the chart with:");
            eprintln!("    python3 -m http.server 8000");
            return;
        }
    }};
}
