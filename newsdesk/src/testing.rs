//! In-process mock backend for tests.

use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;

use crate::api::ApiClient;

/// Serve `app` on an ephemeral local port.
pub async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// Client pointed at a mock backend, carrying token `test-token`.
pub fn client_for(addr: SocketAddr) -> ApiClient {
    ApiClient::new(format!("http://{addr}"), Duration::from_secs(5))
        .unwrap()
        .with_token(Some("test-token".to_string()))
}
