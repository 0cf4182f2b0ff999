//! Auth, health, configuration and statistics endpoints.

use reqwest::Method;
use serde::Deserialize;
use serde_json::json;

use super::client::ApiClient;
use crate::error::ApiResult;
use crate::models::{Health, ServerConfig, Stats, User};

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    #[serde(alias = "access_token")]
    pub token: String,
    pub user: User,
}

impl ApiClient {
    pub async fn login(&self, username: &str, password: &str) -> ApiResult<LoginResponse> {
        let body = json!({ "username": username, "password": password });
        self.send(self.request(Method::POST, "/api/auth/login").json(&body))
            .await
    }

    /// The user the current token belongs to.
    pub async fn current_user(&self) -> ApiResult<User> {
        self.send(self.request(Method::GET, "/api/auth/me")).await
    }

    pub async fn health(&self) -> ApiResult<Health> {
        self.send(self.request(Method::GET, "/api/health")).await
    }

    pub async fn server_config(&self) -> ApiResult<ServerConfig> {
        self.send(self.request(Method::GET, "/api/config")).await
    }

    pub async fn stats(&self) -> ApiResult<Stats> {
        self.send(self.request(Method::GET, "/api/stats")).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{client_for, serve};
    use axum::http::StatusCode;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::Value;

    async fn login(Json(body): Json<Value>) -> Result<Json<Value>, StatusCode> {
        if body["password"] == "hunter2" {
            Ok(Json(json!({
                "access_token": "fresh-token",
                "user": {"id": "u-1", "username": body["username"]}
            })))
        } else {
            Err(StatusCode::UNAUTHORIZED)
        }
    }

    async fn me() -> Json<Value> {
        Json(json!({"id": "u-1", "username": "ana", "email": "ana@example.com"}))
    }

    async fn health() -> Json<Value> {
        Json(json!({"status": "ok", "version": "2.1.0", "components": {"vector_store": "ok"}}))
    }

    async fn config() -> Json<Value> {
        Json(json!({"embedding_model": "bge-small", "top_k": 8}))
    }

    async fn stats() -> Json<Value> {
        Json(json!({
            "total_documents": 120,
            "total_chunks": 3400,
            "documents_by_source": {"AP": 70, "BBC": 50}
        }))
    }

    fn app() -> Router {
        Router::new()
            .route("/api/auth/login", post(login))
            .route("/api/auth/me", get(me))
            .route("/api/health", get(health))
            .route("/api/config", get(config))
            .route("/api/stats", get(stats))
    }

    #[tokio::test]
    async fn login_accepts_access_token_alias() {
        let client = client_for(serve(app()).await).with_token(None);
        let response = client.login("ana", "hunter2").await.unwrap();
        assert_eq!(response.token, "fresh-token");
        assert_eq!(response.user.username, "ana");

        let err = client.login("ana", "wrong").await.unwrap_err();
        assert!(err.is_unauthorized());
    }

    #[tokio::test]
    async fn reads_current_user() {
        let client = client_for(serve(app()).await);
        let user = client.current_user().await.unwrap();
        assert_eq!(user.email.as_deref(), Some("ana@example.com"));
    }

    #[tokio::test]
    async fn reads_health_config_and_stats() {
        let client = client_for(serve(app()).await);

        let health = client.health().await.unwrap();
        assert!(health.is_healthy());
        assert_eq!(health.components["vector_store"], "ok");

        let config = client.server_config().await.unwrap();
        assert_eq!(config.top_k, Some(8));
        assert!(config.llm_model.is_none());

        let stats = client.stats().await.unwrap();
        assert_eq!(stats.total_documents, 120);
        assert_eq!(stats.total_sessions, 0);
        assert_eq!(stats.documents_by_source["BBC"], 50);
    }
}
