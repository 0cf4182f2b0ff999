//! Knowledge-base ingestion and document management endpoints.

use std::path::Path;

use reqwest::multipart::{Form, Part};
use reqwest::Method;
use serde_json::json;

use super::client::ApiClient;
use crate::error::{ApiError, ApiResult};
use crate::models::{DocumentPage, DocumentQuery, IngestResult, RssIngestResult, RssItem};

impl ApiClient {
    /// Upload a local file for parsing, chunking and embedding.
    pub async fn upload_file(&self, path: &Path) -> ApiResult<IngestResult> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(String::from)
            .ok_or_else(|| {
                ApiError::Io(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("not a file path: {}", path.display()),
                ))
            })?;
        let bytes = tokio::fs::read(path).await?;

        let form = Form::new().part("file", Part::bytes(bytes).file_name(file_name));
        self.send(
            self.request(Method::POST, "/api/documents/upload")
                .multipart(form),
        )
        .await
    }

    /// Have the backend scrape and ingest an article URL.
    pub async fn ingest_url(&self, url: &str) -> ApiResult<IngestResult> {
        let body = json!({ "url": url });
        self.send(self.request(Method::POST, "/api/documents/url").json(&body))
            .await
    }

    /// Ingest raw text as a document.
    pub async fn ingest_text(
        &self,
        title: &str,
        content: &str,
        source: Option<&str>,
    ) -> ApiResult<IngestResult> {
        let body = json!({ "title": title, "content": content, "source": source });
        self.send(self.request(Method::POST, "/api/documents/text").json(&body))
            .await
    }

    /// Fetch the newest entries of a feed without ingesting them.
    pub async fn rss_preview(&self, feed_url: &str, limit: usize) -> ApiResult<Vec<RssItem>> {
        let body = json!({ "feed_url": feed_url, "limit": limit });
        self.send(self.request(Method::POST, "/api/rss/preview").json(&body))
            .await
    }

    pub async fn rss_ingest(&self, feed_url: &str, limit: usize) -> ApiResult<RssIngestResult> {
        let body = json!({ "feed_url": feed_url, "limit": limit });
        self.send(self.request(Method::POST, "/api/rss/ingest").json(&body))
            .await
    }

    pub async fn list_documents(&self, query: &DocumentQuery) -> ApiResult<DocumentPage> {
        let path = format!("/api/documents{}", query.to_query_string());
        self.send(self.request(Method::GET, &path)).await
    }

    pub async fn delete_document(&self, document_id: &str) -> ApiResult<()> {
        let path = format!("/api/documents/{}", urlencoding::encode(document_id));
        self.send_empty(self.request(Method::DELETE, &path)).await
    }
}
