use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client, Method, StatusCode,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error};

use shared_config::AppConfig;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage conflict: {0}")]
    Conflict(String),

    #[error("Storage resource not found: {0}")]
    NotFound(String),

    #[error("Storage request failed: {0}")]
    Request(String),

    #[error("Failed to decode storage response: {0}")]
    Decode(String),
}

/// Thin client over the PostgREST interface of the database. Row filters are
/// expressed as query-string operators (`?doctor_id=eq.5&appointment_date=eq.…`);
/// writes that need the affected rows back send `Prefer: return=representation`.
pub struct PostgrestClient {
    client: Client,
    base_url: String,
    service_key: String,
}

impl PostgrestClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.database_rest_url.clone(),
            service_key: config.database_service_key.clone(),
        }
    }

    fn get_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();

        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Ok(key) = HeaderValue::from_str(&self.service_key) {
            headers.insert("apikey", key);
        }
        if let Ok(bearer) = HeaderValue::from_str(&format!("Bearer {}", self.service_key)) {
            headers.insert(AUTHORIZATION, bearer);
        }

        headers
    }

    pub async fn request<T>(&self, method: Method, path: &str, body: Option<Value>) -> Result<T, StorageError>
    where
        T: DeserializeOwned,
    {
        self.request_with_headers(method, path, body, None).await
    }

    pub async fn request_with_headers<T>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        extra_headers: Option<HeaderMap>,
    ) -> Result<T, StorageError>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("Storage request: {} {}", method, url);

        let mut headers = self.get_headers();
        if let Some(extra) = extra_headers {
            headers.extend(extra);
        }

        let mut req = self.client.request(method, &url).headers(headers);

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req
            .send()
            .await
            .map_err(|e| StorageError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Storage error ({}): {}", status, error_text);

            return Err(match status {
                StatusCode::CONFLICT => StorageError::Conflict(error_text),
                StatusCode::NOT_FOUND => StorageError::NotFound(error_text),
                _ => StorageError::Request(format!("storage responded {}: {}", status, error_text)),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| StorageError::Decode(e.to_string()))
    }

    /// Inserts one row and returns it (PostgREST answers with an array).
    pub async fn insert_returning(&self, table: &str, row: Value) -> Result<Vec<Value>, StorageError> {
        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));

        self.request_with_headers(Method::POST, &format!("/rest/v1/{}", table), Some(row), Some(headers))
            .await
    }

    /// Patches rows matching the filter path and returns them. An empty result
    /// means nothing matched.
    pub async fn update_returning(&self, path: &str, changes: Value) -> Result<Vec<Value>, StorageError> {
        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));

        self.request_with_headers(Method::PATCH, path, Some(changes), Some(headers))
            .await
    }

    /// Deletes rows matching the filter path and returns them, so callers can
    /// distinguish "deleted" from "no such row".
    pub async fn delete_returning(&self, path: &str) -> Result<Vec<Value>, StorageError> {
        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));

        self.request_with_headers(Method::DELETE, path, None, Some(headers)).await
    }

    /// Row count for a filter path, taken from the Content-Range header so no
    /// row data crosses the wire.
    pub async fn count(&self, path: &str) -> Result<i64, StorageError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Storage count: {}", url);

        let mut headers = self.get_headers();
        headers.insert("Prefer", HeaderValue::from_static("count=exact"));
        headers.insert("Range", HeaderValue::from_static("0-0"));

        let response = self
            .client
            .get(&url)
            .headers(headers)
            .send()
            .await
            .map_err(|e| StorageError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Storage count error ({}): {}", status, error_text);
            return Err(StorageError::Request(format!(
                "storage responded {}: {}",
                status, error_text
            )));
        }

        // Content-Range looks like "0-0/42" (or "*/0" for an empty table).
        let content_range = response
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| StorageError::Decode("missing Content-Range header".to_string()))?;

        content_range
            .rsplit('/')
            .next()
            .and_then(|total| total.parse::<i64>().ok())
            .ok_or_else(|| StorageError::Decode(format!("unparseable Content-Range: {}", content_range)))
    }

    pub fn get_base_url(&self) -> &str {
        &self.base_url
    }
}
