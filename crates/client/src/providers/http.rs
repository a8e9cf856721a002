//! HTTP prompt service backend.
//!
//! Talks to the project/version/document endpoints of the prompt service:
//! - `POST /projects/{id}/versions`
//! - `POST /projects/{id}/versions/{uuid}/push`
//! - `POST /projects/{id}/versions/{ref}/publish`
//! - `GET  /projects/{id}/versions/{ref}/documents[/{path}]`
//! - `GET  /projects/{id}/versions[/{ref}]`

use crate::client::{transmittable, VersionClient};
use crate::types::{Document, DocumentChange, PushResult, Version, LIVE_VERSION};
use promptops_core::{ApiError, AppConfig, AppError, AppResult};
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Duration;

/// Provenance tag attached to every mutating request body.
const PROVENANCE_SOURCE: &str = "promptops";

#[derive(Debug, Serialize)]
struct CreateVersionRequest<'a> {
    name: &'a str,
}

#[derive(Debug, Serialize)]
struct PushRequest<'a> {
    changes: &'a [DocumentChange],
}

/// Prompt service client over HTTP.
pub struct HttpVersionClient {
    /// Base URL of the API (e.g. `https://host/api/v3`)
    base_url: Url,

    project_id: String,

    /// Bearer credential
    api_key: String,

    timeout: Duration,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpVersionClient {
    /// Create a client for one project.
    pub fn new(
        base_url: &str,
        project_id: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> AppResult<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(AppError::Config("API key is empty".to_string()));
        }

        let base_url = Url::parse(base_url)
            .map_err(|e| AppError::Config(format!("Invalid base URL {}: {}", base_url, e)))?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url,
            project_id: project_id.into(),
            api_key,
            timeout,
            client,
        })
    }

    /// Create a client from application configuration.
    ///
    /// Fails with a configuration error before any network attempt when
    /// credentials or the project id are missing.
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        config.validate_remote()?;

        let project_id = config.project_id.clone().unwrap_or_default();
        let api_key = config.api_key.clone().unwrap_or_default();

        Self::new(
            &config.base_url,
            project_id,
            api_key,
            Duration::from_secs(config.timeout_secs),
        )
    }

    /// Build `<base>/projects/<id>/<segments...>` with each segment encoded.
    fn project_url(&self, segments: &[&str]) -> AppResult<Url> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| AppError::Config(format!("Base URL cannot be a base: {}", self.base_url)))?;
            path.pop_if_empty();
            path.push("projects");
            path.push(&self.project_id);
            path.extend(segments.iter().copied());
        }
        Ok(url)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<Value>,
    ) -> AppResult<T> {
        tracing::debug!("{} {}", method, url);

        let mut request = self
            .client
            .request(method.clone(), url.clone())
            .bearer_auth(&self.api_key);

        if method == Method::POST {
            request = request.json(&with_provenance(body.unwrap_or_else(|| json!({}))));
        }

        let response = request
            .send()
            .await
            .map_err(|e| self.transport_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .map_err(|e| self.transport_error(&e))?;
            let error = parse_error_body(status, &text);
            tracing::debug!("{} {} failed: {}", method, url, error);
            return Err(error.into());
        }

        response.json::<T>().await.map_err(|e| {
            if e.is_decode() {
                AppError::Serialization(format!("Failed to parse response from {}: {}", url, e))
            } else {
                self.transport_error(&e)
            }
        })
    }

    fn transport_error(&self, err: &reqwest::Error) -> AppError {
        if err.is_timeout() {
            ApiError::timeout(format!(
                "Request timed out after {}s",
                self.timeout.as_secs()
            ))
            .into()
        } else {
            ApiError::network(format!("Failed to reach prompt service: {}", err)).into()
        }
    }
}

#[async_trait::async_trait]
impl VersionClient for HttpVersionClient {
    fn backend_name(&self) -> &str {
        "http"
    }

    async fn create_version(&self, name: &str) -> AppResult<Version> {
        tracing::info!("Creating version '{}'", name);
        let url = self.project_url(&["versions"])?;
        let body = serde_json::to_value(CreateVersionRequest { name })?;
        self.send(Method::POST, url, Some(body)).await
    }

    async fn push_changes(
        &self,
        version_uuid: &str,
        changes: &[DocumentChange],
    ) -> AppResult<PushResult> {
        let changes = transmittable(changes);
        tracing::info!("Pushing {} change(s) to version {}", changes.len(), version_uuid);

        let url = self.project_url(&["versions", version_uuid, "push"])?;
        let body = serde_json::to_value(PushRequest { changes: &changes })?;
        self.send(Method::POST, url, Some(body)).await
    }

    async fn publish_version(&self, version_ref: &str) -> AppResult<Version> {
        tracing::info!("Publishing version {}", version_ref);
        let url = self.project_url(&["versions", version_ref, "publish"])?;
        self.send(Method::POST, url, None).await
    }

    async fn list_documents(&self, version_ref: &str) -> AppResult<Vec<Document>> {
        let url = self.project_url(&["versions", version_ref, "documents"])?;
        match self.send(Method::GET, url, None).await {
            Err(AppError::Api(err)) if err.status == 404 && version_ref == LIVE_VERSION => {
                tracing::warn!("Project has no live version yet; treating as empty");
                Ok(Vec::new())
            }
            other => other,
        }
    }

    async fn get_document(&self, version_ref: &str, path: &str) -> AppResult<Document> {
        let mut segments = vec!["versions", version_ref, "documents"];
        segments.extend(path.split('/').filter(|s| !s.is_empty()));
        let url = self.project_url(&segments)?;
        self.send(Method::GET, url, None).await
    }

    async fn list_versions(&self) -> AppResult<Vec<Version>> {
        let url = self.project_url(&["versions"])?;
        self.send(Method::GET, url, None).await
    }

    async fn get_version(&self, version_ref: &str) -> AppResult<Version> {
        let url = self.project_url(&["versions", version_ref])?;
        self.send(Method::GET, url, None).await
    }
}

/// Tag a request body as coming from this integration.
fn with_provenance(mut body: Value) -> Value {
    if let Value::Object(ref mut map) = body {
        map.insert(
            "__internal".to_string(),
            json!({ "source": PROVENANCE_SOURCE }),
        );
    }
    body
}

/// Turn a non-2xx response into the normalized error shape.
///
/// The body is parsed best-effort as JSON; anything unparseable falls back
/// to an error keyed on the HTTP status.
pub fn parse_error_body(status: StatusCode, body: &str) -> ApiError {
    let fallback_code = format!("HTTP_{}", status.as_u16());
    let fallback_message = format!(
        "HTTP {}: {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("Unknown error")
    );

    let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) else {
        return ApiError::remote(status.as_u16(), fallback_code, fallback_message);
    };

    let text = |key: &str| {
        map.get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    let code = text("errorCode")
        .or_else(|| text("code"))
        .or_else(|| text("name"))
        .unwrap_or(fallback_code);
    let message = text("message")
        .or_else(|| text("error"))
        .unwrap_or(fallback_message);

    let error = ApiError::remote(status.as_u16(), code, message);
    match map.get("details") {
        Some(details) if !details.is_null() => error.with_details(details.clone()),
        _ => error,
    }
}
