//! HTTP client for the taskdeck API.
//!
//! Implements the `taskdeck-client-core` transport seams over reqwest. Every
//! request attaches the bearer token from the configured [`TokenStore`] when
//! one is present, and every non-success response is normalized so that a
//! server-provided `{message}` body becomes the error's display text.

use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use taskdeck_client_core::store::TokenStore;
use taskdeck_client_core::transport::{AuthTransport, TaskTransport};
use taskdeck_wire::{
    AuthResponse, ErrorBody, LoginRequest, SignupRequest, Task, TaskCreateRequest,
    TaskUpdateRequest,
};
use thiserror::Error;
use uuid::Uuid;

pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    pub base_url: String,
    pub timeout_ms: u64,
}

impl ApiClientConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiClientError {
    #[error("api base url must not be empty")]
    BaseUrlMissing,
    #[error("api request path must not be empty")]
    InvalidPath,
    #[error("token store failure: {message}")]
    TokenStore { message: String },
    #[error("request failed: {message}")]
    Request { message: String },
    #[error("failed to read response: {message}")]
    Read { message: String },
    /// The server rejected the request and said why; the display text is
    /// exactly the server's message, ready for a UI notice.
    #[error("{message}")]
    Api { status: StatusCode, message: String },
    /// Non-success response without a usable `{message}` body.
    #[error("http status {status}: {body}")]
    Http { status: StatusCode, body: String },
    #[error("failed to decode response: {message}")]
    Decode { message: String },
}

#[derive(Debug, Clone)]
pub struct ApiClient<S> {
    base_url: String,
    timeout: Duration,
    http: reqwest::Client,
    tokens: Arc<S>,
}

impl<S> ApiClient<S>
where
    S: TokenStore,
    S::Error: Display,
{
    pub fn new(config: ApiClientConfig, tokens: Arc<S>) -> Result<Self, ApiClientError> {
        let base_url = normalize_base_url(&config.base_url)?;
        Ok(Self {
            base_url,
            timeout: Duration::from_millis(config.timeout_ms.max(250)),
            http: reqwest::Client::new(),
            tokens,
        })
    }

    #[must_use]
    pub fn endpoint(&self, path: &str) -> Option<String> {
        let trimmed = path.trim();
        if trimmed.is_empty() {
            return None;
        }
        if trimmed.starts_with('/') {
            Some(format!("{}{}", self.base_url, trimmed))
        } else {
            Some(format!("{}/{}", self.base_url, trimmed))
        }
    }

    #[must_use]
    pub fn login_path() -> &'static str {
        "/auth/login"
    }

    #[must_use]
    pub fn signup_path() -> &'static str {
        "/auth/signup"
    }

    #[must_use]
    pub fn tasks_path() -> &'static str {
        "/tasks"
    }

    #[must_use]
    pub fn task_path(task_id: Uuid) -> String {
        format!("/tasks/{task_id}")
    }

    pub async fn get_json<T>(&self, path: &str) -> Result<T, ApiClientError>
    where
        T: DeserializeOwned,
    {
        let response = self.send(Method::GET, path, None::<&()>).await?;
        decode_json_response(response).await
    }

    pub async fn post_json<Req, Res>(&self, path: &str, payload: &Req) -> Result<Res, ApiClientError>
    where
        Req: Serialize + ?Sized,
        Res: DeserializeOwned,
    {
        let response = self.send(Method::POST, path, Some(payload)).await?;
        decode_json_response(response).await
    }

    pub async fn put_json<Req, Res>(&self, path: &str, payload: &Req) -> Result<Res, ApiClientError>
    where
        Req: Serialize + ?Sized,
        Res: DeserializeOwned,
    {
        let response = self.send(Method::PUT, path, Some(payload)).await?;
        decode_json_response(response).await
    }

    pub async fn delete_json<T>(&self, path: &str) -> Result<T, ApiClientError>
    where
        T: DeserializeOwned,
    {
        let response = self.send(Method::DELETE, path, None::<&()>).await?;
        decode_json_response(response).await
    }

    async fn send<Req>(
        &self,
        method: Method,
        path: &str,
        payload: Option<&Req>,
    ) -> Result<reqwest::Response, ApiClientError>
    where
        Req: Serialize + ?Sized,
    {
        let url = self.endpoint(path).ok_or(ApiClientError::InvalidPath)?;
        tracing::debug!(%method, %url, "api request");

        let mut request = self
            .http
            .request(method, url.as_str())
            .timeout(self.timeout);
        if let Some(token) = self.bearer_token()? {
            request = request.bearer_auth(token);
        }
        if let Some(payload) = payload {
            request = request.json(payload);
        }

        request.send().await.map_err(|error| ApiClientError::Request {
            message: error.to_string(),
        })
    }

    fn bearer_token(&self) -> Result<Option<String>, ApiClientError> {
        self.tokens
            .load_token()
            .map_err(|error| ApiClientError::TokenStore {
                message: error.to_string(),
            })
    }
}

#[async_trait]
impl<S> AuthTransport for ApiClient<S>
where
    S: TokenStore + Send + Sync,
    S::Error: Display,
{
    type Error = ApiClientError;

    async fn login(&self, request: LoginRequest) -> Result<AuthResponse, Self::Error> {
        self.post_json(Self::login_path(), &request).await
    }

    async fn signup(&self, request: SignupRequest) -> Result<AuthResponse, Self::Error> {
        self.post_json(Self::signup_path(), &request).await
    }
}

#[async_trait]
impl<S> TaskTransport for ApiClient<S>
where
    S: TokenStore + Send + Sync,
    S::Error: Display,
{
    type Error = ApiClientError;

    async fn list_tasks(&self) -> Result<Vec<Task>, Self::Error> {
        self.get_json(Self::tasks_path()).await
    }

    async fn get_task(&self, task_id: Uuid) -> Result<Task, Self::Error> {
        self.get_json(Self::task_path(task_id).as_str()).await
    }

    async fn create_task(&self, request: TaskCreateRequest) -> Result<Task, Self::Error> {
        self.post_json(Self::tasks_path(), &request).await
    }

    async fn update_task(
        &self,
        task_id: Uuid,
        request: TaskUpdateRequest,
    ) -> Result<Task, Self::Error> {
        self.put_json(Self::task_path(task_id).as_str(), &request)
            .await
    }

    async fn delete_task(&self, task_id: Uuid) -> Result<Task, Self::Error> {
        self.delete_json(Self::task_path(task_id).as_str()).await
    }
}

fn normalize_base_url(base_url: &str) -> Result<String, ApiClientError> {
    let trimmed = base_url.trim();
    if trimmed.is_empty() {
        return Err(ApiClientError::BaseUrlMissing);
    }
    Ok(trimmed.trim_end_matches('/').to_string())
}

async fn decode_json_response<T>(response: reqwest::Response) -> Result<T, ApiClientError>
where
    T: DeserializeOwned,
{
    let status = response.status();
    let bytes = response
        .bytes()
        .await
        .map_err(|error| ApiClientError::Read {
            message: error.to_string(),
        })?;

    if !status.is_success() {
        return Err(normalize_error_response(status, &bytes));
    }

    serde_json::from_slice::<T>(&bytes).map_err(|error| ApiClientError::Decode {
        message: error.to_string(),
    })
}

/// A non-success response whose body parses as `{message}` surfaces that
/// message verbatim; anything else keeps the raw status and body.
fn normalize_error_response(status: StatusCode, bytes: &[u8]) -> ApiClientError {
    if let Ok(body) = serde_json::from_slice::<ErrorBody>(bytes) {
        let message = body.message.trim();
        if !message.is_empty() {
            return ApiClientError::Api {
                status,
                message: message.to_string(),
            };
        }
    }
    ApiClientError::Http {
        status,
        body: String::from_utf8_lossy(bytes).into_owned(),
    }
}
