//! REST surface: auth endpoints plus owner-scoped task CRUD.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;
use serde::Serialize;
use taskdeck_wire::{
    AuthResponse, LoginRequest, SignupRequest, TASK_UPDATE_ALLOWED_FIELDS, Task, TaskCreateRequest,
    TaskUpdateRequest,
};
use uuid::Uuid;

use crate::{
    auth::{AuthConfig, AuthError, TokenAuthority, hash_password, verify_password},
    config::Config,
    store::{InMemoryTaskStore, InMemoryUserStore, StoreError, UserRecord},
};

const TASK_NOT_FOUND_MESSAGE: &str = "Task not found";
const INVALID_UPDATES_MESSAGE: &str = "Invalid updates";
const INVALID_CREDENTIALS_MESSAGE: &str = "invalid email or password";
const MIN_PASSWORD_LENGTH: usize = 6;

#[derive(Clone)]
pub struct AppState {
    config: Config,
    users: Arc<InMemoryUserStore>,
    tasks: Arc<InMemoryTaskStore>,
    auth: Arc<TokenAuthority>,
    started_at: chrono::DateTime<Utc>,
}

impl AppState {
    #[must_use]
    pub fn new(config: Config) -> Self {
        let auth = Arc::new(TokenAuthority::from_config(&AuthConfig {
            signing_key: config.token_signing_key.clone(),
            issuer: config.token_issuer.clone(),
            token_ttl_seconds: config.token_ttl_seconds,
        }));
        Self {
            config,
            users: Arc::new(InMemoryUserStore::new()),
            tasks: Arc::new(InMemoryTaskStore::new()),
            auth,
            started_at: Utc::now(),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health))
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/tasks", get(list_tasks).post(create_task))
        .route(
            "/tasks/:task_id",
            get(get_task).put(update_task).delete(delete_task),
        )
        .with_state(state)
}

#[derive(Debug)]
enum ApiError {
    Unauthorized(String),
    NotFound,
    InvalidRequest(String),
    Internal(String),
}

impl ApiError {
    fn from_auth(error: AuthError) -> Self {
        if error.is_unauthorized() {
            Self::Unauthorized(error.to_string())
        } else {
            Self::Internal(error.to_string())
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            Self::Unauthorized(message) => (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({
                    "error": "unauthorized",
                    "message": message,
                })),
            )
                .into_response(),
            Self::NotFound => (
                StatusCode::NOT_FOUND,
                Json(serde_json::json!({
                    "error": "not_found",
                    "message": TASK_NOT_FOUND_MESSAGE,
                })),
            )
                .into_response(),
            Self::InvalidRequest(message) => (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({
                    "error": "invalid_request",
                    "message": message,
                })),
            )
                .into_response(),
            Self::Internal(message) => {
                tracing::error!(message = %message, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(serde_json::json!({
                        "error": "internal",
                        "message": "internal error",
                    })),
                )
                    .into_response()
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    service: String,
    build_sha: String,
    uptime_seconds: i64,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        service: state.config.service_name.clone(),
        build_sha: state.config.build_sha.clone(),
        uptime_seconds: (Utc::now() - state.started_at).num_seconds(),
    })
}

async fn signup(
    State(state): State<AppState>,
    Json(request): Json<SignupRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(ApiError::InvalidRequest("name is required".to_string()));
    }
    let email = normalize_email(&request.email)?;
    if request.password.len() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::InvalidRequest(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    let digest = hash_password(&request.password);
    let record = state
        .users
        .create(name, &email, &digest)
        .await
        .map_err(|error| match error {
            StoreError::DuplicateEmail => ApiError::InvalidRequest(error.to_string()),
        })?;
    tracing::info!(user_id = %record.id, "user signed up");

    let token = state.auth.issue(record.id).map_err(ApiError::from_auth)?;
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: record.to_user(),
        }),
    ))
}

async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let email = normalize_email(&request.email)?;
    // One message for unknown email and wrong password; the response never
    // reveals which half failed.
    let record = state
        .users
        .find_by_email(&email)
        .await
        .ok_or_else(|| ApiError::Unauthorized(INVALID_CREDENTIALS_MESSAGE.to_string()))?;
    if !verify_password(&request.password, &record.password_digest) {
        return Err(ApiError::Unauthorized(
            INVALID_CREDENTIALS_MESSAGE.to_string(),
        ));
    }

    let token = state.auth.issue(record.id).map_err(ApiError::from_auth)?;
    Ok(Json(AuthResponse {
        token,
        user: record.to_user(),
    }))
}

async fn list_tasks(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<Task>>, ApiError> {
    let owner = authenticate_owner(&state, &headers).await?;
    let tasks = state
        .tasks
        .list_by_owner(owner.id)
        .await
        .iter()
        .map(|record| record.to_task())
        .collect();
    Ok(Json(tasks))
}

async fn create_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<TaskCreateRequest>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let owner = authenticate_owner(&state, &headers).await?;
    let title = request.title.trim();
    if title.is_empty() {
        return Err(ApiError::InvalidRequest("title is required".to_string()));
    }

    let record = state
        .tasks
        .insert(
            owner.id,
            title,
            request.description.trim(),
            request.completed,
        )
        .await;
    tracing::debug!(task_id = %record.id, owner = %owner.id, "task created");
    Ok((StatusCode::CREATED, Json(record.to_task())))
}

async fn get_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(task_id): Path<Uuid>,
) -> Result<Json<Task>, ApiError> {
    let owner = authenticate_owner(&state, &headers).await?;
    let record = state
        .tasks
        .find_scoped(task_id, owner.id)
        .await
        .ok_or(ApiError::NotFound)?;
    Ok(Json(record.to_task()))
}

async fn update_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(task_id): Path<Uuid>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<Task>, ApiError> {
    let owner = authenticate_owner(&state, &headers).await?;

    let Some(fields) = body.as_object() else {
        return Err(ApiError::InvalidRequest(INVALID_UPDATES_MESSAGE.to_string()));
    };
    if fields
        .keys()
        .any(|key| !TASK_UPDATE_ALLOWED_FIELDS.contains(&key.as_str()))
    {
        return Err(ApiError::InvalidRequest(INVALID_UPDATES_MESSAGE.to_string()));
    }
    let mut patch: TaskUpdateRequest = serde_json::from_value(body)
        .map_err(|_| ApiError::InvalidRequest(INVALID_UPDATES_MESSAGE.to_string()))?;
    if let Some(title) = &patch.title {
        let title = title.trim();
        if title.is_empty() {
            return Err(ApiError::InvalidRequest("title is required".to_string()));
        }
        patch.title = Some(title.to_string());
    }
    if let Some(description) = &patch.description {
        patch.description = Some(description.trim().to_string());
    }

    let record = state
        .tasks
        .update_scoped(task_id, owner.id, &patch)
        .await
        .ok_or(ApiError::NotFound)?;
    Ok(Json(record.to_task()))
}

async fn delete_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(task_id): Path<Uuid>,
) -> Result<Json<Task>, ApiError> {
    let owner = authenticate_owner(&state, &headers).await?;
    let record = state
        .tasks
        .remove_scoped(task_id, owner.id)
        .await
        .ok_or(ApiError::NotFound)?;
    tracing::debug!(task_id = %record.id, owner = %owner.id, "task deleted");
    Ok(Json(record.to_task()))
}

async fn authenticate_owner(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<UserRecord, ApiError> {
    let authorization_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    let token =
        TokenAuthority::extract_bearer_token(authorization_header).map_err(ApiError::from_auth)?;
    let user_id = state.auth.authenticate(token).map_err(ApiError::from_auth)?;
    state
        .users
        .get(user_id)
        .await
        .ok_or_else(|| ApiError::Unauthorized("unknown user".to_string()))
}

fn normalize_email(raw: &str) -> Result<String, ApiError> {
    let email = raw.trim().to_lowercase();
    if email.is_empty() {
        return Err(ApiError::InvalidRequest("email is required".to_string()));
    }
    Ok(email)
}

#[cfg(test)]
mod tests;
