//! HTTP transport seams consumed by the view-models.
//!
//! `taskdeck-api-client` provides the production implementations; tests
//! script these traits directly.

use async_trait::async_trait;
use taskdeck_wire::{
    AuthResponse, LoginRequest, SignupRequest, Task, TaskCreateRequest, TaskUpdateRequest,
};
use uuid::Uuid;

#[async_trait]
pub trait AuthTransport {
    type Error;

    async fn login(&self, request: LoginRequest) -> Result<AuthResponse, Self::Error>;
    async fn signup(&self, request: SignupRequest) -> Result<AuthResponse, Self::Error>;
}

#[async_trait]
pub trait TaskTransport {
    type Error;

    async fn list_tasks(&self) -> Result<Vec<Task>, Self::Error>;
    async fn get_task(&self, task_id: Uuid) -> Result<Task, Self::Error>;
    async fn create_task(&self, request: TaskCreateRequest) -> Result<Task, Self::Error>;
    async fn update_task(
        &self,
        task_id: Uuid,
        request: TaskUpdateRequest,
    ) -> Result<Task, Self::Error>;
    async fn delete_task(&self, task_id: Uuid) -> Result<Task, Self::Error>;
}
