//! In-memory persistence.
//!
//! Every owner-scoped operation filters by `(task id, owner id)` inside a
//! single lock acquisition, which gives the per-document atomicity the
//! update/delete races rely on: of two concurrent deletes for the same task,
//! at most one observes the record.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use taskdeck_wire::{Task, TaskUpdateRequest, User};
use thiserror::Error;
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("email already registered")]
    DuplicateEmail,
}

#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_digest: String,
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    #[must_use]
    pub fn to_user(&self) -> User {
        User {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }
}

#[derive(Default)]
pub struct InMemoryUserStore {
    users: Mutex<HashMap<Uuid, UserRecord>>,
}

impl InMemoryUserStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a user; emails are unique across the store.
    pub async fn create(
        &self,
        name: &str,
        email: &str,
        password_digest: &str,
    ) -> Result<UserRecord, StoreError> {
        let mut users = self.users.lock().await;
        if users
            .values()
            .any(|record| record.email.eq_ignore_ascii_case(email))
        {
            return Err(StoreError::DuplicateEmail);
        }
        let record = UserRecord {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
            password_digest: password_digest.to_string(),
            created_at: Utc::now(),
        };
        users.insert(record.id, record.clone());
        Ok(record)
    }

    pub async fn find_by_email(&self, email: &str) -> Option<UserRecord> {
        self.users
            .lock()
            .await
            .values()
            .find(|record| record.email.eq_ignore_ascii_case(email))
            .cloned()
    }

    pub async fn get(&self, user_id: Uuid) -> Option<UserRecord> {
        self.users.lock().await.get(&user_id).cloned()
    }
}

#[derive(Debug, Clone)]
pub struct TaskRecord {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub completed: bool,
    pub owner: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TaskRecord {
    #[must_use]
    pub fn to_task(&self) -> Task {
        Task {
            id: self.id,
            title: self.title.clone(),
            description: self.description.clone(),
            completed: self.completed,
            owner: self.owner,
        }
    }
}

#[derive(Default)]
pub struct InMemoryTaskStore {
    tasks: Mutex<HashMap<Uuid, TaskRecord>>,
}

impl InMemoryTaskStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(
        &self,
        owner: Uuid,
        title: &str,
        description: &str,
        completed: bool,
    ) -> TaskRecord {
        let now = Utc::now();
        let record = TaskRecord {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: description.to_string(),
            completed,
            owner,
            created_at: now,
            updated_at: now,
        };
        self.tasks.lock().await.insert(record.id, record.clone());
        record
    }

    /// All tasks for one owner, oldest first.
    pub async fn list_by_owner(&self, owner: Uuid) -> Vec<TaskRecord> {
        let tasks = self.tasks.lock().await;
        let mut records: Vec<TaskRecord> = tasks
            .values()
            .filter(|record| record.owner == owner)
            .cloned()
            .collect();
        records.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));
        records
    }

    pub async fn find_scoped(&self, task_id: Uuid, owner: Uuid) -> Option<TaskRecord> {
        self.tasks
            .lock()
            .await
            .get(&task_id)
            .filter(|record| record.owner == owner)
            .cloned()
    }

    /// Applies the provided fields to the owner's task under one lock; `None`
    /// when the `(id, owner)` scope does not match.
    pub async fn update_scoped(
        &self,
        task_id: Uuid,
        owner: Uuid,
        patch: &TaskUpdateRequest,
    ) -> Option<TaskRecord> {
        let mut tasks = self.tasks.lock().await;
        let record = tasks
            .get_mut(&task_id)
            .filter(|record| record.owner == owner)?;
        if let Some(title) = &patch.title {
            record.title = title.clone();
        }
        if let Some(description) = &patch.description {
            record.description = description.clone();
        }
        if let Some(completed) = patch.completed {
            record.completed = completed;
        }
        record.updated_at = Utc::now();
        Some(record.clone())
    }

    /// Atomic find-and-remove scoped by `(id, owner)`.
    pub async fn remove_scoped(&self, task_id: Uuid, owner: Uuid) -> Option<TaskRecord> {
        let mut tasks = self.tasks.lock().await;
        if tasks.get(&task_id).is_some_and(|record| record.owner == owner) {
            return tasks.remove(&task_id);
        }
        None
    }
}
