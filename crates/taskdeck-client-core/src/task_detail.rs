//! Task detail / edit view-model.
//!
//! Backs the detail screen for both a brand-new task (no server identity
//! yet) and an existing one. A single busy flag serializes every mutating
//! operation against this screen instance; overlapping calls are dropped,
//! not queued.

use std::fmt::Display;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use taskdeck_wire::{TaskCreateRequest, TaskUpdateRequest};
use uuid::Uuid;

use crate::mutation::Mutation;
use crate::task_list::ToggleOutcome;
use crate::transport::TaskTransport;

pub const TITLE_REQUIRED_MESSAGE: &str = "Title is required";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskIdentity {
    New,
    Existing(Uuid),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded,
    /// Load failed; the screen cannot render without data, so leave it.
    GoBack,
    AlreadyBusy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Persisted; the screen navigates back.
    Saved,
    /// Title was empty after trimming; notice set, no network call issued.
    Invalid,
    /// Server call failed; notice set, stay on the screen.
    Failed,
    AlreadyBusy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// Removed on the server; the screen navigates back.
    Deleted,
    /// Nothing was ever persisted; just leave the screen.
    NotPersisted,
    Failed,
    AlreadyBusy,
}

struct DetailState {
    identity: TaskIdentity,
    title: String,
    description: String,
    completed: bool,
    busy: bool,
    error: Option<String>,
    toggle: Mutation<bool>,
}

pub struct TaskDetailModel<T> {
    transport: Arc<T>,
    state: Mutex<DetailState>,
}

impl<T> TaskDetailModel<T>
where
    T: TaskTransport,
    T::Error: Display,
{
    #[must_use]
    pub fn new_task(transport: Arc<T>) -> Self {
        Self::with_identity(transport, TaskIdentity::New)
    }

    #[must_use]
    pub fn existing(transport: Arc<T>, task_id: Uuid) -> Self {
        Self::with_identity(transport, TaskIdentity::Existing(task_id))
    }

    fn with_identity(transport: Arc<T>, identity: TaskIdentity) -> Self {
        Self {
            transport,
            state: Mutex::new(DetailState {
                identity,
                title: String::new(),
                description: String::new(),
                completed: false,
                busy: false,
                error: None,
                toggle: Mutation::Idle,
            }),
        }
    }

    /// Fetches the task and populates the editable fields. A no-op for a new
    /// task; a failure reports [`LoadOutcome::GoBack`] because the screen
    /// has nothing to render.
    pub async fn load(&self) -> LoadOutcome {
        let task_id = {
            let mut state = self.lock_state();
            if state.busy {
                return LoadOutcome::AlreadyBusy;
            }
            let TaskIdentity::Existing(task_id) = state.identity else {
                return LoadOutcome::Loaded;
            };
            state.busy = true;
            state.error = None;
            task_id
        };

        match self.transport.get_task(task_id).await {
            Ok(task) => {
                let mut state = self.lock_state();
                state.title = task.title;
                state.description = task.description;
                state.completed = task.completed;
                state.busy = false;
                LoadOutcome::Loaded
            }
            Err(error) => {
                tracing::debug!(%task_id, error = %error, "task detail load failed");
                let mut state = self.lock_state();
                state.error = Some(error.to_string());
                state.busy = false;
                LoadOutcome::GoBack
            }
        }
    }

    /// Validates and persists the current fields: create for a new task,
    /// full `{title, description, completed}` update for an existing one.
    pub async fn save(&self) -> SaveOutcome {
        let (identity, title, description, completed) = {
            let mut state = self.lock_state();
            if state.busy {
                return SaveOutcome::AlreadyBusy;
            }
            let title = state.title.trim().to_string();
            if title.is_empty() {
                state.error = Some(TITLE_REQUIRED_MESSAGE.to_string());
                return SaveOutcome::Invalid;
            }
            state.busy = true;
            state.error = None;
            (
                state.identity,
                title,
                state.description.trim().to_string(),
                state.completed,
            )
        };

        let result = match identity {
            TaskIdentity::New => {
                self.transport
                    .create_task(TaskCreateRequest {
                        title,
                        description,
                        completed,
                    })
                    .await
            }
            TaskIdentity::Existing(task_id) => {
                self.transport
                    .update_task(
                        task_id,
                        TaskUpdateRequest {
                            title: Some(title),
                            description: Some(description),
                            completed: Some(completed),
                        },
                    )
                    .await
            }
        };

        let mut state = self.lock_state();
        state.busy = false;
        match result {
            Ok(_) => SaveOutcome::Saved,
            Err(error) => {
                state.error = Some(error.to_string());
                SaveOutcome::Failed
            }
        }
    }

    pub async fn delete(&self) -> DeleteOutcome {
        let task_id = {
            let mut state = self.lock_state();
            if state.busy {
                return DeleteOutcome::AlreadyBusy;
            }
            let TaskIdentity::Existing(task_id) = state.identity else {
                return DeleteOutcome::NotPersisted;
            };
            state.busy = true;
            state.error = None;
            task_id
        };

        match self.transport.delete_task(task_id).await {
            Ok(_) => {
                self.lock_state().busy = false;
                DeleteOutcome::Deleted
            }
            Err(error) => {
                let mut state = self.lock_state();
                state.error = Some(error.to_string());
                state.busy = false;
                DeleteOutcome::Failed
            }
        }
    }

    /// Inline completion switch: optimistic local set, `{completed}`-only
    /// update, revert on failure. Only valid for an existing task.
    pub async fn set_completed(&self, value: bool) -> ToggleOutcome {
        let task_id = {
            let mut state = self.lock_state();
            if state.busy {
                return ToggleOutcome::Skipped;
            }
            let TaskIdentity::Existing(task_id) = state.identity else {
                return ToggleOutcome::Skipped;
            };
            let current = state.completed;
            if !state.toggle.begin(current) {
                return ToggleOutcome::Skipped;
            }
            state.completed = value;
            state.busy = true;
            state.error = None;
            task_id
        };

        let request = TaskUpdateRequest::completed_only(value);
        match self.transport.update_task(task_id, request).await {
            Ok(_) => {
                let mut state = self.lock_state();
                state.toggle.commit();
                state.busy = false;
                ToggleOutcome::Committed
            }
            Err(error) => {
                let mut state = self.lock_state();
                if let Some(previous) = state.toggle.roll_back() {
                    state.completed = previous;
                }
                state.error = Some(error.to_string());
                state.busy = false;
                ToggleOutcome::RolledBack
            }
        }
    }

    pub fn set_title(&self, title: &str) {
        self.lock_state().title = title.to_string();
    }

    pub fn set_description(&self, description: &str) {
        self.lock_state().description = description.to_string();
    }

    #[must_use]
    pub fn identity(&self) -> TaskIdentity {
        self.lock_state().identity
    }

    #[must_use]
    pub fn title(&self) -> String {
        self.lock_state().title.clone()
    }

    #[must_use]
    pub fn description(&self) -> String {
        self.lock_state().description.clone()
    }

    #[must_use]
    pub fn completed(&self) -> bool {
        self.lock_state().completed
    }

    #[must_use]
    pub fn busy(&self) -> bool {
        self.lock_state().busy
    }

    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.lock_state().error.clone()
    }

    pub fn dismiss_error(&self) {
        self.lock_state().error = None;
    }

    fn lock_state(&self) -> MutexGuard<'_, DetailState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
