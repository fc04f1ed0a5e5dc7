//! Task list view-model.
//!
//! Backs the home screen: the full owner-scoped task list, a dismissible
//! error notice, and optimistic completion toggles. The shell calls
//! [`TaskListModel::refresh`] every time the screen gains focus; there is no
//! incremental diffing.

use std::collections::HashMap;
use std::fmt::Display;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use taskdeck_wire::{Task, TaskUpdateRequest};
use uuid::Uuid;

use crate::mutation::Mutation;
use crate::transport::TaskTransport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// Server confirmed; local row reconciled with the returned task.
    Committed,
    /// Server call failed; local flip restored and an error notice set.
    RolledBack,
    /// Another mutation for this task was already in flight; dropped.
    Skipped,
}

#[derive(Default)]
struct ListState {
    tasks: Vec<Task>,
    error: Option<String>,
    pending: HashMap<Uuid, Mutation<bool>>,
}

pub struct TaskListModel<T> {
    transport: Arc<T>,
    state: Mutex<ListState>,
}

impl<T> TaskListModel<T>
where
    T: TaskTransport,
    T::Error: Display,
{
    #[must_use]
    pub fn new(transport: Arc<T>) -> Self {
        Self {
            transport,
            state: Mutex::new(ListState::default()),
        }
    }

    /// Replaces the list with the full server result. On failure the
    /// previously shown list stays intact and the error notice is set.
    pub async fn refresh(&self) -> bool {
        match self.transport.list_tasks().await {
            Ok(tasks) => {
                let mut state = self.lock_state();
                state.tasks = tasks;
                state.error = None;
                true
            }
            Err(error) => {
                tracing::debug!(error = %error, "task list refresh failed");
                let mut state = self.lock_state();
                state.error = Some(error.to_string());
                false
            }
        }
    }

    /// Optimistically flips `completed` for one task and confirms with the
    /// server. At most one update per task id is in flight; a second toggle
    /// for the same task is dropped, not queued. Different tasks may be in
    /// flight concurrently.
    pub async fn toggle_complete(&self, task_id: Uuid, current_completed: bool) -> ToggleOutcome {
        {
            let mut guard = self.lock_state();
            let state = &mut *guard;
            let slot = state.pending.entry(task_id).or_default();
            if !slot.begin(current_completed) {
                tracing::debug!(%task_id, "toggle already in flight, dropping");
                return ToggleOutcome::Skipped;
            }
            set_completed(&mut state.tasks, task_id, !current_completed);
            state.error = None;
        }

        let request = TaskUpdateRequest::completed_only(!current_completed);
        match self.transport.update_task(task_id, request).await {
            Ok(updated) => {
                let mut guard = self.lock_state();
                let state = &mut *guard;
                if let Some(slot) = state.pending.get_mut(&task_id) {
                    slot.commit();
                }
                state.pending.remove(&task_id);
                // Reconcile with the server's view in case it computed
                // fields differently than the optimistic flip.
                if let Some(row) = state.tasks.iter_mut().find(|task| task.id == task_id) {
                    *row = updated;
                }
                ToggleOutcome::Committed
            }
            Err(error) => {
                let mut guard = self.lock_state();
                let state = &mut *guard;
                let snapshot = state
                    .pending
                    .get_mut(&task_id)
                    .and_then(Mutation::roll_back);
                state.pending.remove(&task_id);
                if let Some(previous) = snapshot {
                    set_completed(&mut state.tasks, task_id, previous);
                }
                state.error = Some(error.to_string());
                ToggleOutcome::RolledBack
            }
        }
    }

    #[must_use]
    pub fn tasks(&self) -> Vec<Task> {
        self.lock_state().tasks.clone()
    }

    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.lock_state().error.clone()
    }

    pub fn dismiss_error(&self) {
        self.lock_state().error = None;
    }

    /// Whether an update for this task is in flight; the row's toggle
    /// control is disabled while true.
    #[must_use]
    pub fn is_updating(&self, task_id: Uuid) -> bool {
        self.lock_state()
            .pending
            .get(&task_id)
            .is_some_and(Mutation::is_pending)
    }

    fn lock_state(&self) -> MutexGuard<'_, ListState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn set_completed(tasks: &mut [Task], task_id: Uuid, completed: bool) {
    if let Some(task) = tasks.iter_mut().find(|task| task.id == task_id) {
        task.completed = completed;
    }
}
