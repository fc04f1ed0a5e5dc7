//! taskdeck client core.
//!
//! Transport-agnostic domain logic for taskdeck clients: session lifecycle
//! and route gating, plus the task list and task detail view-models with
//! their optimistic-update handling. UI shells supply a [`store::TokenStore`]
//! and the HTTP transports (see `taskdeck-api-client`) and render from the
//! snapshots these models expose.

pub mod mutation;
pub mod navigation;
pub mod session;
pub mod store;
pub mod task_detail;
pub mod task_list;
pub mod transport;

pub use mutation::Mutation;
pub use navigation::{NavDecision, ScreenGroup, decide};
pub use session::{
    AuthInputError, SessionError, SessionManager, SessionObserver, SessionSnapshot,
};
pub use store::{InMemoryTokenStore, TokenStore};
pub use task_detail::{DeleteOutcome, LoadOutcome, SaveOutcome, TaskDetailModel, TaskIdentity};
pub use task_list::{TaskListModel, ToggleOutcome};
pub use transport::{AuthTransport, TaskTransport};
