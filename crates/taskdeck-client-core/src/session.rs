//! Session lifecycle and current-user state.
//!
//! An explicit session object owned by the shell and passed by reference to
//! the view layer; observers are notified after every state transition so the
//! route guard can re-evaluate. There is no ambient singleton.

use std::fmt::Display;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use taskdeck_wire::{LoginRequest, SignupRequest, User};
use thiserror::Error;
use uuid::Uuid;

use crate::store::TokenStore;
use crate::transport::AuthTransport;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthInputError {
    #[error("email must not be empty")]
    EmptyEmail,
    #[error("password must not be empty")]
    EmptyPassword,
    #[error("name must not be empty")]
    EmptyName,
}

#[derive(Debug, Error)]
pub enum SessionError<E: Display> {
    #[error(transparent)]
    Input(#[from] AuthInputError),
    #[error("{0}")]
    Transport(E),
    #[error("failed to persist session token: {0}")]
    TokenPersist(String),
}

/// What the view layer renders from: the current user (if any) and whether
/// startup restoration is still running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub user: Option<User>,
    pub loading: bool,
}

impl SessionSnapshot {
    #[must_use]
    pub fn signed_in(&self) -> bool {
        self.user.is_some()
    }
}

pub trait SessionObserver: Send + Sync {
    fn session_changed(&self, snapshot: &SessionSnapshot);
}

pub struct SessionManager<S, A> {
    tokens: S,
    transport: A,
    state: Mutex<SessionSnapshot>,
    observers: Mutex<Vec<Arc<dyn SessionObserver>>>,
}

pub fn normalize_email(raw: &str) -> Result<String, AuthInputError> {
    let normalized = raw.trim().to_lowercase();
    if normalized.is_empty() {
        return Err(AuthInputError::EmptyEmail);
    }
    Ok(normalized)
}

impl<S, A> SessionManager<S, A>
where
    S: TokenStore,
    S::Error: Display,
    A: AuthTransport,
    A::Error: Display,
{
    #[must_use]
    pub fn new(tokens: S, transport: A) -> Self {
        Self {
            tokens,
            transport,
            state: Mutex::new(SessionSnapshot {
                user: None,
                loading: true,
            }),
            observers: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.lock_state().clone()
    }

    pub fn subscribe(&self, observer: Arc<dyn SessionObserver>) {
        self.observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(observer);
    }

    /// Startup restoration, run once before the first screen renders.
    ///
    /// A persisted token restores a placeholder signed-in user. The token is
    /// NOT validated against the server, so a stale or revoked token still
    /// restores as signed in until the first authenticated call fails.
    // TODO: validate the stored token via a profile fetch once the API grows
    // a profile endpoint.
    pub fn restore_session(&self) {
        let user = match self.tokens.load_token() {
            Ok(Some(_)) => {
                tracing::warn!("restoring session from stored token without server validation");
                Some(placeholder_user())
            }
            Ok(None) => None,
            Err(error) => {
                tracing::warn!(error = %error, "failed to read persisted session token");
                None
            }
        };
        {
            let mut state = self.lock_state();
            state.user = user;
            state.loading = false;
        }
        self.notify();
    }

    pub async fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> Result<User, SessionError<A::Error>> {
        let email = normalize_email(email)?;
        if password.is_empty() {
            return Err(AuthInputError::EmptyPassword.into());
        }
        let response = self
            .transport
            .login(LoginRequest {
                email,
                password: password.to_string(),
            })
            .await
            .map_err(SessionError::Transport)?;
        self.install_session(response.token, response.user)
    }

    pub async fn sign_up(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<User, SessionError<A::Error>> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AuthInputError::EmptyName.into());
        }
        let email = normalize_email(email)?;
        if password.is_empty() {
            return Err(AuthInputError::EmptyPassword.into());
        }
        let response = self
            .transport
            .signup(SignupRequest {
                name: name.to_string(),
                email,
                password: password.to_string(),
            })
            .await
            .map_err(SessionError::Transport)?;
        self.install_session(response.token, response.user)
    }

    /// Clears the persisted token and the current user. Token-store failures
    /// are logged, never surfaced; the in-memory session ends regardless.
    pub fn sign_out(&self) {
        if let Err(error) = self.tokens.clear_token() {
            tracing::warn!(error = %error, "failed to clear persisted session token");
        }
        {
            let mut state = self.lock_state();
            state.user = None;
        }
        self.notify();
    }

    fn install_session(&self, token: String, user: User) -> Result<User, SessionError<A::Error>> {
        self.tokens
            .persist_token(&token)
            .map_err(|error| SessionError::TokenPersist(error.to_string()))?;
        {
            let mut state = self.lock_state();
            state.user = Some(user.clone());
            state.loading = false;
        }
        self.notify();
        Ok(user)
    }

    fn notify(&self) {
        let observers: Vec<_> = self
            .observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        let snapshot = self.snapshot();
        for observer in observers {
            observer.session_changed(&snapshot);
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, SessionSnapshot> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Stand-in identity for a restored-but-unvalidated session; replaced on the
/// next successful sign-in.
fn placeholder_user() -> User {
    User {
        id: Uuid::nil(),
        name: "User".to_string(),
        email: "user@example.com".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use taskdeck_wire::AuthResponse;

    use super::*;
    use crate::store::InMemoryTokenStore;

    struct ScriptedAuth {
        login_result: Result<AuthResponse, String>,
        signup_result: Result<AuthResponse, String>,
        login_calls: AtomicUsize,
    }

    impl ScriptedAuth {
        fn succeeding(user: User) -> Self {
            let response = AuthResponse {
                token: "tok_abc".to_string(),
                user,
            };
            Self {
                login_result: Ok(response.clone()),
                signup_result: Ok(response),
                login_calls: AtomicUsize::new(0),
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                login_result: Err(message.to_string()),
                signup_result: Err(message.to_string()),
                login_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl AuthTransport for ScriptedAuth {
        type Error = String;

        async fn login(&self, _request: LoginRequest) -> Result<AuthResponse, Self::Error> {
            self.login_calls.fetch_add(1, Ordering::SeqCst);
            self.login_result.clone()
        }

        async fn signup(&self, _request: SignupRequest) -> Result<AuthResponse, Self::Error> {
            self.signup_result.clone()
        }
    }

    struct FailingTokenStore;

    impl TokenStore for FailingTokenStore {
        type Error = String;

        fn load_token(&self) -> Result<Option<String>, Self::Error> {
            Err("storage unavailable".to_string())
        }

        fn persist_token(&self, _token: &str) -> Result<(), Self::Error> {
            Err("storage unavailable".to_string())
        }

        fn clear_token(&self) -> Result<(), Self::Error> {
            Err("storage unavailable".to_string())
        }
    }

    struct RecordingObserver {
        snapshots: StdMutex<Vec<SessionSnapshot>>,
    }

    impl SessionObserver for RecordingObserver {
        fn session_changed(&self, snapshot: &SessionSnapshot) {
            self.snapshots
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(snapshot.clone());
        }
    }

    fn test_user() -> User {
        User {
            id: Uuid::new_v4(),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
        }
    }

    #[tokio::test]
    async fn sign_in_persists_token_and_sets_user() {
        let user = test_user();
        let session =
            SessionManager::new(InMemoryTokenStore::new(), ScriptedAuth::succeeding(user.clone()));

        let signed_in = session
            .sign_in("  Ada@Example.com ", "password123")
            .await
            .expect("sign in");

        assert_eq!(signed_in, user);
        assert_eq!(session.snapshot().user, Some(user));
        assert!(!session.snapshot().loading);
        assert_eq!(
            session.tokens.load_token(),
            Ok(Some("tok_abc".to_string()))
        );
    }

    #[tokio::test]
    async fn failed_sign_in_leaves_session_unchanged() {
        let session = SessionManager::new(
            InMemoryTokenStore::new(),
            ScriptedAuth::failing("invalid email or password"),
        );

        let error = session
            .sign_in("ada@example.com", "nope")
            .await
            .expect_err("sign in should fail");

        assert_eq!(error.to_string(), "invalid email or password");
        assert_eq!(session.snapshot().user, None);
        assert_eq!(session.tokens.load_token(), Ok(None));
    }

    #[tokio::test]
    async fn empty_email_is_rejected_before_any_network_call() {
        let transport = ScriptedAuth::succeeding(test_user());
        let session = SessionManager::new(InMemoryTokenStore::new(), transport);

        let error = session
            .sign_in("   ", "password123")
            .await
            .expect_err("empty email");

        assert!(matches!(
            error,
            SessionError::Input(AuthInputError::EmptyEmail)
        ));
        assert_eq!(session.transport.login_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn sign_up_rejects_blank_name() {
        let session =
            SessionManager::new(InMemoryTokenStore::new(), ScriptedAuth::succeeding(test_user()));

        let error = session
            .sign_up("  ", "ada@example.com", "password123")
            .await
            .expect_err("blank name");
        assert!(matches!(
            error,
            SessionError::Input(AuthInputError::EmptyName)
        ));
    }

    #[tokio::test]
    async fn sign_out_clears_user_even_when_the_store_fails() {
        let session =
            SessionManager::new(FailingTokenStore, ScriptedAuth::succeeding(test_user()));
        {
            let mut state = session.lock_state();
            state.user = Some(test_user());
            state.loading = false;
        }

        session.sign_out();

        assert_eq!(session.snapshot().user, None);
    }

    #[test]
    fn restore_with_token_restores_placeholder_user() {
        let auth: ScriptedAuth = ScriptedAuth::failing("unused");
        let session = SessionManager::new(InMemoryTokenStore::with_token("tok_old"), auth);

        session.restore_session();

        let snapshot = session.snapshot();
        assert!(snapshot.signed_in());
        assert!(!snapshot.loading);
        assert_eq!(snapshot.user.map(|user| user.id), Some(Uuid::nil()));
    }

    #[test]
    fn restore_without_token_finishes_loading_signed_out() {
        let session = SessionManager::new(
            InMemoryTokenStore::new(),
            ScriptedAuth::failing("unused"),
        );

        session.restore_session();

        let snapshot = session.snapshot();
        assert!(!snapshot.signed_in());
        assert!(!snapshot.loading);
    }

    #[tokio::test]
    async fn observers_see_every_transition() {
        let observer = Arc::new(RecordingObserver {
            snapshots: StdMutex::new(Vec::new()),
        });
        let session =
            SessionManager::new(InMemoryTokenStore::new(), ScriptedAuth::succeeding(test_user()));
        session.subscribe(observer.clone());

        session.restore_session();
        session
            .sign_in("ada@example.com", "password123")
            .await
            .expect("sign in");
        session.sign_out();

        let seen: Vec<bool> = observer
            .snapshots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(SessionSnapshot::signed_in)
            .collect();
        assert_eq!(seen, vec![false, true, false]);
    }

    #[test]
    fn infallible_store_errors_still_compile() {
        // Compile-time check that Infallible satisfies the Display bound.
        fn assert_display<E: std::fmt::Display>() {}
        assert_display::<Infallible>();
    }
}
