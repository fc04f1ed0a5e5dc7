//! Session token persistence seam.
//!
//! The platform shell decides where the token actually lives (keychain,
//! shared preferences, a file); the core only needs these three operations.

use std::convert::Infallible;
use std::sync::Mutex;

pub trait TokenStore {
    type Error;

    fn load_token(&self) -> Result<Option<String>, Self::Error>;
    fn persist_token(&self, token: &str) -> Result<(), Self::Error>;
    fn clear_token(&self) -> Result<(), Self::Error>;
}

/// Process-local token store for tests and embedders without platform
/// storage. Holds at most one token, keyed implicitly like the platform
/// stores it replaces.
#[derive(Debug, Default)]
pub struct InMemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl InMemoryTokenStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_token(token: &str) -> Self {
        Self {
            token: Mutex::new(Some(token.to_string())),
        }
    }
}

impl TokenStore for InMemoryTokenStore {
    type Error = Infallible;

    fn load_token(&self) -> Result<Option<String>, Self::Error> {
        Ok(self
            .token
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone())
    }

    fn persist_token(&self, token: &str) -> Result<(), Self::Error> {
        *self
            .token
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(token.to_string());
        Ok(())
    }

    fn clear_token(&self) -> Result<(), Self::Error> {
        *self
            .token
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = None;
        Ok(())
    }
}
