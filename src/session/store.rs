use std::sync::{PoisonError, RwLock};

use crate::models::User;

/// Snapshot of who is signed in
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub user: Option<User>,
    pub is_authenticated: bool,
}

/// In-memory session state. Written only by the auth operations; read by the
/// dashboard gate, the CLI and anything else that needs the current user.
#[derive(Debug, Default)]
pub struct SessionStore {
    state: RwLock<SessionState>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_user(&self, user: Option<User>) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.user = user;
    }

    pub fn set_authenticated(&self, is_authenticated: bool) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.is_authenticated = is_authenticated;
    }

    /// Record a freshly authenticated user in one step
    pub fn sign_in(&self, user: User) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.user = Some(user);
        state.is_authenticated = true;
    }

    pub fn logout(&self) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        *state = SessionState::default();
    }

    pub fn snapshot(&self) -> SessionState {
        self.state.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn user(&self) -> Option<User> {
        self.state.read().unwrap_or_else(PoisonError::into_inner).user.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.read().unwrap_or_else(PoisonError::into_inner).is_authenticated
    }
}
