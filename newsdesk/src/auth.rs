//! Authentication state as a pure reducer.
//!
//! Commands dispatch [`AuthAction`]s as they talk to the backend; the state
//! never performs I/O itself.

use crate::models::User;

/// Where the client is in the login lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthStatus {
    #[default]
    Anonymous,
    Authenticating,
    Authenticated,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthState {
    pub status: AuthStatus,
    pub user: Option<User>,
    pub token: Option<String>,
    /// Last login failure, cleared by the next attempt.
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub enum AuthAction {
    LoginStarted,
    LoginSucceeded { user: User, token: String },
    LoginFailed(String),
    /// A token from configuration was confirmed by the backend.
    SessionRestored { user: User, token: String },
    LoggedOut,
}

impl AuthState {
    /// State for a token that has not been verified yet.
    pub fn with_token(token: Option<String>) -> Self {
        Self {
            token,
            ..Self::default()
        }
    }

    pub const fn is_authenticated(&self) -> bool {
        matches!(self.status, AuthStatus::Authenticated)
    }
}

/// Fold an action into the current state.
pub fn reduce(state: AuthState, action: AuthAction) -> AuthState {
    match action {
        AuthAction::LoginStarted => AuthState {
            status: AuthStatus::Authenticating,
            error: None,
            ..state
        },
        AuthAction::LoginSucceeded { user, token }
        | AuthAction::SessionRestored { user, token } => AuthState {
            status: AuthStatus::Authenticated,
            user: Some(user),
            token: Some(token),
            error: None,
        },
        AuthAction::LoginFailed(message) => AuthState {
            status: AuthStatus::Anonymous,
            user: None,
            token: None,
            error: Some(message),
        },
        AuthAction::LoggedOut => AuthState::default(),
    }
}
