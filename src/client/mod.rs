//! State a portal front end keeps between calls: who is signed in and the
//! data last fetched from the API.

pub mod session;
pub mod store;

use tracing::info;

use crate::model::user::User;
use session::{Session, SessionError, SessionStore};
use store::AppStore;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum AuthState {
    #[default]
    SignedOut,
    /// A sign in or sign up call is running
    SigningIn,
    SignedIn(Session),
}

#[derive(Debug)]
pub struct ClientContext {
    sessions: SessionStore,
    auth: AuthState,
    pub store: AppStore,
}

impl ClientContext {
    /// Starts signed in when the session file holds a usable session.
    pub fn init(sessions: SessionStore) -> Self {
        let auth = match sessions.restore() {
            Some(session) => {
                info!(user_id = session.user.id(), "Session restored");
                AuthState::SignedIn(session)
            }
            None => AuthState::SignedOut,
        };

        Self {
            sessions,
            auth,
            store: AppStore::new(),
        }
    }

    pub fn auth(&self) -> &AuthState {
        &self.auth
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.auth, AuthState::SignedIn(_))
    }

    pub fn user(&self) -> Option<&User> {
        match &self.auth {
            AuthState::SignedIn(session) => Some(&session.user),
            _ => None,
        }
    }

    /// Value for the `Authorization` header of API calls.
    pub fn bearer(&self) -> Option<String> {
        match &self.auth {
            AuthState::SignedIn(session) => Some(format!("Bearer {}", session.token)),
            _ => None,
        }
    }

    pub fn signing_in(&mut self) {
        self.auth = AuthState::SigningIn;
    }

    /// Records a successful sign in or sign up and persists it.
    pub fn signed_in(&mut self, session: Session) -> Result<(), SessionError> {
        if let Err(e) = self.sessions.save(&session) {
            self.auth = AuthState::SignedOut;
            return Err(e);
        }
        info!(user_id = session.user.id(), name = session.user.name(), "Signed in");
        self.auth = AuthState::SignedIn(session);
        Ok(())
    }

    pub fn sign_in_failed(&mut self) {
        self.auth = AuthState::SignedOut;
    }

    /// Stores a rotated token pair for the current user.
    pub fn tokens_refreshed(&mut self, token: String, refresh_token: String) -> Result<(), SessionError> {
        let AuthState::SignedIn(session) = &mut self.auth else {
            return Ok(());
        };
        session.token = token;
        session.refresh_token = Some(refresh_token);
        self.sessions.save(session)
    }

    /// Forgets the session and everything fetched under it.
    pub fn logout(&mut self) -> Result<(), SessionError> {
        self.auth = AuthState::SignedOut;
        self.store.reset();
        self.sessions.clear()?;
        info!("Signed out");
        Ok(())
    }
}
