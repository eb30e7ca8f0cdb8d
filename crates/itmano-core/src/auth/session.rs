use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use crate::api::{AccountsBackend, ApiError};
use crate::auth::TokenStore;

/// The signed-in user as far as the client is concerned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub name: String,
}

impl User {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Who is signed in right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    Authenticated(User),
}

impl SessionState {
    pub fn user(&self) -> Option<&User> {
        match self {
            SessionState::Anonymous => None,
            SessionState::Authenticated(user) => Some(user),
        }
    }
}

/// In-memory session record.
///
/// A user is present exactly when a validated token is present; the only
/// constructors are `anonymous` and `authenticated`.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Session {
    token: Option<String>,
    user: Option<User>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(token: String, user: User) -> Self {
        Self {
            token: Some(token),
            user: Some(user),
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn state(&self) -> SessionState {
        match self.user {
            Some(ref user) => SessionState::Authenticated(user.clone()),
            None => SessionState::Anonymous,
        }
    }
}

// Tokens stay out of logs
impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("user", &self.user)
            .finish()
    }
}

/// Owns the current session and keeps it in step with the token store and
/// the backend's profile endpoint.
///
/// Construct one at startup and share it (`Arc`) with every consumer.
/// Consumers read through `current_user`/`session` or follow changes through
/// `subscribe`; they change state only through `hydrate`, `commit_login` and
/// `logout`. None of those return errors: backend and storage failures are
/// logged and resolve to a signed-out session.
pub struct SessionManager {
    backend: Arc<dyn AccountsBackend>,
    store: Arc<dyn TokenStore>,
    state: watch::Sender<Session>,
    // Serializes read-modify-write transitions across the network await
    transition: Mutex<()>,
}

impl SessionManager {
    pub fn new(backend: Arc<dyn AccountsBackend>, store: Arc<dyn TokenStore>) -> Self {
        let (state, _) = watch::channel(Session::anonymous());
        Self {
            backend,
            store,
            state,
            transition: Mutex::new(()),
        }
    }

    /// Rebuild the session from the stored token.
    ///
    /// With no stored token the session is anonymous and the backend is not
    /// contacted. Otherwise the token is checked against the profile
    /// endpoint; if that fails for any reason the stored token is deleted.
    pub async fn hydrate(&self) -> SessionState {
        let _guard = self.transition.lock().await;

        let stored = match self.store.load() {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "Failed to read stored token, treating as signed out");
                None
            }
        };

        let Some(token) = stored else {
            debug!("No stored token, session is anonymous");
            self.publish(Session::anonymous());
            return SessionState::Anonymous;
        };

        match self.validate(&token).await {
            Ok(user) => {
                info!(user = %user.name, "Session restored from stored token");
                self.publish(Session::authenticated(token, user));
            }
            Err(e) => {
                if e.is_unauthorized() {
                    info!("Stored token rejected by server, signing out");
                } else {
                    warn!(error = %e, "Failed to restore session, signing out");
                }
                self.discard_stored_token();
                self.publish(Session::anonymous());
            }
        }

        self.state()
    }

    /// Record a successful login or registration.
    ///
    /// Persists the token and sets the user without contacting the backend.
    /// If the token cannot be persisted the user is still signed in for the
    /// life of this process.
    pub async fn commit_login(&self, token: impl Into<String>, username: impl Into<String>) {
        let _guard = self.transition.lock().await;

        let token = token.into();
        let user = User::new(username);

        if let Err(e) = self.store.save(&token) {
            warn!(error = %e, "Failed to persist token, session will not survive restart");
        }

        info!(user = %user.name, "Signed in");
        self.publish(Session::authenticated(token, user));
    }

    /// Sign out.
    ///
    /// The backend is told about it when a token is known, but the outcome of
    /// that call does not matter: the stored token is always deleted and the
    /// session always ends up anonymous.
    pub async fn logout(&self) {
        let _guard = self.transition.lock().await;

        let token = self.token().or_else(|| {
            self.store.load().unwrap_or_else(|e| {
                warn!(error = %e, "Failed to read stored token during logout");
                None
            })
        });

        match token {
            Some(token) => {
                if let Err(e) = self.backend.logout(&token).await {
                    warn!(error = %e, "Remote logout failed, clearing local session anyway");
                } else {
                    debug!("Remote session ended");
                }
            }
            None => debug!("Logout without a token, nothing to tell the server"),
        }

        self.discard_stored_token();
        if self.publish(Session::anonymous()) {
            info!("Signed out");
        }
    }

    /// The signed-in user, if any
    pub fn current_user(&self) -> Option<User> {
        self.state.borrow().user().cloned()
    }

    /// Snapshot of the whole session
    pub fn session(&self) -> Session {
        self.state.borrow().clone()
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().state()
    }

    /// Bearer token for authenticated requests
    pub fn token(&self) -> Option<String> {
        self.state.borrow().token().map(str::to_string)
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    /// Follow session transitions. The receiver sees the current session
    /// immediately and is woken whenever it changes.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    async fn validate(&self, token: &str) -> Result<User, ApiError> {
        let profile = self.backend.fetch_profile(token).await?;
        if profile.username.trim().is_empty() {
            return Err(ApiError::MalformedResponse(
                "Profile response has an empty username".to_string(),
            ));
        }
        Ok(User::new(profile.username))
    }

    fn discard_stored_token(&self) {
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "Failed to delete stored token");
        }
    }

    /// Replace the session, waking subscribers only on an actual change.
    fn publish(&self, next: Session) -> bool {
        self.state.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        })
    }
}
