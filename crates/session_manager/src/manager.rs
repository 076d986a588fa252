//! Session Manager service

use crate::api::{AuthApi, LoginRedirect, Registration};
use crate::credentials::CredentialStore;
use crate::error::{Result, SessionError};
use crate::storage::KeyValueStore;
use crate::structs::{Session, SessionPhase};
use async_trait::async_trait;
use board_core::{Role, RoleRequirement, Surface, UserIdentity};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

const DEFAULT_LOGIN_ERROR: &str = "Login failed";
const DEFAULT_REGISTER_ERROR: &str = "Registration failed";

/// Outcome of reading the persisted record at startup.
enum Restored {
    Session(UserIdentity),
    Empty,
    Discard(String),
}

/// Session Manager - owns the authentication state of one surface
#[derive(Clone)]
pub struct SessionManager {
    api: Arc<dyn AuthApi>,
    credentials: CredentialStore,
    requirement: RoleRequirement,
    state: Arc<RwLock<Session>>,
    // login/register/logout/restore run one at a time
    op_lock: Arc<Mutex<()>>,
}

impl SessionManager {
    /// Create a new SessionManager. Call [`restore_session`](Self::restore_session) before use.
    pub fn new(
        api: Arc<dyn AuthApi>,
        credentials: CredentialStore,
        requirement: RoleRequirement,
    ) -> Self {
        Self {
            api,
            credentials,
            requirement,
            state: Arc::new(RwLock::new(Session::default())),
            op_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Session manager using the storage namespace and role gate of `surface`
    pub fn for_surface(
        api: Arc<dyn AuthApi>,
        store: Arc<dyn KeyValueStore>,
        surface: Surface,
    ) -> Self {
        Self::new(
            api,
            CredentialStore::new(store, surface.storage_keys()),
            surface.role_requirement(),
        )
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    /// Snapshot of the current session
    pub async fn session(&self) -> Session {
        self.state.read().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.state.read().await.is_authenticated()
    }

    pub async fn current_user(&self) -> Option<UserIdentity> {
        self.state.read().await.user().cloned()
    }

    /// Rebuild the session from persisted storage. Runs once, at startup.
    ///
    /// The cached identity is trusted as-is; an expired access token is only
    /// noticed by the next API call.
    pub async fn restore_session(&self) -> Result<()> {
        let _guard = self.op_lock.lock().await;
        {
            let mut state = self.state.write().await;
            state.transition(SessionPhase::Restoring)?;
            state.loading = true;
        }

        let restored = self.read_persisted_session().await;
        if let Restored::Discard(reason) = &restored {
            warn!("Discarding persisted session: {}", reason);
            self.discard_persisted().await;
        }

        let mut state = self.state.write().await;
        let result = match restored {
            Restored::Session(user) => {
                info!("Restored session for {} ({})", user.username, user.role);
                state.authenticate(user)
            }
            Restored::Empty | Restored::Discard(_) => {
                debug!("No session to restore");
                state.transition(SessionPhase::Unauthenticated)
            }
        };
        state.loading = false;
        result
    }

    async fn read_persisted_session(&self) -> Restored {
        let pair = match self.credentials.credentials().await {
            Ok(pair) => pair,
            Err(e) => return Restored::Discard(format!("unreadable credentials: {e}")),
        };

        if pair.is_none() {
            return match self.credentials.is_empty().await {
                Ok(true) => Restored::Empty,
                Ok(false) => Restored::Discard("incomplete credential pair".to_string()),
                Err(e) => Restored::Discard(format!("unreadable storage: {e}")),
            };
        }

        match self.credentials.user().await {
            Ok(Some(user)) if self.requirement.is_satisfied_by(&user) => Restored::Session(user),
            Ok(Some(user)) => {
                Restored::Discard(format!("cached role '{}' is not allowed", user.role))
            }
            Ok(None) => Restored::Discard("no cached user identity".to_string()),
            Err(e) => Restored::Discard(format!("unreadable cached identity: {e}")),
        }
    }

    /// Log in and verify the account's role.
    ///
    /// Storage holds the full session only if every step succeeds; any
    /// failure tears the session down before the error is returned.
    pub async fn login(&self, username: &str, password: &str) -> Result<UserIdentity> {
        let _guard = self.op_lock.lock().await;
        {
            let mut state = self.state.write().await;
            if !state.phase().is_settled() {
                return Err(SessionError::InvalidTransition {
                    from: state.phase(),
                    to: SessionPhase::Authenticated,
                });
            }
            state.loading = true;
            state.error = None;
        }

        match self.establish(username, password).await {
            Ok(user) => {
                let mut state = self.state.write().await;
                state.loading = false;
                state.authenticate(user.clone())?;
                info!("Logged in as {} ({})", user.username, user.role);
                Ok(user)
            }
            Err(e) => {
                warn!("Login failed for {}: {}", username, e);
                self.discard_persisted().await;
                let mut state = self.state.write().await;
                state.tear_down();
                state.loading = false;
                state.error = Some(user_message(&e, DEFAULT_LOGIN_ERROR));
                Err(e)
            }
        }
    }

    async fn establish(&self, username: &str, password: &str) -> Result<UserIdentity> {
        let pair = self.api.authenticate(username, password).await?;
        self.credentials.save_credentials(&pair).await?;

        let user = self.api.current_identity().await?;
        if let RoleRequirement::Exactly(required) = self.requirement {
            if user.role != required {
                return Err(SessionError::AccessDenied { required });
            }
        }

        self.credentials.save_user(&user).await?;
        Ok(user)
    }

    /// Create an account. Never touches the current session or storage.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
        role: Option<Role>,
    ) -> Result<()> {
        let _guard = self.op_lock.lock().await;
        {
            let mut state = self.state.write().await;
            state.loading = true;
            state.error = None;
        }

        let registration = Registration {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            role: role.unwrap_or_default(),
        };
        let result = self.api.register(&registration).await;

        let mut state = self.state.write().await;
        state.loading = false;
        match &result {
            Ok(()) => info!("Registered account {}", username),
            Err(e) => {
                warn!("Registration failed for {}: {}", username, e);
                state.error = Some(user_message(e, DEFAULT_REGISTER_ERROR));
            }
        }
        result
    }

    /// Clear persisted credentials and the in-memory session. Never fails.
    pub async fn logout(&self) {
        let _guard = self.op_lock.lock().await;
        self.discard_persisted().await;
        self.state.write().await.tear_down();
        info!("Logged out");
    }

    async fn discard_persisted(&self) {
        if let Err(e) = self.credentials.clear().await {
            warn!("Failed to clear persisted session: {}", e);
        }
    }

    /// Redirect hook for the HTTP layer: tears the in-memory session down,
    /// then hands over to `next`.
    pub fn login_redirect(&self, next: Arc<dyn LoginRedirect>) -> Arc<dyn LoginRedirect> {
        Arc::new(SessionTeardown {
            state: Arc::clone(&self.state),
            next,
        })
    }
}

fn user_message(error: &SessionError, fallback: &str) -> String {
    let message = error.to_string();
    if message.trim().is_empty() {
        fallback.to_string()
    } else {
        message
    }
}

struct SessionTeardown {
    state: Arc<RwLock<Session>>,
    next: Arc<dyn LoginRedirect>,
}

#[async_trait]
impl LoginRedirect for SessionTeardown {
    async fn redirect_to_login(&self) {
        self.state.write().await.tear_down();
        info!("Session expired, redirecting to login");
        self.next.redirect_to_login().await;
    }
}
