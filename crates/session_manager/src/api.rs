//! Seams between the session layer and the HTTP client

use async_trait::async_trait;
use board_core::{Role, UserIdentity};
use serde::Serialize;

use crate::credentials::CredentialPair;
use crate::error::Result;

/// Body of `POST /auth/register/`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

/// Authentication calls the session manager depends on.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Exchange username and password for a credential pair
    async fn authenticate(&self, username: &str, password: &str) -> Result<CredentialPair>;

    /// Create a new account
    async fn register(&self, registration: &Registration) -> Result<()>;

    /// Fetch the caller's user record with the persisted access token
    async fn current_identity(&self) -> Result<UserIdentity>;
}

/// Sends the user back to the login entry point after the session dies.
#[async_trait]
pub trait LoginRedirect: Send + Sync {
    async fn redirect_to_login(&self);
}

/// Redirect that does nothing.
pub struct NoRedirect;

#[async_trait]
impl LoginRedirect for NoRedirect {
    async fn redirect_to_login(&self) {}
}
