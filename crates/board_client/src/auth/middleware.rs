//! Bearer decoration and the single-retry refresh protocol.

use std::sync::Arc;

use async_trait::async_trait;
use board_core::mask_token;
use http::header::AUTHORIZATION;
use http::{Extensions, HeaderValue};
use reqwest::{Request, Response, StatusCode};
use reqwest_middleware::{Middleware, Next, Result as MiddlewareResult};
use session_manager::{CredentialStore, LoginRedirect, NoRedirect};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::refresh::TokenRefresher;
use crate::error::ApiError;

/// Request extension: send without credentials (login, registration).
#[derive(Debug, Clone, Copy)]
pub struct Anonymous;

/// Request extension: the per-call retry guard.
///
/// Once `retried` is set, an unauthorized response is returned to the
/// caller as-is and no further refresh is attempted for this call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshAttempt {
    pub retried: bool,
}

/// Replaceable login redirect shared between the client and its middleware.
#[derive(Clone)]
pub struct RedirectSlot(Arc<RwLock<Arc<dyn LoginRedirect>>>);

impl Default for RedirectSlot {
    fn default() -> Self {
        Self(Arc::new(RwLock::new(Arc::new(NoRedirect))))
    }
}

impl RedirectSlot {
    pub async fn set(&self, redirect: Arc<dyn LoginRedirect>) {
        *self.0.write().await = redirect;
    }

    pub async fn redirect_to_login(&self) {
        let redirect = Arc::clone(&*self.0.read().await);
        redirect.redirect_to_login().await;
    }
}

pub(crate) fn bearer(token: &str) -> Result<HeaderValue, ApiError> {
    let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
        .map_err(|e| ApiError::InvalidToken(e.to_string()))?;
    value.set_sensitive(true);
    Ok(value)
}

/// Attaches the persisted access token and recovers from an expired one.
pub struct BearerAuthMiddleware {
    credentials: CredentialStore,
    refresher: TokenRefresher,
    redirect: RedirectSlot,
}

impl BearerAuthMiddleware {
    pub fn new(
        credentials: CredentialStore,
        refresher: TokenRefresher,
        redirect: RedirectSlot,
    ) -> Self {
        Self {
            credentials,
            refresher,
            redirect,
        }
    }

    async fn decorate(&self, req: &mut Request) -> MiddlewareResult<()> {
        req.headers_mut().remove(AUTHORIZATION);
        match self.credentials.access_token().await {
            Ok(Some(token)) => {
                let value = bearer(&token).map_err(reqwest_middleware::Error::middleware)?;
                req.headers_mut().insert(AUTHORIZATION, value);
            }
            Ok(None) => {}
            Err(e) => warn!("Could not read access token, sending without it: {}", e),
        }
        Ok(())
    }

    /// Refresh, then replay. On refresh failure the session is torn down.
    async fn refresh_and_replay(
        &self,
        response: Response,
        replay: Option<Request>,
        extensions: &mut Extensions,
        next: Next<'_>,
    ) -> MiddlewareResult<Response> {
        let refresh_token = match self.credentials.refresh_token().await {
            Ok(Some(token)) => token,
            Ok(None) => {
                debug!("Unauthorized and no refresh token stored");
                return Ok(response);
            }
            Err(e) => {
                warn!("Could not read refresh token: {}", e);
                return Ok(response);
            }
        };

        let Some(mut replay) = replay else {
            warn!("Request body cannot be replayed, returning unauthorized response");
            return Ok(response);
        };

        match self.refresher.refresh(&refresh_token).await {
            Ok(access) => {
                if let Err(e) = self.credentials.set_access_token(&access).await {
                    warn!("Failed to persist refreshed access token: {}", e);
                }
                let value = bearer(&access).map_err(reqwest_middleware::Error::middleware)?;
                replay.headers_mut().insert(AUTHORIZATION, value);
                debug!(
                    "Access token refreshed ({}), replaying {} {}",
                    mask_token(&access),
                    replay.method(),
                    replay.url()
                );
                next.run(replay, extensions).await
            }
            Err(e) => {
                warn!("Token refresh failed, ending session: {}", e);
                if let Err(clear_err) = self.credentials.clear().await {
                    warn!("Failed to clear persisted session: {}", clear_err);
                }
                self.redirect.redirect_to_login().await;
                Err(reqwest_middleware::Error::middleware(
                    ApiError::SessionExpired(e.to_string()),
                ))
            }
        }
    }
}

#[async_trait]
impl Middleware for BearerAuthMiddleware {
    async fn handle(
        &self,
        mut req: Request,
        extensions: &mut Extensions,
        next: Next<'_>,
    ) -> MiddlewareResult<Response> {
        if extensions.get::<Anonymous>().is_some() {
            req.headers_mut().remove(AUTHORIZATION);
            return next.run(req, extensions).await;
        }

        self.decorate(&mut req).await?;

        let replay = req.try_clone();
        let response = next.clone().run(req, extensions).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        let attempt = extensions.get::<RefreshAttempt>().copied().unwrap_or_default();
        if attempt.retried {
            return Ok(response);
        }
        extensions.insert(RefreshAttempt { retried: true });

        self.refresh_and_replay(response, replay, extensions, next)
            .await
    }
}
