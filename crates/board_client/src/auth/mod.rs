//! Authentication layer of the HTTP client
//!
//! Every request passes through [`BearerAuthMiddleware`]:
//! 1. Attach `Authorization: Bearer <access>` from the persisted store
//! 2. On 401, if the call has not been retried yet, exchange the refresh token
//! 3. Persist the new access token and replay the call once
//! 4. If the refresh fails, clear the store and redirect to login

pub mod middleware;
pub mod refresh;

pub use middleware::{Anonymous, BearerAuthMiddleware, RedirectSlot, RefreshAttempt};
pub use refresh::TokenRefresher;
