//! HTTP client for the job board API.
//!
//! Every request made through [`ApiClient`] carries the persisted access
//! token. An unauthorized response triggers one refresh and one replay;
//! when the refresh itself fails the session is cleared and the configured
//! [`LoginRedirect`](session_manager::LoginRedirect) fires.

pub mod auth;
pub mod client;
pub mod error;

pub use auth::{Anonymous, BearerAuthMiddleware, RedirectSlot, RefreshAttempt, TokenRefresher};
pub use client::ApiClient;
pub use error::{extract_detail, ApiError, Result};
