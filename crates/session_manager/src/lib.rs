//! # Session Manager
//!
//! Owns the client's authentication state: persisted credentials, the
//! cached user identity and the login/logout/restore lifecycle. One
//! manager instance serves one surface (public or admin); the surface picks
//! the storage namespace and the role gate.

pub mod api;
pub mod credentials;
pub mod error;
pub mod manager;
pub mod storage;
pub mod structs;

// Re-exports
pub use api::{AuthApi, LoginRedirect, NoRedirect, Registration};
pub use credentials::{CredentialPair, CredentialStore};
pub use error::{Result, SessionError};
pub use manager::SessionManager;
pub use storage::{FileKeyValueStore, KeyValueStore, MemoryKeyValueStore};
pub use structs::{Session, SessionPhase};
