//! Session state and its lifecycle phases

use board_core::UserIdentity;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SessionError};

/// Lifecycle phase of a session.
///
/// `Unknown → Restoring → {Authenticated, Unauthenticated}`, then
/// `Authenticated ⇄ Unauthenticated`. Re-entering the current settled
/// phase is allowed and changes nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    #[default]
    Unknown,
    Restoring,
    Authenticated,
    Unauthenticated,
}

impl SessionPhase {
    pub fn can_transition_to(self, next: SessionPhase) -> bool {
        use SessionPhase::*;
        matches!(
            (self, next),
            (Unknown, Restoring)
                | (Restoring, Authenticated)
                | (Restoring, Unauthenticated)
                | (Authenticated, Unauthenticated)
                | (Unauthenticated, Authenticated)
                | (Authenticated, Authenticated)
                | (Unauthenticated, Unauthenticated)
        )
    }

    /// Restoration has finished and login/logout may run.
    pub fn is_settled(self) -> bool {
        matches!(
            self,
            SessionPhase::Authenticated | SessionPhase::Unauthenticated
        )
    }
}

/// In-memory view of the current session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    phase: SessionPhase,
    user: Option<UserIdentity>,
    pub loading: bool,
    pub error: Option<String>,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            phase: SessionPhase::Unknown,
            user: None,
            loading: true,
            error: None,
        }
    }
}

impl Session {
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn user(&self) -> Option<&UserIdentity> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.phase == SessionPhase::Authenticated && self.user.is_some()
    }

    /// Move to `next`. `Authenticated` is only reachable through
    /// [`authenticate`](Self::authenticate), which supplies the user.
    pub(crate) fn transition(&mut self, next: SessionPhase) -> Result<()> {
        if next == SessionPhase::Authenticated {
            return Err(self.invalid(next));
        }
        self.enter(next)
    }

    pub(crate) fn authenticate(&mut self, user: UserIdentity) -> Result<()> {
        self.enter(SessionPhase::Authenticated)?;
        self.user = Some(user);
        self.error = None;
        Ok(())
    }

    fn enter(&mut self, next: SessionPhase) -> Result<()> {
        if !self.phase.can_transition_to(next) {
            return Err(self.invalid(next));
        }
        self.phase = next;
        Ok(())
    }

    fn invalid(&self, next: SessionPhase) -> SessionError {
        SessionError::InvalidTransition {
            from: self.phase,
            to: next,
        }
    }

    /// Drop the identity and fall back to `Unauthenticated`.
    ///
    /// A session that was never restored stays `Unknown`; a later restore
    /// will find the cleared store.
    pub fn tear_down(&mut self) {
        self.user = None;
        if self.phase != SessionPhase::Unknown {
            self.phase = SessionPhase::Unauthenticated;
        }
    }
}
