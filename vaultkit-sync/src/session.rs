//! Active-session tracking and per-identity cancellation.
//!
//! At most one user is active at a time. Activating a new user cancels the
//! previous session's token; every suspension point in the orchestrator,
//! the views, and the reconciler runs under that token, so in-flight work
//! for a replaced session is abandoned without writing anything.

use crate::error::{VaultError, VaultResult};
use async_trait::async_trait;
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use vaultkit_types::UserId;

/// One activation of a user. Cheap to clone; clones share the token.
#[derive(Debug, Clone)]
pub struct Session {
    user_id: UserId,
    cancel: CancellationToken,
}

impl Session {
    fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            cancel: CancellationToken::new(),
        }
    }

    /// The user this session belongs to.
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// The cancellation token guarding every suspension point.
    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// True once a newer session has replaced this one.
    pub fn is_superseded(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Tracks the single active session.
#[derive(Debug, Default)]
pub struct SessionManager {
    active: Mutex<Option<Session>>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Activates `user_id`, cancelling any previous session.
    pub fn activate(&self, user_id: UserId) -> Session {
        let session = Session::new(user_id);
        let mut active = self.active.lock().expect("session lock poisoned");
        if let Some(previous) = active.replace(session.clone()) {
            debug!(user_id = %previous.user_id(), "cancelling superseded session");
            previous.cancel.cancel();
        }
        session
    }

    /// Deactivates the current session, if any.
    pub fn deactivate(&self) -> Option<UserId> {
        let mut active = self.active.lock().expect("session lock poisoned");
        active.take().map(|session| {
            session.cancel.cancel();
            session.user_id()
        })
    }

    /// The current session, if one is active.
    pub fn active(&self) -> Option<Session> {
        self.active.lock().expect("session lock poisoned").clone()
    }

    /// The current session, or `InvalidState`.
    pub fn require_active(&self) -> VaultResult<Session> {
        self.active().ok_or(VaultError::InvalidState)
    }
}

/// Account-lifecycle actions the sync core can trigger but does not own.
#[async_trait]
pub trait SessionHooks: Send + Sync {
    /// Invoked when the server's security stamp no longer matches the
    /// cached one — the session's credentials have been rotated out from
    /// under it and the account must be logged out before any further
    /// vault data is written.
    async fn force_logout(&self, user_id: &UserId, reason: &str);
}
