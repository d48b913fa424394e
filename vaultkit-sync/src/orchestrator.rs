//! Full-sync orchestration: staleness pregate, revision-date gate, snapshot
//! application, and failure propagation into the cache views.

use crate::crypto::CryptoEngine;
use crate::error::{VaultError, VaultResult};
use crate::session::{Session, SessionHooks};
use crate::views::ViewRegistry;
use chrono::{Duration, Utc};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};
use vaultkit_api::{ApiError, VaultApi};
use vaultkit_store::{SettingsStore, VaultStore};
use vaultkit_types::UserId;

/// Tunables for sync scheduling.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// How old the sync cursor may get before an opportunistic sync is
    /// considered necessary and a requested sync skips the revision-date
    /// check.
    pub staleness_window: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            staleness_window: Duration::minutes(30),
        }
    }
}

/// Runs full syncs for the active session.
///
/// At most one sync per user is in flight at a time; a second request while
/// one is running is a no-op rather than a queued duplicate.
pub struct SyncOrchestrator {
    api: Arc<dyn VaultApi>,
    store: Arc<dyn VaultStore>,
    settings: Arc<dyn SettingsStore>,
    crypto: Arc<dyn CryptoEngine>,
    hooks: Arc<dyn SessionHooks>,
    views: Arc<ViewRegistry>,
    config: SyncConfig,
    in_flight: Arc<Mutex<HashSet<UserId>>>,
}

impl SyncOrchestrator {
    pub fn new(
        api: Arc<dyn VaultApi>,
        store: Arc<dyn VaultStore>,
        settings: Arc<dyn SettingsStore>,
        crypto: Arc<dyn CryptoEngine>,
        hooks: Arc<dyn SessionHooks>,
        views: Arc<ViewRegistry>,
        config: SyncConfig,
    ) -> Self {
        Self {
            api,
            store,
            settings,
            crypto,
            hooks,
            views,
            config,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Opportunistic sync: consults only the local cursor. Syncs when no
    /// cursor exists or the cursor is older than the staleness window;
    /// otherwise returns without any network traffic.
    pub async fn sync_if_necessary(&self, session: &Session) -> VaultResult<()> {
        let user_id = session.user_id();
        if self.cursor_is_fresh(&user_id).await {
            debug!(%user_id, "sync cursor fresh, skipping opportunistic sync");
            return Ok(());
        }
        self.sync(session).await
    }

    /// Requested sync. A fresh cursor still defers to the server's account
    /// revision date: when nothing changed since the cursor, the full
    /// download is skipped and the cursor refreshed; a stale cursor forces
    /// the full download outright.
    pub async fn sync(&self, session: &Session) -> VaultResult<()> {
        let user_id = session.user_id();
        let Some(_guard) = InFlightGuard::acquire(&self.in_flight, user_id) else {
            debug!(%user_id, "sync already in flight");
            return Ok(());
        };

        if self.cursor_is_fresh(&user_id).await {
            match self.remote_changed_since_cursor(session).await {
                Ok(Superseded) => return Ok(()),
                Ok(Changed(false)) => {
                    debug!(%user_id, "vault unchanged on server, refreshing cursor");
                    self.settings.set_last_sync_time(&user_id, Utc::now()).await?;
                    return Ok(());
                }
                Ok(Changed(true)) => {}
                Err(error) => {
                    self.fail_views(&user_id, &error);
                    return Err(error.into());
                }
            }
        }

        self.full_sync(session).await
    }

    async fn full_sync(&self, session: &Session) -> VaultResult<()> {
        let user_id = session.user_id();
        let cancel = session.cancel_token();
        self.views.set_pending(&user_id);

        let snapshot = match cancel.run_until_cancelled(self.api.full_sync()).await {
            None => {
                debug!(%user_id, "session superseded mid-sync, discarding");
                return Ok(());
            }
            Some(Err(error)) => {
                self.fail_views(&user_id, &error);
                return Err(error.into());
            }
            Some(Ok(snapshot)) => snapshot,
        };

        // A changed security stamp means the credentials this session was
        // built on have been revoked. Nothing from this snapshot may be
        // written; the account is logged out instead.
        if let Some(cached) = self.settings.security_stamp(&user_id).await {
            if cached != snapshot.profile.security_stamp {
                warn!(%user_id, "security stamp changed, forcing logout");
                self.hooks
                    .force_logout(&user_id, "security stamp changed")
                    .await;
                return Err(VaultError::Internal(
                    "security stamp changed, account logged out".into(),
                ));
            }
        }

        if session.is_superseded() {
            debug!(%user_id, "session superseded mid-sync, discarding");
            return Ok(());
        }

        self.crypto
            .initialize_org_crypto(&user_id, &snapshot.profile.organizations)
            .await?;
        self.settings.store_profile(&user_id, &snapshot.profile).await?;
        self.store.replace_all(&user_id, &snapshot).await?;
        self.settings.set_last_sync_time(&user_id, Utc::now()).await?;
        info!(%user_id, ciphers = snapshot.ciphers.len(), "full sync applied");
        Ok(())
    }

    async fn cursor_is_fresh(&self, user_id: &UserId) -> bool {
        match self.settings.last_sync_time(user_id).await {
            Some(cursor) => Utc::now() - cursor <= self.config.staleness_window,
            None => false,
        }
    }

    /// Asks the server whether anything changed after the local cursor.
    async fn remote_changed_since_cursor(&self, session: &Session) -> Result<RemoteCheck, ApiError> {
        let user_id = session.user_id();
        let revision = match session
            .cancel_token()
            .run_until_cancelled(self.api.account_revision_date())
            .await
        {
            None => return Ok(Superseded),
            Some(result) => result?,
        };
        let cursor = self.settings.last_sync_time(&user_id).await;
        Ok(Changed(cursor.is_none_or(|cursor| revision > cursor)))
    }

    fn fail_views(&self, user_id: &UserId, error: &ApiError) {
        if error.is_connectivity() {
            self.views.set_unreachable(user_id);
        } else {
            self.views.set_error(user_id, &error.to_string());
        }
    }
}

/// Outcome of the revision-date probe.
enum RemoteCheck {
    /// The session was cancelled while the probe was in flight.
    Superseded,
    /// Whether the server's vault revision postdates the local cursor.
    Changed(bool),
}

use RemoteCheck::{Changed, Superseded};

/// Removes the user from the in-flight set when the sync finishes, however
/// it finishes.
struct InFlightGuard {
    set: Arc<Mutex<HashSet<UserId>>>,
    user_id: UserId,
}

impl InFlightGuard {
    fn acquire(set: &Arc<Mutex<HashSet<UserId>>>, user_id: UserId) -> Option<Self> {
        let mut guard = set.lock().expect("in-flight lock poisoned");
        if !guard.insert(user_id) {
            return None;
        }
        Some(Self {
            set: Arc::clone(set),
            user_id,
        })
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.set
            .lock()
            .expect("in-flight lock poisoned")
            .remove(&self.user_id);
    }
}
