//! Incremental reconciliation of push-driven change notifications.
//!
//! Notifications are hints, not payloads: an accepted upsert is resolved by
//! fetching the record from the server, so the disk cache only ever holds
//! server-authoritative data. Deletions apply unconditionally. Fetch
//! failures other than `NotFound` are absorbed with a warning — the next
//! full sync repairs whatever a dropped notification left behind.

use crate::error::VaultResult;
use crate::folders::clear_folder_references;
use crate::session::Session;
use crate::unlock::UnlockGate;
use std::sync::Arc;
use tracing::{debug, warn};
use vaultkit_api::{ApiError, VaultApi};
use vaultkit_store::VaultStore;
use vaultkit_types::{
    CipherDeleted, CipherUpserted, FolderDeleted, FolderUpserted, SendDeleted, SendUpserted,
};

/// Applies push notifications to the disk cache.
pub struct PushReconciler {
    api: Arc<dyn VaultApi>,
    store: Arc<dyn VaultStore>,
    gate: UnlockGate,
}

impl PushReconciler {
    pub fn new(api: Arc<dyn VaultApi>, store: Arc<dyn VaultStore>, gate: UnlockGate) -> Self {
        Self { api, store, gate }
    }

    /// Handles a cipher create/update notification.
    ///
    /// The notification is accepted when it is a creation for a cipher not
    /// yet cached, an update for one that is, or it places an
    /// organization-owned cipher into a collection this user already knows.
    /// Accepted notifications older than the cached record are dropped.
    pub async fn cipher_upserted(
        &self,
        session: &Session,
        notification: &CipherUpserted,
    ) -> VaultResult<()> {
        let user_id = session.user_id();
        if self.await_unlocked(session).await.is_none() {
            return Ok(());
        }

        let local = self
            .store
            .ciphers(&user_id)
            .borrow()
            .iter()
            .find(|record| record.id == notification.id)
            .cloned();

        let valid_create = !notification.is_update && local.is_none();
        let valid_update = notification.is_update && local.is_some();
        let valid_org_placement = notification.organization_id.is_some() && {
            let known = self.store.collections(&user_id).borrow().clone();
            notification
                .collection_ids
                .iter()
                .any(|id| known.iter().any(|collection| collection.id == *id))
        };
        if !(valid_create || valid_update || valid_org_placement) {
            debug!(cipher_id = %notification.id, "cipher notification not applicable, dropping");
            return Ok(());
        }

        if let Some(local) = &local {
            if local.revision_date >= notification.revision_date {
                debug!(cipher_id = %notification.id, "cipher notification stale, dropping");
                return Ok(());
            }
        }

        let fetched = session
            .cancel_token()
            .run_until_cancelled(self.api.get_cipher(notification.id))
            .await;
        match fetched {
            None => Ok(()),
            Some(Ok(record)) => {
                self.store.upsert_cipher(&user_id, record).await?;
                Ok(())
            }
            // Deleted between the notification and our fetch.
            Some(Err(ApiError::NotFound)) => {
                self.store.delete_cipher(&user_id, notification.id).await?;
                Ok(())
            }
            Some(Err(error)) => {
                warn!(cipher_id = %notification.id, %error, "cipher fetch failed, dropping notification");
                Ok(())
            }
        }
    }

    /// Handles a cipher deletion notification. Applies unconditionally.
    pub async fn cipher_deleted(
        &self,
        session: &Session,
        notification: &CipherDeleted,
    ) -> VaultResult<()> {
        self.store
            .delete_cipher(&session.user_id(), notification.id)
            .await?;
        Ok(())
    }

    /// Handles a folder create/update notification.
    pub async fn folder_upserted(
        &self,
        session: &Session,
        notification: &FolderUpserted,
    ) -> VaultResult<()> {
        let user_id = session.user_id();
        if self.await_unlocked(session).await.is_none() {
            return Ok(());
        }

        let local = self
            .store
            .folders(&user_id)
            .borrow()
            .iter()
            .find(|record| record.id == notification.id)
            .cloned();

        let applicable = notification.is_update == local.is_some();
        if !applicable {
            debug!(folder_id = %notification.id, "folder notification not applicable, dropping");
            return Ok(());
        }
        if let Some(local) = &local {
            if local.revision_date >= notification.revision_date {
                return Ok(());
            }
        }

        let fetched = session
            .cancel_token()
            .run_until_cancelled(self.api.get_folder(notification.id))
            .await;
        match fetched {
            None => Ok(()),
            Some(Ok(record)) => {
                self.store.upsert_folder(&user_id, record).await?;
                Ok(())
            }
            Some(Err(ApiError::NotFound)) => {
                self.store.delete_folder(&user_id, notification.id).await?;
                Ok(())
            }
            Some(Err(error)) => {
                warn!(folder_id = %notification.id, %error, "folder fetch failed, dropping notification");
                Ok(())
            }
        }
    }

    /// Handles a folder deletion: removes the folder and detaches every
    /// cipher that referenced it.
    pub async fn folder_deleted(
        &self,
        session: &Session,
        notification: &FolderDeleted,
    ) -> VaultResult<()> {
        let user_id = session.user_id();
        self.store.delete_folder(&user_id, notification.id).await?;
        clear_folder_references(self.store.as_ref(), &user_id, notification.id).await
    }

    /// Handles a send create/update notification.
    pub async fn send_upserted(
        &self,
        session: &Session,
        notification: &SendUpserted,
    ) -> VaultResult<()> {
        let user_id = session.user_id();
        if self.await_unlocked(session).await.is_none() {
            return Ok(());
        }

        let local = self
            .store
            .sends(&user_id)
            .borrow()
            .iter()
            .find(|record| record.id == notification.id)
            .cloned();

        let applicable = notification.is_update == local.is_some();
        if !applicable {
            debug!(send_id = %notification.id, "send notification not applicable, dropping");
            return Ok(());
        }
        if let Some(local) = &local {
            if local.revision_date >= notification.revision_date {
                return Ok(());
            }
        }

        let fetched = session
            .cancel_token()
            .run_until_cancelled(self.api.get_send(notification.id))
            .await;
        match fetched {
            None => Ok(()),
            Some(Ok(record)) => {
                self.store.upsert_send(&user_id, record).await?;
                Ok(())
            }
            Some(Err(ApiError::NotFound)) => {
                self.store.delete_send(&user_id, notification.id).await?;
                Ok(())
            }
            Some(Err(error)) => {
                warn!(send_id = %notification.id, %error, "send fetch failed, dropping notification");
                Ok(())
            }
        }
    }

    /// Handles a send deletion notification. Applies unconditionally.
    pub async fn send_deleted(
        &self,
        session: &Session,
        notification: &SendDeleted,
    ) -> VaultResult<()> {
        self.store
            .delete_send(&session.user_id(), notification.id)
            .await?;
        Ok(())
    }

    /// Upserts wait for the vault to unlock; a superseded session stops
    /// waiting and drops the notification.
    async fn await_unlocked(&self, session: &Session) -> Option<()> {
        session
            .cancel_token()
            .run_until_cancelled(self.gate.await_unlocked(&session.user_id()))
            .await
    }
}
