//! User-initiated send mutations.

use crate::ciphers::require_unlocked;
use crate::crypto::CryptoEngine;
use crate::error::VaultResult;
use crate::session::SessionManager;
use crate::unlock::UnlockGate;
use std::sync::Arc;
use vaultkit_api::VaultApi;
use vaultkit_store::VaultStore;
use vaultkit_types::{SendId, SendView};

/// Create/update/delete operations on sends.
pub struct SendManager {
    api: Arc<dyn VaultApi>,
    store: Arc<dyn VaultStore>,
    crypto: Arc<dyn CryptoEngine>,
    sessions: Arc<SessionManager>,
    gate: UnlockGate,
}

impl SendManager {
    pub fn new(
        api: Arc<dyn VaultApi>,
        store: Arc<dyn VaultStore>,
        crypto: Arc<dyn CryptoEngine>,
        sessions: Arc<SessionManager>,
        gate: UnlockGate,
    ) -> Self {
        Self {
            api,
            store,
            crypto,
            sessions,
            gate,
        }
    }

    pub async fn create(&self, view: &SendView) -> VaultResult<SendView> {
        let session = require_unlocked(&self.sessions, &self.gate)?;
        let user_id = session.user_id();
        let record = self.crypto.encrypt_send(&user_id, view).await?;
        let created = self.api.create_send(&record).await?;
        self.store.upsert_send(&user_id, created.clone()).await?;
        Ok(self.crypto.decrypt_send(&user_id, &created).await?)
    }

    pub async fn update(&self, id: SendId, view: &SendView) -> VaultResult<SendView> {
        let session = require_unlocked(&self.sessions, &self.gate)?;
        let user_id = session.user_id();
        let record = self.crypto.encrypt_send(&user_id, view).await?;
        let updated = self.api.update_send(id, &record).await?;
        self.store.upsert_send(&user_id, updated.clone()).await?;
        Ok(self.crypto.decrypt_send(&user_id, &updated).await?)
    }

    pub async fn delete(&self, id: SendId) -> VaultResult<()> {
        let session = require_unlocked(&self.sessions, &self.gate)?;
        let user_id = session.user_id();
        self.api.delete_send(id).await?;
        self.store.delete_send(&user_id, id).await?;
        Ok(())
    }
}
