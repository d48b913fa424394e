//! User-initiated cipher mutations.
//!
//! Every operation follows the same shape: require an active unlocked
//! session, encrypt, send, persist the server's copy of the record, decrypt
//! back for the caller. Nothing is written to disk on any failed step.

use crate::crypto::CryptoEngine;
use crate::error::{VaultError, VaultResult};
use crate::session::{Session, SessionManager};
use crate::unlock::UnlockGate;
use chrono::Utc;
use std::sync::Arc;
use tracing::info;
use vaultkit_api::VaultApi;
use vaultkit_store::VaultStore;
use vaultkit_types::{CipherId, CipherRecord, CipherView, CollectionId, UserId};

/// Create/update/delete/share operations on ciphers.
pub struct CipherManager {
    api: Arc<dyn VaultApi>,
    store: Arc<dyn VaultStore>,
    crypto: Arc<dyn CryptoEngine>,
    sessions: Arc<SessionManager>,
    gate: UnlockGate,
}

impl CipherManager {
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

    /// Creates a cipher on the server and caches the server's copy.
    pub async fn create(&self, view: &CipherView) -> VaultResult<CipherView> {
        let session = require_unlocked(&self.sessions, &self.gate)?;
        let user_id = session.user_id();
        let record = self.crypto.encrypt_cipher(&user_id, view).await?;
        let created = self.api.create_cipher(&record).await?;
        self.store.upsert_cipher(&user_id, created.clone()).await?;
        info!(%user_id, cipher_id = %created.id, "cipher created");
        Ok(self.crypto.decrypt_cipher(&user_id, &created).await?)
    }

    /// Updates a cipher on the server and caches the server's copy.
    pub async fn update(&self, id: CipherId, view: &CipherView) -> VaultResult<CipherView> {
        let session = require_unlocked(&self.sessions, &self.gate)?;
        let user_id = session.user_id();
        let record = self.crypto.encrypt_cipher(&user_id, view).await?;
        let updated = self.api.update_cipher(id, &record).await?;
        self.store.upsert_cipher(&user_id, updated.clone()).await?;
        Ok(self.crypto.decrypt_cipher(&user_id, &updated).await?)
    }

    /// Moves a cipher to the trash. The server call carries no body; the
    /// deletion timestamp is set on the locally re-persisted record.
    pub async fn soft_delete(&self, id: CipherId) -> VaultResult<CipherView> {
        let session = require_unlocked(&self.sessions, &self.gate)?;
        let user_id = session.user_id();
        let mut record = self.cached_record(&user_id, id)?;
        self.api.soft_delete_cipher(id).await?;
        record.deleted_date = Some(Utc::now());
        self.store.upsert_cipher(&user_id, record.clone()).await?;
        Ok(self.crypto.decrypt_cipher(&user_id, &record).await?)
    }

    /// Restores a trashed cipher.
    pub async fn restore(&self, id: CipherId) -> VaultResult<CipherView> {
        let session = require_unlocked(&self.sessions, &self.gate)?;
        let user_id = session.user_id();
        let mut record = self.cached_record(&user_id, id)?;
        self.api.restore_cipher(id).await?;
        record.deleted_date = None;
        self.store.upsert_cipher(&user_id, record.clone()).await?;
        Ok(self.crypto.decrypt_cipher(&user_id, &record).await?)
    }

    /// Permanently deletes a cipher on the server and on disk.
    pub async fn delete_permanently(&self, id: CipherId) -> VaultResult<()> {
        let session = require_unlocked(&self.sessions, &self.gate)?;
        let user_id = session.user_id();
        self.api.delete_cipher(id).await?;
        self.store.delete_cipher(&user_id, id).await?;
        info!(%user_id, cipher_id = %id, "cipher deleted");
        Ok(())
    }

    /// Moves a cipher into an organization, placing it in `collection_ids`.
    /// The server's response omits the membership, so the requested list is
    /// written onto the persisted record.
    pub async fn share(
        &self,
        id: CipherId,
        view: &CipherView,
        collection_ids: &[CollectionId],
    ) -> VaultResult<CipherView> {
        let session = require_unlocked(&self.sessions, &self.gate)?;
        let user_id = session.user_id();
        let record = self.crypto.encrypt_cipher(&user_id, view).await?;
        let mut shared = self.api.share_cipher(id, &record, collection_ids).await?;
        shared.collection_ids = collection_ids.to_vec();
        self.store.upsert_cipher(&user_id, shared.clone()).await?;
        Ok(self.crypto.decrypt_cipher(&user_id, &shared).await?)
    }

    /// Replaces the collection membership of an already-shared cipher.
    pub async fn update_collections(
        &self,
        id: CipherId,
        collection_ids: &[CollectionId],
    ) -> VaultResult<()> {
        let session = require_unlocked(&self.sessions, &self.gate)?;
        let user_id = session.user_id();
        let mut record = self.cached_record(&user_id, id)?;
        self.api.update_cipher_collections(id, collection_ids).await?;
        record.collection_ids = collection_ids.to_vec();
        self.store.upsert_cipher(&user_id, record).await?;
        Ok(())
    }

    fn cached_record(&self, user_id: &UserId, id: CipherId) -> VaultResult<CipherRecord> {
        self.store
            .ciphers(user_id)
            .borrow()
            .iter()
            .find(|record| record.id == id)
            .cloned()
            .ok_or_else(|| VaultError::Internal(format!("cipher {id} not in cache")))
    }
}

/// The shared mutation precondition: an active session whose vault is
/// unlocked. Fails fast with no network traffic otherwise.
pub(crate) fn require_unlocked(
    sessions: &SessionManager,
    gate: &UnlockGate,
) -> VaultResult<Session> {
    let session = sessions.require_active()?;
    if !gate.is_unlocked(&session.user_id()) {
        return Err(VaultError::InvalidState);
    }
    Ok(session)
}
