//! User-initiated folder mutations and the folder-reference cascade.

use crate::ciphers::require_unlocked;
use crate::crypto::CryptoEngine;
use crate::error::VaultResult;
use crate::session::SessionManager;
use crate::unlock::UnlockGate;
use std::sync::Arc;
use tracing::debug;
use vaultkit_api::VaultApi;
use vaultkit_store::VaultStore;
use vaultkit_types::{FolderId, FolderView, UserId};

/// Create/update/delete operations on folders.
pub struct FolderManager {
    api: Arc<dyn VaultApi>,
    store: Arc<dyn VaultStore>,
    crypto: Arc<dyn CryptoEngine>,
    sessions: Arc<SessionManager>,
    gate: UnlockGate,
}

impl FolderManager {
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

    pub async fn create(&self, view: &FolderView) -> VaultResult<FolderView> {
        let session = require_unlocked(&self.sessions, &self.gate)?;
        let user_id = session.user_id();
        let record = self.crypto.encrypt_folder(&user_id, view).await?;
        let created = self.api.create_folder(&record).await?;
        self.store.upsert_folder(&user_id, created.clone()).await?;
        Ok(self.crypto.decrypt_folder(&user_id, &created).await?)
    }

    pub async fn update(&self, id: FolderId, view: &FolderView) -> VaultResult<FolderView> {
        let session = require_unlocked(&self.sessions, &self.gate)?;
        let user_id = session.user_id();
        let record = self.crypto.encrypt_folder(&user_id, view).await?;
        let updated = self.api.update_folder(id, &record).await?;
        self.store.upsert_folder(&user_id, updated.clone()).await?;
        Ok(self.crypto.decrypt_folder(&user_id, &updated).await?)
    }

    /// Deletes a folder and detaches every cipher that referenced it.
    pub async fn delete(&self, id: FolderId) -> VaultResult<()> {
        let session = require_unlocked(&self.sessions, &self.gate)?;
        let user_id = session.user_id();
        self.api.delete_folder(id).await?;
        self.store.delete_folder(&user_id, id).await?;
        clear_folder_references(self.store.as_ref(), &user_id, id).await
    }
}

/// Clears `folder_id` on every cached cipher that pointed at the deleted
/// folder. Ciphers in other folders (or none) are untouched.
pub(crate) async fn clear_folder_references(
    store: &dyn VaultStore,
    user_id: &UserId,
    folder_id: FolderId,
) -> VaultResult<()> {
    let orphaned: Vec<_> = store
        .ciphers(user_id)
        .borrow()
        .iter()
        .filter(|record| record.folder_id == Some(folder_id))
        .cloned()
        .collect();
    debug!(%user_id, %folder_id, count = orphaned.len(), "detaching ciphers from deleted folder");
    for mut record in orphaned {
        record.folder_id = None;
        store.upsert_cipher(user_id, record).await?;
    }
    Ok(())
}
