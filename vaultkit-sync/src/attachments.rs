//! Attachment upload, download, and deletion.
//!
//! File contents are staged through temporary files so plaintext and
//! ciphertext never share a path: uploads encrypt into a staging file before
//! any network traffic, downloads land ciphertext in a staging file that is
//! removed whether or not decryption succeeds.

use crate::ciphers::require_unlocked;
use crate::crypto::CryptoEngine;
use crate::error::{VaultError, VaultResult};
use crate::session::SessionManager;
use crate::unlock::UnlockGate;
use std::path::Path;
use std::sync::Arc;
use tempfile::NamedTempFile;
use tracing::info;
use vaultkit_api::VaultApi;
use vaultkit_store::VaultStore;
use vaultkit_types::{AttachmentRecord, CipherId, CipherRecord, CipherView, UserId};

/// Attachment transfer operations.
pub struct AttachmentManager {
    api: Arc<dyn VaultApi>,
    store: Arc<dyn VaultStore>,
    crypto: Arc<dyn CryptoEngine>,
    sessions: Arc<SessionManager>,
    gate: UnlockGate,
}

impl AttachmentManager {
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

    /// Encrypts the file at `source` and attaches it to a cipher.
    ///
    /// The server assigns the attachment id and returns the refreshed
    /// cipher, which replaces the cached copy.
    pub async fn upload(
        &self,
        cipher_id: CipherId,
        file_name: &str,
        source: &Path,
    ) -> VaultResult<CipherView> {
        let session = require_unlocked(&self.sessions, &self.gate)?;
        let user_id = session.user_id();

        let staged = NamedTempFile::new()?;
        let (enc_file_name, key) = self
            .crypto
            .encrypt_attachment(&user_id, file_name, source, staged.path())
            .await?;
        let size = tokio::fs::metadata(staged.path()).await?.len();

        let slot = self
            .api
            .create_attachment(cipher_id, &enc_file_name, &key, size)
            .await?;
        let result = self.api.upload_attachment(&slot, staged.path()).await;
        let _ = staged.close();
        result?;

        self.store.upsert_cipher(&user_id, slot.cipher.clone()).await?;
        info!(%user_id, %cipher_id, size, "attachment uploaded");
        Ok(self.crypto.decrypt_cipher(&user_id, &slot.cipher).await?)
    }

    /// Downloads an attachment's ciphertext and decrypts it to
    /// `destination`. Fails without network traffic when the cipher does
    /// not carry the attachment.
    pub async fn download(
        &self,
        cipher_id: CipherId,
        attachment_id: &str,
        destination: &Path,
    ) -> VaultResult<()> {
        let session = require_unlocked(&self.sessions, &self.gate)?;
        let user_id = session.user_id();

        let record = self.cached_record(&user_id, cipher_id)?;
        let attachment = record
            .attachments
            .iter()
            .find(|attachment| attachment.id == attachment_id)
            .cloned()
            .ok_or_else(|| {
                VaultError::Internal(format!(
                    "cipher {cipher_id} has no attachment {attachment_id}"
                ))
            })?;

        // Download URLs are short-lived; always fetch fresh metadata
        // instead of trusting the cached record's URL.
        let metadata = self.api.get_attachment(cipher_id, attachment_id).await?;
        let url = metadata.url.ok_or_else(|| {
            VaultError::Internal(format!("no download location for attachment {attachment_id}"))
        })?;

        let staged = NamedTempFile::new()?;
        let result = match self.api.download_content(&url, staged.path()).await {
            Ok(()) => self
                .crypto
                .decrypt_attachment(&user_id, &attachment.key, staged.path(), destination)
                .await
                .map_err(VaultError::from),
            Err(error) => Err(error.into()),
        };
        let _ = staged.close();
        result
    }

    /// Deletes an attachment on the server and removes it from the cached
    /// cipher.
    pub async fn delete(&self, cipher_id: CipherId, attachment_id: &str) -> VaultResult<CipherView> {
        let session = require_unlocked(&self.sessions, &self.gate)?;
        let user_id = session.user_id();
        let mut record = self.cached_record(&user_id, cipher_id)?;

        self.api.delete_attachment(cipher_id, attachment_id).await?;
        record
            .attachments
            .retain(|attachment: &AttachmentRecord| attachment.id != attachment_id);
        self.store.upsert_cipher(&user_id, record.clone()).await?;
        Ok(self.crypto.decrypt_cipher(&user_id, &record).await?)
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
