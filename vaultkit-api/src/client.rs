//! The abstract remote-service interface consumed by the sync core.

use crate::error::ApiResult;
use crate::models::{AttachmentDownload, AttachmentUploadSlot};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::Path;
use vaultkit_types::{
    CipherId, CipherRecord, CollectionId, EncString, FolderId, FolderRecord, SendId, SendRecord,
    SyncSnapshot,
};

/// Typed calls against the remote authority.
///
/// Every method is a single request/response exchange; retries, ordering,
/// and cache consistency are the caller's concern.
#[async_trait]
pub trait VaultApi: Send + Sync {
    // ── Sync ─────────────────────────────────────────────────────

    /// Fetches the entire profile + entity snapshot.
    async fn full_sync(&self) -> ApiResult<SyncSnapshot>;

    /// Fetches the lightweight server-side last-revision timestamp.
    async fn account_revision_date(&self) -> ApiResult<DateTime<Utc>>;

    // ── Ciphers ──────────────────────────────────────────────────

    async fn get_cipher(&self, id: CipherId) -> ApiResult<CipherRecord>;

    async fn create_cipher(&self, record: &CipherRecord) -> ApiResult<CipherRecord>;

    async fn update_cipher(&self, id: CipherId, record: &CipherRecord)
        -> ApiResult<CipherRecord>;

    async fn delete_cipher(&self, id: CipherId) -> ApiResult<()>;

    /// Moves the cipher to the trash; the deletion timestamp is managed by
    /// the caller on the locally persisted record.
    async fn soft_delete_cipher(&self, id: CipherId) -> ApiResult<()>;

    /// Restores a trashed cipher.
    async fn restore_cipher(&self, id: CipherId) -> ApiResult<()>;

    /// Moves a cipher into an organization with the given collections.
    async fn share_cipher(
        &self,
        id: CipherId,
        record: &CipherRecord,
        collection_ids: &[CollectionId],
    ) -> ApiResult<CipherRecord>;

    /// Replaces the collection membership of an already-shared cipher.
    async fn update_cipher_collections(
        &self,
        id: CipherId,
        collection_ids: &[CollectionId],
    ) -> ApiResult<()>;

    // ── Attachments ──────────────────────────────────────────────

    /// Registers an attachment on a cipher and obtains an upload slot.
    async fn create_attachment(
        &self,
        cipher_id: CipherId,
        file_name: &EncString,
        key: &EncString,
        size: u64,
    ) -> ApiResult<AttachmentUploadSlot>;

    /// Streams the encrypted file at `source` to the pre-signed slot, using
    /// the upload protocol the slot names.
    async fn upload_attachment(&self, slot: &AttachmentUploadSlot, source: &Path)
        -> ApiResult<()>;

    /// Fetches fresh download metadata for one attachment.
    async fn get_attachment(
        &self,
        cipher_id: CipherId,
        attachment_id: &str,
    ) -> ApiResult<AttachmentDownload>;

    async fn delete_attachment(&self, cipher_id: CipherId, attachment_id: &str) -> ApiResult<()>;

    /// Streams raw bytes from a pre-signed URL into `destination`.
    async fn download_content(&self, url: &str, destination: &Path) -> ApiResult<()>;

    // ── Folders ──────────────────────────────────────────────────

    async fn get_folder(&self, id: FolderId) -> ApiResult<FolderRecord>;

    async fn create_folder(&self, record: &FolderRecord) -> ApiResult<FolderRecord>;

    async fn update_folder(&self, id: FolderId, record: &FolderRecord)
        -> ApiResult<FolderRecord>;

    async fn delete_folder(&self, id: FolderId) -> ApiResult<()>;

    // ── Sends ────────────────────────────────────────────────────

    async fn get_send(&self, id: SendId) -> ApiResult<SendRecord>;

    async fn create_send(&self, record: &SendRecord) -> ApiResult<SendRecord>;

    async fn update_send(&self, id: SendId, record: &SendRecord) -> ApiResult<SendRecord>;

    async fn delete_send(&self, id: SendId) -> ApiResult<()>;
}
