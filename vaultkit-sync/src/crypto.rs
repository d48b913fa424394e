//! The crypto-engine seam.
//!
//! The sync core never performs cryptography itself; it hands records and
//! views across this trait. The engine is temporarily unavailable while the
//! vault is locked — callers gate on [`crate::unlock::UnlockGate`] before
//! invoking decryption.

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;
use vaultkit_types::{
    CipherRecord, CipherView, CollectionRecord, CollectionView, EncString, FolderRecord,
    FolderView, OrganizationProfile, SendRecord, SendView, UserId,
};

/// Result type for crypto operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors from the crypto engine.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// The vault key material is not available.
    #[error("vault is locked")]
    Locked,

    #[error("encryption failed: {0}")]
    Encrypt(String),

    #[error("decryption failed: {0}")]
    Decrypt(String),

    /// File I/O during streaming encryption/decryption.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Encryption and decryption of vault entities, scoped per user.
#[async_trait]
pub trait CryptoEngine: Send + Sync {
    // ── Ciphers ──────────────────────────────────────────────────

    async fn encrypt_cipher(&self, user_id: &UserId, view: &CipherView)
        -> CryptoResult<CipherRecord>;

    async fn decrypt_cipher(&self, user_id: &UserId, record: &CipherRecord)
        -> CryptoResult<CipherView>;

    async fn decrypt_ciphers(
        &self,
        user_id: &UserId,
        records: &[CipherRecord],
    ) -> CryptoResult<Vec<CipherView>>;

    // ── Folders ──────────────────────────────────────────────────

    async fn encrypt_folder(&self, user_id: &UserId, view: &FolderView)
        -> CryptoResult<FolderRecord>;

    async fn decrypt_folder(&self, user_id: &UserId, record: &FolderRecord)
        -> CryptoResult<FolderView>;

    async fn decrypt_folders(
        &self,
        user_id: &UserId,
        records: &[FolderRecord],
    ) -> CryptoResult<Vec<FolderView>>;

    // ── Collections ──────────────────────────────────────────────

    async fn decrypt_collections(
        &self,
        user_id: &UserId,
        records: &[CollectionRecord],
    ) -> CryptoResult<Vec<CollectionView>>;

    // ── Sends ────────────────────────────────────────────────────

    async fn encrypt_send(&self, user_id: &UserId, view: &SendView) -> CryptoResult<SendRecord>;

    async fn decrypt_send(&self, user_id: &UserId, record: &SendRecord)
        -> CryptoResult<SendView>;

    async fn decrypt_sends(
        &self,
        user_id: &UserId,
        records: &[SendRecord],
    ) -> CryptoResult<Vec<SendView>>;

    // ── Attachments ──────────────────────────────────────────────

    /// Stream-encrypts the file at `source` into `destination`, returning
    /// the encrypted file name and the wrapped per-attachment content key.
    async fn encrypt_attachment(
        &self,
        user_id: &UserId,
        file_name: &str,
        source: &Path,
        destination: &Path,
    ) -> CryptoResult<(EncString, EncString)>;

    /// Decrypts the attachment ciphertext at `source` into `destination`.
    async fn decrypt_attachment(
        &self,
        user_id: &UserId,
        key: &EncString,
        source: &Path,
        destination: &Path,
    ) -> CryptoResult<()>;

    // ── Organizations ────────────────────────────────────────────

    /// Unwraps the organization keys so organization-owned records can be
    /// decrypted. Called after every successful full sync.
    async fn initialize_org_crypto(
        &self,
        user_id: &UserId,
        organizations: &[OrganizationProfile],
    ) -> CryptoResult<()>;
}
