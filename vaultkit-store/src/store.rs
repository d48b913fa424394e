//! The abstract store interfaces consumed by the sync core.

use crate::error::StoreResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::watch;
use vaultkit_types::{
    CipherId, CipherRecord, CollectionRecord, DomainRules, FolderId, FolderRecord, Profile,
    SendId, SendRecord, SyncSnapshot, UserId,
};

/// Per-user encrypted record storage with observable change streams.
///
/// Streams deliver the complete current list for the user; emissions are
/// observed by all subscribers in order. The core mutates the store only
/// through the primitives below — whole records, never partial fields.
#[async_trait]
pub trait VaultStore: Send + Sync {
    // ── Change streams ───────────────────────────────────────────

    fn ciphers(&self, user_id: &UserId) -> watch::Receiver<Vec<CipherRecord>>;

    fn folders(&self, user_id: &UserId) -> watch::Receiver<Vec<FolderRecord>>;

    fn collections(&self, user_id: &UserId) -> watch::Receiver<Vec<CollectionRecord>>;

    fn sends(&self, user_id: &UserId) -> watch::Receiver<Vec<SendRecord>>;

    fn domain_rules(&self, user_id: &UserId) -> watch::Receiver<Option<DomainRules>>;

    // ── Mutation primitives ──────────────────────────────────────

    /// Replaces the user's entire encrypted snapshot — wholesale, not a
    /// merge. Used by a successful full sync.
    async fn replace_all(&self, user_id: &UserId, snapshot: &SyncSnapshot) -> StoreResult<()>;

    async fn upsert_cipher(&self, user_id: &UserId, record: CipherRecord) -> StoreResult<()>;

    async fn delete_cipher(&self, user_id: &UserId, id: CipherId) -> StoreResult<()>;

    async fn upsert_folder(&self, user_id: &UserId, record: FolderRecord) -> StoreResult<()>;

    async fn delete_folder(&self, user_id: &UserId, id: FolderId) -> StoreResult<()>;

    async fn upsert_send(&self, user_id: &UserId, record: SendRecord) -> StoreResult<()>;

    async fn delete_send(&self, user_id: &UserId, id: SendId) -> StoreResult<()>;

    /// Removes every cached record for the user (logout).
    async fn clear(&self, user_id: &UserId) -> StoreResult<()>;
}

/// Per-user settings persisted outside the encrypted snapshot: the sync
/// cursor, the cached security stamp, and mutable profile fields.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// The last successful full-sync wall-clock time, if any.
    async fn last_sync_time(&self, user_id: &UserId) -> Option<DateTime<Utc>>;

    async fn set_last_sync_time(
        &self,
        user_id: &UserId,
        time: DateTime<Utc>,
    ) -> StoreResult<()>;

    /// The cached server security stamp, compared on every full sync.
    async fn security_stamp(&self, user_id: &UserId) -> Option<String>;

    /// The last persisted profile, if any.
    async fn profile(&self, user_id: &UserId) -> Option<Profile>;

    /// Persists the profile fields a sync may change (security stamp,
    /// avatar color, organization memberships, policies).
    async fn store_profile(&self, user_id: &UserId, profile: &Profile) -> StoreResult<()>;

    /// Drops all settings for the user (logout).
    async fn clear(&self, user_id: &UserId) -> StoreResult<()>;
}
