//! In-memory store implementations backed by watch channels.

use crate::error::StoreResult;
use crate::store::{SettingsStore, VaultStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::watch;
use vaultkit_types::{
    CipherId, CipherRecord, CollectionRecord, DomainRules, FolderId, FolderRecord, Profile,
    SendId, SendRecord, SyncSnapshot, UserId,
};

/// One watch channel per entity type per user. Senders are retained so the
/// streams stay alive across subscriber turnover.
struct UserChannels {
    ciphers: watch::Sender<Vec<CipherRecord>>,
    folders: watch::Sender<Vec<FolderRecord>>,
    collections: watch::Sender<Vec<CollectionRecord>>,
    sends: watch::Sender<Vec<SendRecord>>,
    domains: watch::Sender<Option<DomainRules>>,
}

impl UserChannels {
    fn new() -> Self {
        Self {
            ciphers: watch::channel(Vec::new()).0,
            folders: watch::channel(Vec::new()).0,
            collections: watch::channel(Vec::new()).0,
            sends: watch::channel(Vec::new()).0,
            domains: watch::channel(None).0,
        }
    }
}

/// In-memory [`VaultStore`].
#[derive(Default)]
pub struct MemoryVaultStore {
    users: Mutex<HashMap<UserId, UserChannels>>,
}

impl MemoryVaultStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_user<T>(&self, user_id: &UserId, f: impl FnOnce(&UserChannels) -> T) -> T {
        let mut users = self.users.lock().expect("store lock poisoned");
        let channels = users.entry(*user_id).or_insert_with(UserChannels::new);
        f(channels)
    }
}

fn upsert_by_key<T: Clone>(
    sender: &watch::Sender<Vec<T>>,
    record: T,
    same: impl Fn(&T, &T) -> bool,
) {
    sender.send_modify(|records| {
        match records.iter_mut().find(|existing| same(existing, &record)) {
            Some(existing) => *existing = record,
            None => records.push(record),
        }
    });
}

#[async_trait]
impl VaultStore for MemoryVaultStore {
    fn ciphers(&self, user_id: &UserId) -> watch::Receiver<Vec<CipherRecord>> {
        self.with_user(user_id, |c| c.ciphers.subscribe())
    }

    fn folders(&self, user_id: &UserId) -> watch::Receiver<Vec<FolderRecord>> {
        self.with_user(user_id, |c| c.folders.subscribe())
    }

    fn collections(&self, user_id: &UserId) -> watch::Receiver<Vec<CollectionRecord>> {
        self.with_user(user_id, |c| c.collections.subscribe())
    }

    fn sends(&self, user_id: &UserId) -> watch::Receiver<Vec<SendRecord>> {
        self.with_user(user_id, |c| c.sends.subscribe())
    }

    fn domain_rules(&self, user_id: &UserId) -> watch::Receiver<Option<DomainRules>> {
        self.with_user(user_id, |c| c.domains.subscribe())
    }

    async fn replace_all(&self, user_id: &UserId, snapshot: &SyncSnapshot) -> StoreResult<()> {
        self.with_user(user_id, |c| {
            c.ciphers.send_replace(snapshot.ciphers.clone());
            c.folders.send_replace(snapshot.folders.clone());
            c.collections.send_replace(snapshot.collections.clone());
            c.sends.send_replace(snapshot.sends.clone());
            c.domains.send_replace(Some(snapshot.domains.clone()));
        });
        Ok(())
    }

    async fn upsert_cipher(&self, user_id: &UserId, record: CipherRecord) -> StoreResult<()> {
        self.with_user(user_id, |c| {
            upsert_by_key(&c.ciphers, record, |a, b| a.id == b.id);
        });
        Ok(())
    }

    async fn delete_cipher(&self, user_id: &UserId, id: CipherId) -> StoreResult<()> {
        self.with_user(user_id, |c| {
            c.ciphers.send_modify(|records| records.retain(|r| r.id != id));
        });
        Ok(())
    }

    async fn upsert_folder(&self, user_id: &UserId, record: FolderRecord) -> StoreResult<()> {
        self.with_user(user_id, |c| {
            upsert_by_key(&c.folders, record, |a, b| a.id == b.id);
        });
        Ok(())
    }

    async fn delete_folder(&self, user_id: &UserId, id: FolderId) -> StoreResult<()> {
        self.with_user(user_id, |c| {
            c.folders.send_modify(|records| records.retain(|r| r.id != id));
        });
        Ok(())
    }

    async fn upsert_send(&self, user_id: &UserId, record: SendRecord) -> StoreResult<()> {
        self.with_user(user_id, |c| {
            upsert_by_key(&c.sends, record, |a, b| a.id == b.id);
        });
        Ok(())
    }

    async fn delete_send(&self, user_id: &UserId, id: SendId) -> StoreResult<()> {
        self.with_user(user_id, |c| {
            c.sends.send_modify(|records| records.retain(|r| r.id != id));
        });
        Ok(())
    }

    async fn clear(&self, user_id: &UserId) -> StoreResult<()> {
        self.with_user(user_id, |c| {
            c.ciphers.send_replace(Vec::new());
            c.folders.send_replace(Vec::new());
            c.collections.send_replace(Vec::new());
            c.sends.send_replace(Vec::new());
            c.domains.send_replace(None);
        });
        Ok(())
    }
}

#[derive(Default, Clone)]
struct UserSettings {
    last_sync_time: Option<DateTime<Utc>>,
    profile: Option<Profile>,
}

/// In-memory [`SettingsStore`].
#[derive(Default)]
pub struct MemorySettingsStore {
    users: Mutex<HashMap<UserId, UserSettings>>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self, user_id: &UserId) -> UserSettings {
        self.users
            .lock()
            .expect("settings lock poisoned")
            .get(user_id)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn last_sync_time(&self, user_id: &UserId) -> Option<DateTime<Utc>> {
        self.read(user_id).last_sync_time
    }

    async fn set_last_sync_time(
        &self,
        user_id: &UserId,
        time: DateTime<Utc>,
    ) -> StoreResult<()> {
        self.users
            .lock()
            .expect("settings lock poisoned")
            .entry(*user_id)
            .or_default()
            .last_sync_time = Some(time);
        Ok(())
    }

    async fn security_stamp(&self, user_id: &UserId) -> Option<String> {
        self.read(user_id).profile.map(|p| p.security_stamp)
    }

    async fn profile(&self, user_id: &UserId) -> Option<Profile> {
        self.read(user_id).profile
    }

    async fn store_profile(&self, user_id: &UserId, profile: &Profile) -> StoreResult<()> {
        self.users
            .lock()
            .expect("settings lock poisoned")
            .entry(*user_id)
            .or_default()
            .profile = Some(profile.clone());
        Ok(())
    }

    async fn clear(&self, user_id: &UserId) -> StoreResult<()> {
        self.users
            .lock()
            .expect("settings lock poisoned")
            .remove(user_id);
        Ok(())
    }
}
