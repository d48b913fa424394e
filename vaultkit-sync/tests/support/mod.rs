//! Shared test doubles and fixtures.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use vaultkit_api::{ApiError, ApiResult, AttachmentDownload, AttachmentUploadSlot, VaultApi};
use vaultkit_store::{MemorySettingsStore, MemoryVaultStore, SettingsStore, VaultStore};
use vaultkit_sync::{
    CryptoEngine, CryptoError, CryptoResult, SessionHooks, SyncConfig, UnlockPhase, VaultClient,
};
use vaultkit_types::{
    AttachmentRecord, AttachmentView, CipherId, CipherKind, CipherRecord, CipherView,
    CollectionId, CollectionRecord, DomainRules, EncString, FolderId, FolderRecord, FolderView,
    OrganizationId, OrganizationProfile, Profile, SendId, SendKind, SendRecord, SendView,
    SyncSnapshot, UserId,
};

// ── Fixtures ─────────────────────────────────────────────────────

pub fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
}

pub fn enc(plain: &str) -> EncString {
    EncString::new(format!("enc:{plain}"))
}

pub fn make_cipher(id: CipherId, name: &str, revision: DateTime<Utc>) -> CipherRecord {
    CipherRecord {
        id,
        folder_id: None,
        organization_id: None,
        collection_ids: Vec::new(),
        kind: CipherKind::Login,
        name: enc(name),
        notes: None,
        login_uri: None,
        attachments: Vec::new(),
        deleted_date: None,
        revision_date: revision,
    }
}

pub fn make_cipher_view(id: Option<CipherId>, name: &str) -> CipherView {
    CipherView {
        id,
        folder_id: None,
        organization_id: None,
        collection_ids: Vec::new(),
        kind: CipherKind::Login,
        name: name.to_string(),
        notes: None,
        login_uri: None,
        attachments: Vec::new(),
        deleted_date: None,
        revision_date: at(0),
    }
}

pub fn make_folder(id: FolderId, name: &str, revision: DateTime<Utc>) -> FolderRecord {
    FolderRecord {
        id,
        name: enc(name),
        revision_date: revision,
    }
}

pub fn make_send(id: SendId, name: &str, revision: DateTime<Utc>) -> SendRecord {
    SendRecord {
        id,
        kind: SendKind::Text,
        name: enc(name),
        text: None,
        access_id: "access".to_string(),
        deletion_date: None,
        revision_date: revision,
    }
}

pub fn make_collection(id: CollectionId, org: OrganizationId, name: &str) -> CollectionRecord {
    CollectionRecord {
        id,
        organization_id: org,
        name: enc(name),
        read_only: false,
    }
}

pub fn make_profile(user_id: UserId, stamp: &str) -> Profile {
    Profile {
        id: user_id,
        security_stamp: stamp.to_string(),
        avatar_color: Some("#ff8888".to_string()),
        organizations: Vec::new(),
        policies: Vec::new(),
    }
}

pub fn make_snapshot(user_id: UserId, stamp: &str, ciphers: Vec<CipherRecord>) -> SyncSnapshot {
    SyncSnapshot {
        profile: make_profile(user_id, stamp),
        ciphers,
        folders: Vec::new(),
        collections: Vec::new(),
        sends: Vec::new(),
        domains: DomainRules::default(),
    }
}

pub fn connectivity() -> ApiError {
    ApiError::Connectivity("connection refused".to_string())
}

// ── Fake remote service ──────────────────────────────────────────

/// One programmable endpoint: queued responses, a call counter, and a
/// per-endpoint fallback when the queue is empty.
pub struct Endpoint<T> {
    responses: Mutex<Vec<ApiResult<T>>>,
    calls: AtomicUsize,
}

impl<T> Default for Endpoint<T> {
    fn default() -> Self {
        Self {
            responses: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }
}

impl<T> Endpoint<T> {
    pub fn push(&self, response: ApiResult<T>) {
        self.responses.lock().unwrap().push(response);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn take_or(&self, fallback: impl FnOnce() -> ApiResult<T>) -> ApiResult<T> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            fallback()
        } else {
            responses.remove(0)
        }
    }
}

/// In-memory [`VaultApi`] with programmable per-endpoint responses.
///
/// Endpoints that naturally echo (create/update) fall back to returning the
/// request record; empty-response endpoints fall back to `Ok(())`; getters
/// fall back to `NotFound`.
#[derive(Default)]
pub struct FakeApi {
    pub full_sync: Endpoint<SyncSnapshot>,
    pub revision_date: Endpoint<DateTime<Utc>>,
    pub get_cipher: Endpoint<CipherRecord>,
    pub create_cipher: Endpoint<CipherRecord>,
    pub update_cipher: Endpoint<CipherRecord>,
    pub delete_cipher: Endpoint<()>,
    pub soft_delete_cipher: Endpoint<()>,
    pub restore_cipher: Endpoint<()>,
    pub share_cipher: Endpoint<CipherRecord>,
    pub update_cipher_collections: Endpoint<()>,
    pub create_attachment: Endpoint<AttachmentUploadSlot>,
    pub upload_attachment: Endpoint<()>,
    pub get_attachment: Endpoint<AttachmentDownload>,
    pub delete_attachment: Endpoint<()>,
    pub download_content: Endpoint<Vec<u8>>,
    pub get_folder: Endpoint<FolderRecord>,
    pub create_folder: Endpoint<FolderRecord>,
    pub update_folder: Endpoint<FolderRecord>,
    pub delete_folder: Endpoint<()>,
    pub get_send: Endpoint<SendRecord>,
    pub create_send: Endpoint<SendRecord>,
    pub update_send: Endpoint<SendRecord>,
    pub delete_send: Endpoint<()>,
    pub uploaded_bodies: Mutex<Vec<Vec<u8>>>,
    /// Artificial latency for `full_sync`, for tests that need the call to
    /// stay in flight across a yield point.
    pub full_sync_delay_ms: AtomicU64,
}

#[async_trait]
impl VaultApi for FakeApi {
    async fn full_sync(&self) -> ApiResult<SyncSnapshot> {
        let delay = self.full_sync_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        self.full_sync.take_or(|| Err(ApiError::NotFound))
    }

    async fn account_revision_date(&self) -> ApiResult<DateTime<Utc>> {
        self.revision_date.take_or(|| Err(ApiError::NotFound))
    }

    async fn get_cipher(&self, _id: CipherId) -> ApiResult<CipherRecord> {
        self.get_cipher.take_or(|| Err(ApiError::NotFound))
    }

    async fn create_cipher(&self, record: &CipherRecord) -> ApiResult<CipherRecord> {
        self.create_cipher.take_or(|| Ok(record.clone()))
    }

    async fn update_cipher(
        &self,
        _id: CipherId,
        record: &CipherRecord,
    ) -> ApiResult<CipherRecord> {
        self.update_cipher.take_or(|| Ok(record.clone()))
    }

    async fn delete_cipher(&self, _id: CipherId) -> ApiResult<()> {
        self.delete_cipher.take_or(|| Ok(()))
    }

    async fn soft_delete_cipher(&self, _id: CipherId) -> ApiResult<()> {
        self.soft_delete_cipher.take_or(|| Ok(()))
    }

    async fn restore_cipher(&self, _id: CipherId) -> ApiResult<()> {
        self.restore_cipher.take_or(|| Ok(()))
    }

    async fn share_cipher(
        &self,
        _id: CipherId,
        record: &CipherRecord,
        _collection_ids: &[CollectionId],
    ) -> ApiResult<CipherRecord> {
        self.share_cipher.take_or(|| Ok(record.clone()))
    }

    async fn update_cipher_collections(
        &self,
        _id: CipherId,
        _collection_ids: &[CollectionId],
    ) -> ApiResult<()> {
        self.update_cipher_collections.take_or(|| Ok(()))
    }

    async fn create_attachment(
        &self,
        _cipher_id: CipherId,
        _file_name: &EncString,
        _key: &EncString,
        _size: u64,
    ) -> ApiResult<AttachmentUploadSlot> {
        self.create_attachment.take_or(|| Err(ApiError::NotFound))
    }

    async fn upload_attachment(
        &self,
        _slot: &AttachmentUploadSlot,
        source: &Path,
    ) -> ApiResult<()> {
        let body = tokio::fs::read(source).await.expect("read staged upload");
        self.uploaded_bodies.lock().unwrap().push(body);
        self.upload_attachment.take_or(|| Ok(()))
    }

    async fn get_attachment(
        &self,
        _cipher_id: CipherId,
        _attachment_id: &str,
    ) -> ApiResult<AttachmentDownload> {
        self.get_attachment.take_or(|| Err(ApiError::NotFound))
    }

    async fn delete_attachment(
        &self,
        _cipher_id: CipherId,
        _attachment_id: &str,
    ) -> ApiResult<()> {
        self.delete_attachment.take_or(|| Ok(()))
    }

    async fn download_content(&self, _url: &str, destination: &Path) -> ApiResult<()> {
        let bytes = self.download_content.take_or(|| Err(ApiError::NotFound))?;
        tokio::fs::write(destination, bytes)
            .await
            .expect("write downloaded bytes");
        Ok(())
    }

    async fn get_folder(&self, _id: FolderId) -> ApiResult<FolderRecord> {
        self.get_folder.take_or(|| Err(ApiError::NotFound))
    }

    async fn create_folder(&self, record: &FolderRecord) -> ApiResult<FolderRecord> {
        self.create_folder.take_or(|| Ok(record.clone()))
    }

    async fn update_folder(
        &self,
        _id: FolderId,
        record: &FolderRecord,
    ) -> ApiResult<FolderRecord> {
        self.update_folder.take_or(|| Ok(record.clone()))
    }

    async fn delete_folder(&self, _id: FolderId) -> ApiResult<()> {
        self.delete_folder.take_or(|| Ok(()))
    }

    async fn get_send(&self, _id: SendId) -> ApiResult<SendRecord> {
        self.get_send.take_or(|| Err(ApiError::NotFound))
    }

    async fn create_send(&self, record: &SendRecord) -> ApiResult<SendRecord> {
        self.create_send.take_or(|| Ok(record.clone()))
    }

    async fn update_send(&self, _id: SendId, record: &SendRecord) -> ApiResult<SendRecord> {
        self.update_send.take_or(|| Ok(record.clone()))
    }

    async fn delete_send(&self, _id: SendId) -> ApiResult<()> {
        self.delete_send.take_or(|| Ok(()))
    }
}

// ── Stub crypto engine ───────────────────────────────────────────

/// Crypto double using a reversible `enc:` marker instead of real
/// cryptography. Decryption of anything without the marker fails, and the
/// whole engine can be flipped into a failing mode.
#[derive(Default)]
pub struct StubCrypto {
    pub fail_decrypt: AtomicBool,
    pub org_crypto_inits: AtomicUsize,
    /// Every ciphertext path handed to `decrypt_attachment`, so tests can
    /// check the staging file was removed afterwards.
    pub decrypt_sources: Mutex<Vec<PathBuf>>,
}

impl StubCrypto {
    fn strip(&self, value: &EncString) -> CryptoResult<String> {
        if self.fail_decrypt.load(Ordering::SeqCst) {
            return Err(CryptoError::Decrypt("forced failure".to_string()));
        }
        value
            .as_str()
            .strip_prefix("enc:")
            .map(str::to_string)
            .ok_or_else(|| CryptoError::Decrypt("missing marker".to_string()))
    }

    fn strip_opt(&self, value: &Option<EncString>) -> CryptoResult<Option<String>> {
        value.as_ref().map(|v| self.strip(v)).transpose()
    }
}

#[async_trait]
impl CryptoEngine for StubCrypto {
    async fn encrypt_cipher(
        &self,
        _user_id: &UserId,
        view: &CipherView,
    ) -> CryptoResult<CipherRecord> {
        Ok(CipherRecord {
            id: view.id.unwrap_or_else(CipherId::new),
            folder_id: view.folder_id,
            organization_id: view.organization_id,
            collection_ids: view.collection_ids.clone(),
            kind: view.kind,
            name: enc(&view.name),
            notes: view.notes.as_deref().map(enc),
            login_uri: view.login_uri.as_deref().map(enc),
            attachments: view
                .attachments
                .iter()
                .map(|attachment| AttachmentRecord {
                    id: attachment.id.clone(),
                    file_name: enc(&attachment.file_name),
                    size: attachment.size,
                    key: attachment
                        .key
                        .clone()
                        .unwrap_or_else(|| EncString::new("attkey")),
                    url: attachment.url.clone(),
                })
                .collect(),
            deleted_date: view.deleted_date,
            revision_date: view.revision_date,
        })
    }

    async fn decrypt_cipher(
        &self,
        _user_id: &UserId,
        record: &CipherRecord,
    ) -> CryptoResult<CipherView> {
        Ok(CipherView {
            id: Some(record.id),
            folder_id: record.folder_id,
            organization_id: record.organization_id,
            collection_ids: record.collection_ids.clone(),
            kind: record.kind,
            name: self.strip(&record.name)?,
            notes: self.strip_opt(&record.notes)?,
            login_uri: self.strip_opt(&record.login_uri)?,
            attachments: record
                .attachments
                .iter()
                .map(|attachment| {
                    Ok(AttachmentView {
                        id: attachment.id.clone(),
                        file_name: self.strip(&attachment.file_name)?,
                        size: attachment.size,
                        key: Some(attachment.key.clone()),
                        url: attachment.url.clone(),
                    })
                })
                .collect::<CryptoResult<Vec<_>>>()?,
            deleted_date: record.deleted_date,
            revision_date: record.revision_date,
        })
    }

    async fn decrypt_ciphers(
        &self,
        user_id: &UserId,
        records: &[CipherRecord],
    ) -> CryptoResult<Vec<CipherView>> {
        let mut views = Vec::with_capacity(records.len());
        for record in records {
            views.push(self.decrypt_cipher(user_id, record).await?);
        }
        Ok(views)
    }

    async fn encrypt_folder(
        &self,
        _user_id: &UserId,
        view: &FolderView,
    ) -> CryptoResult<FolderRecord> {
        Ok(FolderRecord {
            id: view.id.unwrap_or_else(FolderId::new),
            name: enc(&view.name),
            revision_date: view.revision_date,
        })
    }

    async fn decrypt_folder(
        &self,
        _user_id: &UserId,
        record: &FolderRecord,
    ) -> CryptoResult<FolderView> {
        Ok(FolderView {
            id: Some(record.id),
            name: self.strip(&record.name)?,
            revision_date: record.revision_date,
        })
    }

    async fn decrypt_folders(
        &self,
        user_id: &UserId,
        records: &[FolderRecord],
    ) -> CryptoResult<Vec<FolderView>> {
        let mut views = Vec::with_capacity(records.len());
        for record in records {
            views.push(self.decrypt_folder(user_id, record).await?);
        }
        Ok(views)
    }

    async fn decrypt_collections(
        &self,
        _user_id: &UserId,
        records: &[CollectionRecord],
    ) -> CryptoResult<Vec<vaultkit_types::CollectionView>> {
        records
            .iter()
            .map(|record| {
                Ok(vaultkit_types::CollectionView {
                    id: record.id,
                    organization_id: record.organization_id,
                    name: self.strip(&record.name)?,
                    read_only: record.read_only,
                })
            })
            .collect()
    }

    async fn encrypt_send(&self, _user_id: &UserId, view: &SendView) -> CryptoResult<SendRecord> {
        Ok(SendRecord {
            id: view.id.unwrap_or_else(SendId::new),
            kind: view.kind,
            name: enc(&view.name),
            text: view.text.as_deref().map(enc),
            access_id: view.access_id.clone(),
            deletion_date: view.deletion_date,
            revision_date: view.revision_date,
        })
    }

    async fn decrypt_send(
        &self,
        _user_id: &UserId,
        record: &SendRecord,
    ) -> CryptoResult<SendView> {
        Ok(SendView {
            id: Some(record.id),
            kind: record.kind,
            name: self.strip(&record.name)?,
            text: self.strip_opt(&record.text)?,
            access_id: record.access_id.clone(),
            deletion_date: record.deletion_date,
            revision_date: record.revision_date,
        })
    }

    async fn decrypt_sends(
        &self,
        user_id: &UserId,
        records: &[SendRecord],
    ) -> CryptoResult<Vec<SendView>> {
        let mut views = Vec::with_capacity(records.len());
        for record in records {
            views.push(self.decrypt_send(user_id, record).await?);
        }
        Ok(views)
    }

    async fn encrypt_attachment(
        &self,
        _user_id: &UserId,
        file_name: &str,
        source: &Path,
        destination: &Path,
    ) -> CryptoResult<(EncString, EncString)> {
        let plain = std::fs::read(source)?;
        let mut body = b"enc:".to_vec();
        body.extend_from_slice(&plain);
        std::fs::write(destination, body)?;
        Ok((enc(file_name), EncString::new("attkey")))
    }

    async fn decrypt_attachment(
        &self,
        _user_id: &UserId,
        _key: &EncString,
        source: &Path,
        destination: &Path,
    ) -> CryptoResult<()> {
        self.decrypt_sources
            .lock()
            .unwrap()
            .push(source.to_path_buf());
        if self.fail_decrypt.load(Ordering::SeqCst) {
            return Err(CryptoError::Decrypt("forced failure".to_string()));
        }
        let body = std::fs::read(source)?;
        let plain = body
            .strip_prefix(b"enc:".as_slice())
            .ok_or_else(|| CryptoError::Decrypt("missing marker".to_string()))?;
        std::fs::write(destination, plain)?;
        Ok(())
    }

    async fn initialize_org_crypto(
        &self,
        _user_id: &UserId,
        _organizations: &[OrganizationProfile],
    ) -> CryptoResult<()> {
        self.org_crypto_inits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ── Assembled client ─────────────────────────────────────────────

/// A fully wired [`VaultClient`] over the in-memory doubles, with every
/// collaborator kept reachable for programming and assertions.
pub struct TestVault {
    pub api: Arc<FakeApi>,
    pub store: Arc<MemoryVaultStore>,
    pub settings: Arc<MemorySettingsStore>,
    pub crypto: Arc<StubCrypto>,
    pub hooks: Arc<RecordingHooks>,
    pub client: VaultClient,
}

impl TestVault {
    pub fn new() -> Self {
        Self::with_config(SyncConfig::default())
    }

    pub fn with_config(config: SyncConfig) -> Self {
        let api = Arc::new(FakeApi::default());
        let store = Arc::new(MemoryVaultStore::new());
        let settings = Arc::new(MemorySettingsStore::new());
        let crypto = Arc::new(StubCrypto::default());
        let hooks = Arc::new(RecordingHooks::default());
        let client = VaultClient::new(
            Arc::clone(&api) as Arc<dyn VaultApi>,
            Arc::clone(&store) as Arc<dyn VaultStore>,
            Arc::clone(&settings) as Arc<dyn SettingsStore>,
            Arc::clone(&crypto) as Arc<dyn CryptoEngine>,
            Arc::clone(&hooks) as Arc<dyn SessionHooks>,
            config,
        );
        Self {
            api,
            store,
            settings,
            crypto,
            hooks,
            client,
        }
    }

    /// Activates `user_id` and marks its vault unlocked.
    pub fn activate_unlocked(&self, user_id: UserId) {
        self.client.set_active_user(user_id);
        self.client
            .unlock_gate()
            .set_phase(user_id, UnlockPhase::Unlocked);
    }
}

// ── Recording session hooks ──────────────────────────────────────

#[derive(Default)]
pub struct RecordingHooks {
    pub logouts: Mutex<Vec<(UserId, String)>>,
}

impl RecordingHooks {
    pub fn logout_count(&self) -> usize {
        self.logouts.lock().unwrap().len()
    }
}

#[async_trait]
impl SessionHooks for RecordingHooks {
    async fn force_logout(&self, user_id: &UserId, reason: &str) {
        self.logouts
            .lock()
            .unwrap()
            .push((*user_id, reason.to_string()));
    }
}
