//! The top-level vault client: one object wiring sessions, views, sync,
//! reconciliation, and mutations together.

use crate::attachments::AttachmentManager;
use crate::ciphers::CipherManager;
use crate::crypto::CryptoEngine;
use crate::error::VaultResult;
use crate::folders::FolderManager;
use crate::orchestrator::{SyncConfig, SyncOrchestrator};
use crate::reconciler::PushReconciler;
use crate::sends::SendManager;
use crate::session::{SessionHooks, SessionManager};
use crate::unlock::UnlockGate;
use crate::views::ViewRegistry;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::watch;
use vaultkit_api::VaultApi;
use vaultkit_store::{SettingsStore, VaultStore};
use vaultkit_types::{
    CipherDeleted, CipherId, CipherUpserted, CipherView, CollectionId, CollectionView,
    DomainRules, FolderDeleted, FolderId, FolderUpserted, FolderView, LoadState, SendDeleted,
    SendId, SendUpserted, SendView, UserId, VaultData,
};

/// The vault sync core.
///
/// Owns the active session, the decrypting cache views, and every pipeline
/// that touches the remote service. Key material is managed elsewhere; its
/// availability is reported through [`UnlockGate`].
pub struct VaultClient {
    sessions: Arc<SessionManager>,
    gate: UnlockGate,
    views: Arc<ViewRegistry>,
    orchestrator: SyncOrchestrator,
    reconciler: PushReconciler,
    ciphers: CipherManager,
    folders: FolderManager,
    sends: SendManager,
    attachments: AttachmentManager,
    store: Arc<dyn VaultStore>,
    settings: Arc<dyn SettingsStore>,
}

impl VaultClient {
    pub fn new(
        api: Arc<dyn VaultApi>,
        store: Arc<dyn VaultStore>,
        settings: Arc<dyn SettingsStore>,
        crypto: Arc<dyn CryptoEngine>,
        hooks: Arc<dyn SessionHooks>,
        config: SyncConfig,
    ) -> Self {
        let sessions = Arc::new(SessionManager::new());
        let gate = UnlockGate::new();
        let views = Arc::new(ViewRegistry::new(
            Arc::clone(&store),
            Arc::clone(&crypto),
            gate.clone(),
        ));
        let orchestrator = SyncOrchestrator::new(
            Arc::clone(&api),
            Arc::clone(&store),
            Arc::clone(&settings),
            Arc::clone(&crypto),
            hooks,
            Arc::clone(&views),
            config,
        );
        let reconciler = PushReconciler::new(Arc::clone(&api), Arc::clone(&store), gate.clone());
        let ciphers = CipherManager::new(
            Arc::clone(&api),
            Arc::clone(&store),
            Arc::clone(&crypto),
            Arc::clone(&sessions),
            gate.clone(),
        );
        let folders = FolderManager::new(
            Arc::clone(&api),
            Arc::clone(&store),
            Arc::clone(&crypto),
            Arc::clone(&sessions),
            gate.clone(),
        );
        let sends = SendManager::new(
            Arc::clone(&api),
            Arc::clone(&store),
            Arc::clone(&crypto),
            Arc::clone(&sessions),
            gate.clone(),
        );
        let attachments = AttachmentManager::new(
            api,
            Arc::clone(&store),
            crypto,
            Arc::clone(&sessions),
            gate.clone(),
        );
        Self {
            sessions,
            gate,
            views,
            orchestrator,
            reconciler,
            ciphers,
            folders,
            sends,
            attachments,
            store,
            settings,
        }
    }

    // ── Sessions ─────────────────────────────────────────────────

    /// Makes `user_id` the active user. Any previous session is cancelled:
    /// its in-flight work is abandoned without writes and its views are torn
    /// down. The new user's views start from `Loading`.
    pub fn set_active_user(&self, user_id: UserId) {
        let session = self.sessions.activate(user_id);
        self.views.activate(&session);
    }

    /// Deactivates the current user, cancelling in-flight work.
    pub fn clear_active_user(&self) {
        self.sessions.deactivate();
        self.views.deactivate();
    }

    /// The active user, if any.
    pub fn active_user_id(&self) -> Option<UserId> {
        self.sessions.active().map(|session| session.user_id())
    }

    /// The unlock gate. The key-management layer drives its phases; this
    /// crate only observes them.
    pub fn unlock_gate(&self) -> &UnlockGate {
        &self.gate
    }

    /// Removes every trace of a user from disk: cached records, sync
    /// cursor, profile, unlock state. Used on logout.
    pub async fn purge_user(&self, user_id: &UserId) -> VaultResult<()> {
        self.store.clear(user_id).await?;
        self.settings.clear(user_id).await?;
        self.gate.clear(user_id);
        Ok(())
    }

    // ── Sync ─────────────────────────────────────────────────────

    /// Runs a requested sync for the active user.
    pub async fn sync(&self) -> VaultResult<()> {
        let session = self.sessions.require_active()?;
        self.orchestrator.sync(&session).await
    }

    /// Runs an opportunistic sync for the active user; a fresh cursor makes
    /// this a no-op with no network traffic.
    pub async fn sync_if_necessary(&self) -> VaultResult<()> {
        let session = self.sessions.require_active()?;
        self.orchestrator.sync_if_necessary(&session).await
    }

    // ── Observable state ─────────────────────────────────────────

    pub fn ciphers_state(&self) -> Option<watch::Receiver<LoadState<Vec<CipherView>>>> {
        self.views.ciphers()
    }

    pub fn folders_state(&self) -> Option<watch::Receiver<LoadState<Vec<FolderView>>>> {
        self.views.folders()
    }

    pub fn collections_state(&self) -> Option<watch::Receiver<LoadState<Vec<CollectionView>>>> {
        self.views.collections()
    }

    pub fn sends_state(&self) -> Option<watch::Receiver<LoadState<Vec<SendView>>>> {
        self.views.sends()
    }

    pub fn domain_rules_state(&self) -> Option<watch::Receiver<LoadState<DomainRules>>> {
        self.views.domain_rules()
    }

    /// The aggregate of all four entity states.
    pub fn vault_data_state(&self) -> Option<watch::Receiver<LoadState<VaultData>>> {
        self.views.vault_data()
    }

    /// An observable view of a single cipher, projected out of the cipher
    /// list and following its changes. Carries `None` when the list loaded
    /// but the id is absent.
    pub fn cipher_view(
        &self,
        id: CipherId,
    ) -> Option<watch::Receiver<LoadState<Option<CipherView>>>> {
        self.views.cipher_view(id)
    }

    // ── Mutations ────────────────────────────────────────────────

    pub async fn create_cipher(&self, view: &CipherView) -> VaultResult<CipherView> {
        self.ciphers.create(view).await
    }

    pub async fn update_cipher(&self, id: CipherId, view: &CipherView) -> VaultResult<CipherView> {
        self.ciphers.update(id, view).await
    }

    pub async fn soft_delete_cipher(&self, id: CipherId) -> VaultResult<CipherView> {
        self.ciphers.soft_delete(id).await
    }

    pub async fn restore_cipher(&self, id: CipherId) -> VaultResult<CipherView> {
        self.ciphers.restore(id).await
    }

    pub async fn delete_cipher(&self, id: CipherId) -> VaultResult<()> {
        self.ciphers.delete_permanently(id).await
    }

    pub async fn share_cipher(
        &self,
        id: CipherId,
        view: &CipherView,
        collection_ids: &[CollectionId],
    ) -> VaultResult<CipherView> {
        self.ciphers.share(id, view, collection_ids).await
    }

    pub async fn update_cipher_collections(
        &self,
        id: CipherId,
        collection_ids: &[CollectionId],
    ) -> VaultResult<()> {
        self.ciphers.update_collections(id, collection_ids).await
    }

    pub async fn create_folder(&self, view: &FolderView) -> VaultResult<FolderView> {
        self.folders.create(view).await
    }

    pub async fn update_folder(&self, id: FolderId, view: &FolderView) -> VaultResult<FolderView> {
        self.folders.update(id, view).await
    }

    pub async fn delete_folder(&self, id: FolderId) -> VaultResult<()> {
        self.folders.delete(id).await
    }

    pub async fn create_send(&self, view: &SendView) -> VaultResult<SendView> {
        self.sends.create(view).await
    }

    pub async fn update_send(&self, id: SendId, view: &SendView) -> VaultResult<SendView> {
        self.sends.update(id, view).await
    }

    pub async fn delete_send(&self, id: SendId) -> VaultResult<()> {
        self.sends.delete(id).await
    }

    pub async fn upload_attachment(
        &self,
        cipher_id: CipherId,
        file_name: &str,
        source: &Path,
    ) -> VaultResult<CipherView> {
        self.attachments.upload(cipher_id, file_name, source).await
    }

    pub async fn download_attachment(
        &self,
        cipher_id: CipherId,
        attachment_id: &str,
        destination: &Path,
    ) -> VaultResult<()> {
        self.attachments
            .download(cipher_id, attachment_id, destination)
            .await
    }

    pub async fn delete_attachment(
        &self,
        cipher_id: CipherId,
        attachment_id: &str,
    ) -> VaultResult<CipherView> {
        self.attachments.delete(cipher_id, attachment_id).await
    }

    // ── Push notifications ───────────────────────────────────────

    pub async fn handle_cipher_upserted(&self, notification: &CipherUpserted) -> VaultResult<()> {
        let session = self.sessions.require_active()?;
        self.reconciler.cipher_upserted(&session, notification).await
    }

    pub async fn handle_cipher_deleted(&self, notification: &CipherDeleted) -> VaultResult<()> {
        let session = self.sessions.require_active()?;
        self.reconciler.cipher_deleted(&session, notification).await
    }

    pub async fn handle_folder_upserted(&self, notification: &FolderUpserted) -> VaultResult<()> {
        let session = self.sessions.require_active()?;
        self.reconciler.folder_upserted(&session, notification).await
    }

    pub async fn handle_folder_deleted(&self, notification: &FolderDeleted) -> VaultResult<()> {
        let session = self.sessions.require_active()?;
        self.reconciler.folder_deleted(&session, notification).await
    }

    pub async fn handle_send_upserted(&self, notification: &SendUpserted) -> VaultResult<()> {
        let session = self.sessions.require_active()?;
        self.reconciler.send_upserted(&session, notification).await
    }

    pub async fn handle_send_deleted(&self, notification: &SendDeleted) -> VaultResult<()> {
        let session = self.sessions.require_active()?;
        self.reconciler.send_deleted(&session, notification).await
    }
}
