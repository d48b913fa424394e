//! Decrypting cache views and the aggregate vault view.
//!
//! Each entity type gets one spawned pipeline per active session: a
//! combine-latest over the disk store's change stream and the unlock gate,
//! materialized into a watch channel so any number of subscribers observe
//! the same `LoadState` sequence. Whole lists are decrypted on every firing
//! — vaults are bounded by a single user's data, so batch decryption beats
//! incremental bookkeeping.
//!
//! The aggregate vault view recombines the four entity states on every
//! change; the orchestrator pushes `Pending`/`Error`/`Unreachable`
//! transitions into the entity channels directly.

use crate::crypto::{CryptoEngine, CryptoError};
use crate::session::Session;
use crate::unlock::UnlockGate;
use std::future::Future;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use vaultkit_store::VaultStore;
use vaultkit_types::{
    CipherId, CipherView, CollectionView, DomainRules, FolderView, LoadState, SendView, UserId,
    VaultData,
};

type StateSender<T> = Arc<watch::Sender<LoadState<T>>>;

/// The channels and pipeline tasks for one active session.
struct ActiveViews {
    user_id: UserId,
    cancel: CancellationToken,
    ciphers: StateSender<Vec<CipherView>>,
    folders: StateSender<Vec<FolderView>>,
    collections: StateSender<Vec<CollectionView>>,
    sends: StateSender<Vec<SendView>>,
    domains: StateSender<DomainRules>,
    vault_data: StateSender<VaultData>,
    tasks: Vec<JoinHandle<()>>,
}

impl Drop for ActiveViews {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

/// Owns the decrypting pipelines for the active user.
pub struct ViewRegistry {
    store: Arc<dyn VaultStore>,
    crypto: Arc<dyn CryptoEngine>,
    gate: UnlockGate,
    active: Mutex<Option<ActiveViews>>,
}

impl ViewRegistry {
    pub fn new(store: Arc<dyn VaultStore>, crypto: Arc<dyn CryptoEngine>, gate: UnlockGate) -> Self {
        Self {
            store,
            crypto,
            gate,
            active: Mutex::new(None),
        }
    }

    /// Tears down any previous pipelines and spawns fresh ones for the
    /// session's user. All views restart from `Loading`.
    pub fn activate(&self, session: &Session) {
        let user_id = session.user_id();
        let cancel = session.cancel_token().clone();

        let ciphers = Arc::new(watch::channel(LoadState::Loading).0);
        let folders = Arc::new(watch::channel(LoadState::Loading).0);
        let collections = Arc::new(watch::channel(LoadState::Loading).0);
        let sends = Arc::new(watch::channel(LoadState::Loading).0);
        let domains = Arc::new(watch::channel(LoadState::Loading).0);
        let vault_data = Arc::new(watch::channel(LoadState::Loading).0);

        let mut tasks = Vec::new();

        let crypto = Arc::clone(&self.crypto);
        tasks.push(spawn_decrypting_view(
            self.store.ciphers(&user_id),
            self.gate.clone(),
            user_id,
            cancel.clone(),
            Arc::clone(&ciphers),
            move |records| {
                let crypto = Arc::clone(&crypto);
                async move { crypto.decrypt_ciphers(&user_id, &records).await }
            },
        ));

        let crypto = Arc::clone(&self.crypto);
        tasks.push(spawn_decrypting_view(
            self.store.folders(&user_id),
            self.gate.clone(),
            user_id,
            cancel.clone(),
            Arc::clone(&folders),
            move |records| {
                let crypto = Arc::clone(&crypto);
                async move { crypto.decrypt_folders(&user_id, &records).await }
            },
        ));

        let crypto = Arc::clone(&self.crypto);
        tasks.push(spawn_decrypting_view(
            self.store.collections(&user_id),
            self.gate.clone(),
            user_id,
            cancel.clone(),
            Arc::clone(&collections),
            move |records| {
                let crypto = Arc::clone(&crypto);
                async move { crypto.decrypt_collections(&user_id, &records).await }
            },
        ));

        let crypto = Arc::clone(&self.crypto);
        tasks.push(spawn_decrypting_view(
            self.store.sends(&user_id),
            self.gate.clone(),
            user_id,
            cancel.clone(),
            Arc::clone(&sends),
            move |records| {
                let crypto = Arc::clone(&crypto);
                async move { crypto.decrypt_sends(&user_id, &records).await }
            },
        ));

        // Domain rules are stored in the clear; same pipeline, no crypto
        // call, still gated on unlock like every other view.
        tasks.push(spawn_decrypting_view(
            self.store.domain_rules(&user_id),
            self.gate.clone(),
            user_id,
            cancel.clone(),
            Arc::clone(&domains),
            move |rules: Option<DomainRules>| async move { Ok(rules.unwrap_or_default()) },
        ));

        tasks.push(spawn_vault_data_view(
            ciphers.subscribe(),
            folders.subscribe(),
            collections.subscribe(),
            sends.subscribe(),
            cancel.clone(),
            Arc::clone(&vault_data),
        ));

        let views = ActiveViews {
            user_id,
            cancel,
            ciphers,
            folders,
            collections,
            sends,
            domains,
            vault_data,
            tasks,
        };
        *self.active.lock().expect("view lock poisoned") = Some(views);
        debug!(%user_id, "decrypting views activated");
    }

    /// Tears down the active pipelines.
    pub fn deactivate(&self) {
        *self.active.lock().expect("view lock poisoned") = None;
    }

    fn with_active<T>(&self, f: impl FnOnce(&ActiveViews) -> T) -> Option<T> {
        self.active.lock().expect("view lock poisoned").as_ref().map(f)
    }

    // ── Subscriptions ────────────────────────────────────────────

    pub fn ciphers(&self) -> Option<watch::Receiver<LoadState<Vec<CipherView>>>> {
        self.with_active(|views| views.ciphers.subscribe())
    }

    pub fn folders(&self) -> Option<watch::Receiver<LoadState<Vec<FolderView>>>> {
        self.with_active(|views| views.folders.subscribe())
    }

    pub fn collections(&self) -> Option<watch::Receiver<LoadState<Vec<CollectionView>>>> {
        self.with_active(|views| views.collections.subscribe())
    }

    pub fn sends(&self) -> Option<watch::Receiver<LoadState<Vec<SendView>>>> {
        self.with_active(|views| views.sends.subscribe())
    }

    pub fn domain_rules(&self) -> Option<watch::Receiver<LoadState<DomainRules>>> {
        self.with_active(|views| views.domains.subscribe())
    }

    pub fn vault_data(&self) -> Option<watch::Receiver<LoadState<VaultData>>> {
        self.with_active(|views| views.vault_data.subscribe())
    }

    /// A derived view over a single cipher, recomputed whenever the cipher
    /// list changes. Carries `None` once the list loaded without the id.
    /// The forwarding task ends with the session or when every subscriber
    /// is gone.
    pub fn cipher_view(
        &self,
        id: CipherId,
    ) -> Option<watch::Receiver<LoadState<Option<CipherView>>>> {
        let guard = self.active.lock().expect("view lock poisoned");
        let views = guard.as_ref()?;
        let mut source = views.ciphers.subscribe();
        let cancel = views.cancel.clone();

        let project = move |state: &LoadState<Vec<CipherView>>| {
            state
                .clone()
                .map(|list| list.into_iter().find(|view| view.id == Some(id)))
        };
        let (sender, receiver) = watch::channel(project(&source.borrow_and_update()));
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    changed = source.changed() => if changed.is_err() { break },
                }
                let projected = project(&source.borrow_and_update());
                if sender.send(projected).is_err() {
                    break;
                }
            }
        });
        Some(receiver)
    }

    // ── Orchestrator transitions ─────────────────────────────────

    /// Marks every view for `user_id` as refreshing, retaining data.
    pub(crate) fn set_pending(&self, user_id: &UserId) {
        let guard = self.active.lock().expect("view lock poisoned");
        let Some(views) = guard.as_ref().filter(|v| v.user_id == *user_id) else {
            return;
        };
        mark_pending(&views.ciphers);
        mark_pending(&views.folders);
        mark_pending(&views.collections);
        mark_pending(&views.sends);
        mark_pending(&views.domains);
    }

    /// Marks every view for `user_id` as failed, retaining last-good data.
    pub(crate) fn set_error(&self, user_id: &UserId, cause: &str) {
        let guard = self.active.lock().expect("view lock poisoned");
        let Some(views) = guard.as_ref().filter(|v| v.user_id == *user_id) else {
            return;
        };
        mark_error(&views.ciphers, cause);
        mark_error(&views.folders, cause);
        mark_error(&views.collections, cause);
        mark_error(&views.sends, cause);
        mark_error(&views.domains, cause);
    }

    /// Marks every view for `user_id` as unreachable, retaining data.
    pub(crate) fn set_unreachable(&self, user_id: &UserId) {
        let guard = self.active.lock().expect("view lock poisoned");
        let Some(views) = guard.as_ref().filter(|v| v.user_id == *user_id) else {
            return;
        };
        mark_unreachable(&views.ciphers);
        mark_unreachable(&views.folders);
        mark_unreachable(&views.collections);
        mark_unreachable(&views.sends);
        mark_unreachable(&views.domains);
    }
}

fn mark_pending<T>(sender: &StateSender<T>) {
    sender.send_modify(|state| {
        let taken = std::mem::replace(state, LoadState::Loading);
        *state = taken.into_pending();
    });
}

fn mark_error<T>(sender: &StateSender<T>, cause: &str) {
    sender.send_modify(|state| {
        let taken = std::mem::replace(state, LoadState::Loading);
        *state = taken.into_error(cause);
    });
}

fn mark_unreachable<T>(sender: &StateSender<T>) {
    sender.send_modify(|state| {
        let taken = std::mem::replace(state, LoadState::Loading);
        *state = taken.into_unreachable();
    });
}

/// Spawns one decrypting pipeline: waits for either a store emission or an
/// unlock change, suspends until unlocked, then decrypts the whole current
/// snapshot. Decryption failure becomes `Error` with last-good retention.
fn spawn_decrypting_view<S, V, D, Fut>(
    mut source: watch::Receiver<S>,
    gate: UnlockGate,
    user_id: UserId,
    cancel: CancellationToken,
    sender: StateSender<V>,
    decrypt: D,
) -> JoinHandle<()>
where
    S: Clone + Send + Sync + 'static,
    V: Send + Sync + 'static,
    D: Fn(S) -> Fut + Send + 'static,
    Fut: Future<Output = Result<V, CryptoError>> + Send,
{
    tokio::spawn(async move {
        // Process the snapshot that is already on disk before waiting for
        // the next change.
        source.mark_changed();
        let mut unlock = gate.subscribe();

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                changed = source.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                changed = unlock.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    if !gate.is_unlocked(&user_id) {
                        continue;
                    }
                }
            }

            // Decryption is deferred, never skipped, while locked.
            if cancel
                .run_until_cancelled(gate.await_unlocked(&user_id))
                .await
                .is_none()
            {
                break;
            }

            let snapshot = source.borrow_and_update().clone();
            match decrypt(snapshot).await {
                Ok(views) => {
                    sender.send_replace(LoadState::Loaded(views));
                }
                Err(error) => {
                    debug!(%user_id, %error, "batch decryption failed");
                    sender.send_modify(|state| {
                        let taken = std::mem::replace(state, LoadState::Loading);
                        *state = taken.into_error(error.to_string());
                    });
                }
            }
        }
    })
}

/// Spawns the aggregate view: recombines the four entity states whenever
/// any of them changes.
fn spawn_vault_data_view(
    mut ciphers: watch::Receiver<LoadState<Vec<CipherView>>>,
    mut folders: watch::Receiver<LoadState<Vec<FolderView>>>,
    mut collections: watch::Receiver<LoadState<Vec<CollectionView>>>,
    mut sends: watch::Receiver<LoadState<Vec<SendView>>>,
    cancel: CancellationToken,
    sender: StateSender<VaultData>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                changed = ciphers.changed() => if changed.is_err() { break },
                changed = folders.changed() => if changed.is_err() { break },
                changed = collections.changed() => if changed.is_err() { break },
                changed = sends.changed() => if changed.is_err() { break },
            }

            let combined = {
                let c = ciphers.borrow_and_update();
                let f = folders.borrow_and_update();
                let col = collections.borrow_and_update();
                let s = sends.borrow_and_update();
                VaultData::combine(&c, &f, &col, &s)
            };
            sender.send_replace(combined);
        }
    })
}
