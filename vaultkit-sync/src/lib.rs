//! Vault synchronization and reactive cache core.
//!
//! Keeps an encrypted on-disk cache consistent with a remote vault service
//! and exposes decrypted views of it as observable state.
//!
//! # Architecture
//!
//! - **Sessions**: at most one active user; switching users cancels all
//!   in-flight work for the previous one
//! - **Unlock gate**: observable per-user availability of key material;
//!   decryption always waits behind it
//! - **Views**: per-entity decrypting pipelines over the store's change
//!   streams, surfaced as `LoadState` watch channels
//! - **Orchestrator**: full sync with a staleness pregate, a revision-date
//!   gate, and a security-stamp check
//! - **Reconciler**: applies push notifications incrementally between syncs
//! - **Managers**: user-initiated mutations (encrypt, send, persist the
//!   server's copy)
//!
//! # Example
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use vaultkit_sync::{SyncConfig, VaultClient};
//! # fn demo(
//! #     api: Arc<dyn vaultkit_api::VaultApi>,
//! #     store: Arc<dyn vaultkit_store::VaultStore>,
//! #     settings: Arc<dyn vaultkit_store::SettingsStore>,
//! #     crypto: Arc<dyn vaultkit_sync::CryptoEngine>,
//! #     hooks: Arc<dyn vaultkit_sync::SessionHooks>,
//! # ) {
//! let client = VaultClient::new(api, store, settings, crypto, hooks, SyncConfig::default());
//! let user_id = vaultkit_types::UserId::new();
//! client.set_active_user(user_id);
//! let ciphers = client.ciphers_state();
//! # }
//! ```

mod attachments;
mod ciphers;
pub mod crypto;
mod error;
mod folders;
mod orchestrator;
mod reconciler;
mod sends;
mod session;
mod unlock;
mod vault;
mod views;

pub use attachments::AttachmentManager;
pub use ciphers::CipherManager;
pub use crypto::{CryptoEngine, CryptoError, CryptoResult};
pub use error::{VaultError, VaultResult};
pub use folders::FolderManager;
pub use orchestrator::{SyncConfig, SyncOrchestrator};
pub use reconciler::PushReconciler;
pub use sends::SendManager;
pub use session::{Session, SessionHooks, SessionManager};
pub use unlock::{UnlockGate, UnlockPhase};
pub use vault::VaultClient;
pub use views::ViewRegistry;
