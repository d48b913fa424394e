//! Decrypted view models — in-memory plaintext projections of records.
//!
//! Views exist only while the vault is unlocked and are never persisted;
//! their lifetime is the active subscription to a decrypting cache view.

use crate::ids::{CipherId, CollectionId, FolderId, OrganizationId, SendId};
use crate::load_state::LoadState;
use crate::record::{CipherKind, EncString, SendKind};
use chrono::{DateTime, Utc};

/// Plaintext projection of a cipher record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CipherView {
    /// `None` for a view that has not been created on the server yet.
    pub id: Option<CipherId>,
    pub folder_id: Option<FolderId>,
    pub organization_id: Option<OrganizationId>,
    pub collection_ids: Vec<CollectionId>,
    pub kind: CipherKind,
    pub name: String,
    pub notes: Option<String>,
    pub login_uri: Option<String>,
    pub attachments: Vec<AttachmentView>,
    pub deleted_date: Option<DateTime<Utc>>,
    pub revision_date: DateTime<Utc>,
}

/// Plaintext attachment metadata.
///
/// The wrapped content key stays ciphertext even in the view; it is only
/// ever handed back to the crypto engine for file decryption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentView {
    pub id: String,
    pub file_name: String,
    pub size: u64,
    pub key: Option<EncString>,
    pub url: Option<String>,
}

/// Plaintext projection of a folder record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderView {
    pub id: Option<FolderId>,
    pub name: String,
    pub revision_date: DateTime<Utc>,
}

/// Plaintext projection of a collection record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionView {
    pub id: CollectionId,
    pub organization_id: OrganizationId,
    pub name: String,
    pub read_only: bool,
}

/// Plaintext projection of a send record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendView {
    pub id: Option<SendId>,
    pub kind: SendKind,
    pub name: String,
    pub text: Option<String>,
    pub access_id: String,
    pub deletion_date: Option<DateTime<Utc>>,
    pub revision_date: DateTime<Utc>,
}

/// The whole decrypted vault, for callers that need every entity type at
/// once rather than one collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VaultData {
    pub ciphers: Vec<CipherView>,
    pub folders: Vec<FolderView>,
    pub collections: Vec<CollectionView>,
    pub sends: Vec<SendView>,
}

impl VaultData {
    /// Combines the four per-entity load states into one aggregate state.
    ///
    /// Precedence: any `Error` wins (first cause is kept), then
    /// `Unreachable`, then `Loading`, then `Pending`; only when every input
    /// is `Loaded` is the result `Loaded`. The aggregate carries data only
    /// when every input does.
    pub fn combine(
        ciphers: &LoadState<Vec<CipherView>>,
        folders: &LoadState<Vec<FolderView>>,
        collections: &LoadState<Vec<CollectionView>>,
        sends: &LoadState<Vec<SendView>>,
    ) -> LoadState<VaultData> {
        let data = match (ciphers.data(), folders.data(), collections.data(), sends.data()) {
            (Some(c), Some(f), Some(col), Some(s)) => Some(VaultData {
                ciphers: c.clone(),
                folders: f.clone(),
                collections: col.clone(),
                sends: s.clone(),
            }),
            _ => None,
        };

        let cause = ciphers
            .error_cause()
            .or_else(|| folders.error_cause())
            .or_else(|| collections.error_cause())
            .or_else(|| sends.error_cause());
        if let Some(cause) = cause {
            return LoadState::Error {
                cause: cause.to_string(),
                last_good: data,
            };
        }

        let unreachable = ciphers.is_unreachable()
            || folders.is_unreachable()
            || collections.is_unreachable()
            || sends.is_unreachable();
        if unreachable {
            return LoadState::Unreachable { last_good: data };
        }

        let loading = ciphers.is_loading()
            || folders.is_loading()
            || collections.is_loading()
            || sends.is_loading();
        if loading {
            return LoadState::Loading;
        }

        let pending = ciphers.is_pending()
            || folders.is_pending()
            || collections.is_pending()
            || sends.is_pending();
        match data {
            Some(data) if pending => LoadState::Pending(data),
            Some(data) => LoadState::Loaded(data),
            // Unreachable in practice: all four are Loaded or Pending here,
            // so all four carry data.
            None => LoadState::Loading,
        }
    }
}
