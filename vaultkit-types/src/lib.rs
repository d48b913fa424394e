//! Core type definitions for VaultKit.
//!
//! This crate defines the storage- and transport-agnostic types used
//! throughout the sync core:
//! - Identifier newtypes (UUID v4) scoping every piece of cached state
//! - Encrypted record models (the at-rest shape of vault entities)
//! - Decrypted view models (the in-memory plaintext projections)
//! - `LoadState`, the tagged load/refresh/failure union with last-good
//!   retention
//! - Push change notifications and the full sync snapshot
//!
//! Nothing in here performs I/O or cryptography; those live behind the
//! trait seams in `vaultkit-store`, `vaultkit-api`, and `vaultkit-sync`.

mod ids;
mod load_state;
mod notification;
mod record;
mod snapshot;
mod view;

pub use ids::{CipherId, CollectionId, FolderId, OrganizationId, PolicyId, SendId, UserId};
pub use load_state::LoadState;
pub use notification::{
    CipherDeleted, CipherUpserted, FolderDeleted, FolderUpserted, SendDeleted, SendUpserted,
};
pub use record::{
    AttachmentRecord, CipherKind, CipherRecord, CollectionRecord, DomainRules, EncString,
    FolderRecord, SendKind, SendRecord,
};
pub use snapshot::{OrganizationProfile, PolicyInfo, Profile, SyncSnapshot};
pub use view::{AttachmentView, CipherView, CollectionView, FolderView, SendView, VaultData};
