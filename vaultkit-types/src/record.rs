//! Encrypted record models — the at-rest shape of vault entities.
//!
//! Records are owned by the disk store and the remote service; the sync
//! core reads and writes them whole. Sensitive fields are `EncString`
//! ciphertext; structural metadata (ids, revision dates, folder and
//! collection references) stays in the clear so reconciliation can order
//! and route records without the vault key.

use crate::ids::{CipherId, CollectionId, FolderId, OrganizationId, SendId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque ciphertext produced by the crypto engine.
///
/// The core never inspects the contents; it only moves them between the
/// network, the disk store, and the crypto engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncString(String);

impl EncString {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for EncString {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// The kind of item a cipher holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CipherKind {
    Login,
    SecureNote,
    Card,
    Identity,
}

/// A single encrypted vault item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CipherRecord {
    pub id: CipherId,
    /// Folder reference; cleared when the folder is deleted.
    pub folder_id: Option<FolderId>,
    pub organization_id: Option<OrganizationId>,
    /// Collections this cipher is shared into. Server-assigned; the server
    /// copy of this list wins over anything computed locally.
    #[serde(default)]
    pub collection_ids: Vec<CollectionId>,
    pub kind: CipherKind,
    pub name: EncString,
    #[serde(default)]
    pub notes: Option<EncString>,
    #[serde(default)]
    pub login_uri: Option<EncString>,
    #[serde(default)]
    pub attachments: Vec<AttachmentRecord>,
    /// Set when soft-deleted (moved to trash), cleared on restore.
    #[serde(default)]
    pub deleted_date: Option<DateTime<Utc>>,
    /// Server-assigned last-modified timestamp.
    pub revision_date: DateTime<Utc>,
}

/// Encrypted metadata for a file attached to a cipher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentRecord {
    pub id: String,
    pub file_name: EncString,
    pub size: u64,
    /// Encrypted per-attachment content key.
    pub key: EncString,
    /// Download location, when the server included one.
    #[serde(default)]
    pub url: Option<String>,
}

/// An encrypted user-defined folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderRecord {
    pub id: FolderId,
    pub name: EncString,
    pub revision_date: DateTime<Utc>,
}

/// An encrypted organization-shared collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionRecord {
    pub id: CollectionId,
    pub organization_id: OrganizationId,
    pub name: EncString,
    #[serde(default)]
    pub read_only: bool,
}

/// The kind of payload a send shares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SendKind {
    Text,
    File,
}

/// An encrypted time-boxed "send" share.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendRecord {
    pub id: SendId,
    pub kind: SendKind,
    pub name: EncString,
    #[serde(default)]
    pub text: Option<EncString>,
    pub access_id: String,
    #[serde(default)]
    pub deletion_date: Option<DateTime<Utc>>,
    pub revision_date: DateTime<Utc>,
}

/// URI-equivalence rules used for matching logins against sites.
///
/// These are not secret and are stored in the clear.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainRules {
    #[serde(default)]
    pub equivalent_domains: Vec<Vec<String>>,
    #[serde(default)]
    pub global_equivalent_domains: Vec<Vec<String>>,
}
