//! Push-driven change notifications.
//!
//! Delivered out-of-band by the push channel and consumed exactly once by
//! the incremental reconciler; never persisted by the core. Deletions are
//! unconditional; upserts carry the server revision date used for the
//! staleness guard.

use crate::ids::{CipherId, CollectionId, FolderId, OrganizationId, SendId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A cipher was created or updated on the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CipherUpserted {
    pub id: CipherId,
    pub revision_date: DateTime<Utc>,
    /// `true` for an update to an existing record, `false` for a creation.
    pub is_update: bool,
    #[serde(default)]
    pub organization_id: Option<OrganizationId>,
    /// Collections the cipher belongs to, for visibility checks on
    /// organization-owned creations.
    #[serde(default)]
    pub collection_ids: Vec<CollectionId>,
}

/// A cipher was deleted on the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CipherDeleted {
    pub id: CipherId,
}

/// A folder was created or updated on the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderUpserted {
    pub id: FolderId,
    pub revision_date: DateTime<Utc>,
    pub is_update: bool,
}

/// A folder was deleted on the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderDeleted {
    pub id: FolderId,
}

/// A send was created or updated on the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendUpserted {
    pub id: SendId,
    pub revision_date: DateTime<Utc>,
    pub is_update: bool,
}

/// A send was deleted on the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendDeleted {
    pub id: SendId,
}
