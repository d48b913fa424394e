//! The full sync snapshot and account profile.

use crate::ids::{OrganizationId, PolicyId, UserId};
use crate::record::{CipherRecord, CollectionRecord, DomainRules, EncString, FolderRecord, SendRecord};
use serde::{Deserialize, Serialize};

/// Everything the remote returns from a full sync: the account profile plus
/// the complete encrypted entity snapshot. Applied wholesale — the local
/// snapshot is replaced, never merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSnapshot {
    pub profile: Profile,
    #[serde(default)]
    pub ciphers: Vec<CipherRecord>,
    #[serde(default)]
    pub folders: Vec<FolderRecord>,
    #[serde(default)]
    pub collections: Vec<CollectionRecord>,
    #[serde(default)]
    pub sends: Vec<SendRecord>,
    #[serde(default)]
    pub domains: DomainRules,
}

/// Account profile fields that may change across syncs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: UserId,
    /// Server-issued token invalidated on credential rotation. A mismatch
    /// with the cached stamp forces logout before any data is written.
    pub security_stamp: String,
    #[serde(default)]
    pub avatar_color: Option<String>,
    #[serde(default)]
    pub organizations: Vec<OrganizationProfile>,
    #[serde(default)]
    pub policies: Vec<PolicyInfo>,
}

/// An organization-enforced policy applied to the account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyInfo {
    pub id: PolicyId,
    pub organization_id: OrganizationId,
    /// Server-defined policy type discriminant.
    #[serde(rename = "type")]
    pub kind: u32,
    pub enabled: bool,
}

/// Membership in an organization, including the wrapped org key needed to
/// decrypt organization-owned records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationProfile {
    pub id: OrganizationId,
    pub name: String,
    /// Organization symmetric key, wrapped with the user's key.
    pub key: EncString,
}
