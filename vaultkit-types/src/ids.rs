//! Identifier types used throughout the VaultKit core.
//!
//! Every piece of cached, synced, or decrypted state is partitioned by
//! `UserId`; the remaining ids scope individual records within a user's
//! vault. All are UUID v4 newtypes, serialized transparently so they match
//! the server's GUID strings on the wire.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random id.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates an id from an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the underlying UUID.
            #[must_use]
            pub const fn as_uuid(&self) -> Uuid {
                self.0
            }

            /// Parses an id from a string.
            pub fn parse(s: &str) -> Result<Self, uuid::Error> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

uuid_id! {
    /// Identifier for a logged-in user. All cached and sync state is
    /// scoped by it; at most one user is active at a time.
    UserId
}

uuid_id! {
    /// Identifier for a single vault item (login, card, identity, note).
    CipherId
}

uuid_id! {
    /// Identifier for a user-defined folder.
    FolderId
}

uuid_id! {
    /// Identifier for an organization-shared collection.
    CollectionId
}

uuid_id! {
    /// Identifier for a time-boxed "send" share.
    SendId
}

uuid_id! {
    /// Identifier for an organization the user belongs to.
    OrganizationId
}

uuid_id! {
    /// Identifier for an organization-enforced account policy.
    PolicyId
}
