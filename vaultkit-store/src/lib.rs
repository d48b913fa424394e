//! Disk-store boundary for VaultKit.
//!
//! The sync core never touches persistence directly; it consumes the
//! [`VaultStore`] trait (per-entity change streams plus whole-record
//! upsert/delete/replace primitives) and the [`SettingsStore`] trait (sync
//! cursor, security stamp, profile fields). Change streams are
//! `tokio::sync::watch` receivers: every subscriber observes the current
//! list and every subsequent emission in order.
//!
//! [`MemoryVaultStore`] and [`MemorySettingsStore`] are the in-process
//! reference implementations; a durable backend implements the same traits.

mod error;
mod memory;
mod store;

pub use error::{StoreError, StoreResult};
pub use memory::{MemorySettingsStore, MemoryVaultStore};
pub use store::{SettingsStore, VaultStore};
