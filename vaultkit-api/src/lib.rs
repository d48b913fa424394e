//! Typed HTTP client for the VaultKit remote service.
//!
//! The sync core talks to the remote authority exclusively through the
//! [`VaultApi`] trait; [`HttpVaultApi`] is the reqwest-backed production
//! implementation. Failures are classified up front — connectivity,
//! structured rejection, not-found, unexpected status — so the core never
//! has to inspect transport details.

mod client;
mod error;
mod http;
mod models;

pub use client::VaultApi;
pub use error::{ApiError, ApiResult};
pub use http::{HttpVaultApi, HttpVaultApiConfig};
pub use models::{AttachmentDownload, AttachmentUploadSlot, FileUploadKind};
