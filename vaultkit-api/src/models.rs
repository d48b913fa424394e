//! Wire models specific to the API layer.
//!
//! Entity records and the sync snapshot live in `vaultkit-types`; this
//! module only holds shapes that exist purely on the wire.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use vaultkit_types::CipherRecord;

/// How the attachment bytes must be delivered to the upload destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FileUploadKind {
    /// PUT the raw bytes straight to the pre-signed URL.
    Direct,
    /// Azure block-blob style upload to the pre-signed URL.
    Azure,
}

/// Response to an attachment upload request: where to put the bytes, plus
/// the cipher record already updated with the pending attachment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentUploadSlot {
    pub attachment_id: String,
    pub url: String,
    pub file_upload_kind: FileUploadKind,
    pub cipher: CipherRecord,
}

/// Download metadata for one attachment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentDownload {
    /// Absent when the server has no retrievable location for the bytes.
    #[serde(default)]
    pub url: Option<String>,
}

/// Structured error body the server returns on a rejected request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub validation_errors: Option<BTreeMap<String, Vec<String>>>,
}

impl ErrorBody {
    /// Extracts the most specific user-displayable message.
    pub fn display_message(self) -> Option<String> {
        self.validation_errors
            .and_then(|errors| errors.into_values().flatten().next())
            .or(self.message)
    }
}
