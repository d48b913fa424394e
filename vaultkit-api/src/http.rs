//! reqwest-backed implementation of [`VaultApi`].

use crate::client::VaultApi;
use crate::error::{ApiError, ApiResult};
use crate::models::{AttachmentDownload, AttachmentUploadSlot, ErrorBody, FileUploadKind};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use std::time::Duration;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tokio_util::io::ReaderStream;
use tracing::debug;
use vaultkit_types::{
    CipherId, CipherRecord, CollectionId, EncString, FolderId, FolderRecord, SendId, SendRecord,
    SyncSnapshot,
};

/// Configuration for the HTTP client.
#[derive(Debug, Clone)]
pub struct HttpVaultApiConfig {
    /// Base URL of the API, e.g. `https://vault.example.com/api`.
    pub base_url: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for HttpVaultApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://vault.example.com/api".to_string(),
            timeout_secs: 60,
        }
    }
}

/// HTTP implementation of the remote-service interface.
pub struct HttpVaultApi {
    config: HttpVaultApiConfig,
    client: Client,
    access_token: RwLock<Option<String>>,
}

impl HttpVaultApi {
    /// Creates a new client.
    pub fn new(config: HttpVaultApiConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("failed to create HTTP client");

        Self {
            config,
            client,
            access_token: RwLock::new(None),
        }
    }

    /// Sets the bearer token used for authenticated requests.
    pub async fn set_access_token(&self, token: impl Into<String>) {
        *self.access_token.write().await = Some(token.into());
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    async fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.access_token.read().await.as_deref() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn get(&self, path: &str) -> ApiResult<Response> {
        let builder = self.client.get(self.url(path));
        self.authed(builder).await.send().await.map_err(Into::into)
    }

    async fn send_json<B: Serialize + ?Sized>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: &B,
    ) -> ApiResult<Response> {
        let builder = self.client.request(method, self.url(path)).json(body);
        self.authed(builder).await.send().await.map_err(Into::into)
    }

    async fn send_empty(&self, method: reqwest::Method, path: &str) -> ApiResult<Response> {
        let builder = self.client.request(method, self.url(path));
        self.authed(builder).await.send().await.map_err(Into::into)
    }
}

/// Maps a non-success response to the error taxonomy.
async fn classify_failure(response: Response) -> ApiError {
    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return ApiError::NotFound;
    }
    if status.is_client_error() {
        // The server uses a structured body for validation and permission
        // failures; surface its message verbatim when present.
        if let Ok(text) = response.text().await {
            if let Ok(body) = serde_json::from_str::<ErrorBody>(&text) {
                if let Some(message) = body.display_message() {
                    return ApiError::Invalid { message };
                }
            }
        }
    }
    ApiError::Unexpected {
        status: status.as_u16(),
    }
}

/// Parses a success body, or classifies the failure.
async fn parse_json<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
    if !response.status().is_success() {
        return Err(classify_failure(response).await);
    }
    let text = response.text().await?;
    Ok(serde_json::from_str(&text)?)
}

/// Discards a success body, or classifies the failure.
async fn expect_success(response: Response) -> ApiResult<()> {
    if !response.status().is_success() {
        return Err(classify_failure(response).await);
    }
    Ok(())
}

#[async_trait]
impl VaultApi for HttpVaultApi {
    async fn full_sync(&self) -> ApiResult<SyncSnapshot> {
        debug!("requesting full sync");
        parse_json(self.get("/sync").await?).await
    }

    async fn account_revision_date(&self) -> ApiResult<DateTime<Utc>> {
        let response = self.get("/accounts/revision-date").await?;
        if !response.status().is_success() {
            return Err(classify_failure(response).await);
        }
        let text = response.text().await?;
        let millis: i64 = serde_json::from_str(text.trim())?;
        DateTime::from_timestamp_millis(millis).ok_or(ApiError::Unexpected { status: 200 })
    }

    async fn get_cipher(&self, id: CipherId) -> ApiResult<CipherRecord> {
        parse_json(self.get(&format!("/ciphers/{id}")).await?).await
    }

    async fn create_cipher(&self, record: &CipherRecord) -> ApiResult<CipherRecord> {
        parse_json(self.send_json(reqwest::Method::POST, "/ciphers", record).await?).await
    }

    async fn update_cipher(
        &self,
        id: CipherId,
        record: &CipherRecord,
    ) -> ApiResult<CipherRecord> {
        parse_json(
            self.send_json(reqwest::Method::PUT, &format!("/ciphers/{id}"), record)
                .await?,
        )
        .await
    }

    async fn delete_cipher(&self, id: CipherId) -> ApiResult<()> {
        expect_success(
            self.send_empty(reqwest::Method::DELETE, &format!("/ciphers/{id}"))
                .await?,
        )
        .await
    }

    async fn soft_delete_cipher(&self, id: CipherId) -> ApiResult<()> {
        expect_success(
            self.send_empty(reqwest::Method::PUT, &format!("/ciphers/{id}/delete"))
                .await?,
        )
        .await
    }

    async fn restore_cipher(&self, id: CipherId) -> ApiResult<()> {
        expect_success(
            self.send_empty(reqwest::Method::PUT, &format!("/ciphers/{id}/restore"))
                .await?,
        )
        .await
    }

    async fn share_cipher(
        &self,
        id: CipherId,
        record: &CipherRecord,
        collection_ids: &[CollectionId],
    ) -> ApiResult<CipherRecord> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct ShareBody<'a> {
            cipher: &'a CipherRecord,
            collection_ids: &'a [CollectionId],
        }
        let body = ShareBody {
            cipher: record,
            collection_ids,
        };
        parse_json(
            self.send_json(reqwest::Method::PUT, &format!("/ciphers/{id}/share"), &body)
                .await?,
        )
        .await
    }

    async fn update_cipher_collections(
        &self,
        id: CipherId,
        collection_ids: &[CollectionId],
    ) -> ApiResult<()> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct CollectionsBody<'a> {
            collection_ids: &'a [CollectionId],
        }
        expect_success(
            self.send_json(
                reqwest::Method::PUT,
                &format!("/ciphers/{id}/collections"),
                &CollectionsBody { collection_ids },
            )
            .await?,
        )
        .await
    }

    async fn create_attachment(
        &self,
        cipher_id: CipherId,
        file_name: &EncString,
        key: &EncString,
        size: u64,
    ) -> ApiResult<AttachmentUploadSlot> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct AttachmentBody<'a> {
            file_name: &'a EncString,
            key: &'a EncString,
            file_size: u64,
        }
        parse_json(
            self.send_json(
                reqwest::Method::POST,
                &format!("/ciphers/{cipher_id}/attachment/v2"),
                &AttachmentBody {
                    file_name,
                    key,
                    file_size: size,
                },
            )
            .await?,
        )
        .await
    }

    async fn upload_attachment(
        &self,
        slot: &AttachmentUploadSlot,
        source: &Path,
    ) -> ApiResult<()> {
        debug!(url = %slot.url, kind = ?slot.file_upload_kind, "uploading attachment bytes");
        let file = File::open(source).await?;
        let length = file.metadata().await?.len();
        // The slot URL is pre-signed; no bearer token is attached. Azure
        // destinations require the block-blob marker on the PUT.
        let builder = match slot.file_upload_kind {
            FileUploadKind::Direct => self.client.put(&slot.url),
            FileUploadKind::Azure => self
                .client
                .put(&slot.url)
                .header("x-ms-blob-type", "BlockBlob")
                .header("x-ms-version", "2021-04-10"),
        };
        let response = builder
            .header(reqwest::header::CONTENT_LENGTH, length)
            .body(reqwest::Body::wrap_stream(ReaderStream::new(file)))
            .send()
            .await?;
        expect_success(response).await
    }

    async fn get_attachment(
        &self,
        cipher_id: CipherId,
        attachment_id: &str,
    ) -> ApiResult<AttachmentDownload> {
        parse_json(
            self.get(&format!("/ciphers/{cipher_id}/attachment/{attachment_id}"))
                .await?,
        )
        .await
    }

    async fn delete_attachment(&self, cipher_id: CipherId, attachment_id: &str) -> ApiResult<()> {
        expect_success(
            self.send_empty(
                reqwest::Method::DELETE,
                &format!("/ciphers/{cipher_id}/attachment/{attachment_id}"),
            )
            .await?,
        )
        .await
    }

    async fn download_content(&self, url: &str, destination: &Path) -> ApiResult<()> {
        let mut response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(classify_failure(response).await);
        }
        let mut file = File::create(destination).await?;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
        }
        file.flush().await?;
        Ok(())
    }

    async fn get_folder(&self, id: FolderId) -> ApiResult<FolderRecord> {
        parse_json(self.get(&format!("/folders/{id}")).await?).await
    }

    async fn create_folder(&self, record: &FolderRecord) -> ApiResult<FolderRecord> {
        parse_json(self.send_json(reqwest::Method::POST, "/folders", record).await?).await
    }

    async fn update_folder(
        &self,
        id: FolderId,
        record: &FolderRecord,
    ) -> ApiResult<FolderRecord> {
        parse_json(
            self.send_json(reqwest::Method::PUT, &format!("/folders/{id}"), record)
                .await?,
        )
        .await
    }

    async fn delete_folder(&self, id: FolderId) -> ApiResult<()> {
        expect_success(
            self.send_empty(reqwest::Method::DELETE, &format!("/folders/{id}"))
                .await?,
        )
        .await
    }

    async fn get_send(&self, id: SendId) -> ApiResult<SendRecord> {
        parse_json(self.get(&format!("/sends/{id}")).await?).await
    }

    async fn create_send(&self, record: &SendRecord) -> ApiResult<SendRecord> {
        parse_json(self.send_json(reqwest::Method::POST, "/sends", record).await?).await
    }

    async fn update_send(&self, id: SendId, record: &SendRecord) -> ApiResult<SendRecord> {
        parse_json(
            self.send_json(reqwest::Method::PUT, &format!("/sends/{id}"), record)
                .await?,
        )
        .await
    }

    async fn delete_send(&self, id: SendId) -> ApiResult<()> {
        expect_success(
            self.send_empty(reqwest::Method::DELETE, &format!("/sends/{id}"))
                .await?,
        )
        .await
    }
}
