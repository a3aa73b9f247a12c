//! Period-scoped document operations.
//!
//! Every method here reports failure to the user through the [`Notifier`] and
//! returns an empty or negative result; nothing is propagated to the caller.
//! Endpoints, relative to the API prefix:
//!
//! - `GET    /{collection}/{id}/files/week/{period}` lists file names
//! - `POST   /{collection}/{id}/files` uploads (multipart)
//! - `GET    /{collection}/{id}/files/week/{period}/{file}` downloads
//! - `DELETE /{collection}/{id}/files/week/{period}/{file}` deletes

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use paydesk_core::models::{DocumentUpload, UploadMetadata, UploadedDocument};
use paydesk_core::{Notice, Notifier, PeriodKey};
use reqwest::multipart::{Form, Part};

use crate::blob::{BlobUrl, BlobUrlRegistry};
use crate::ApiClient;

/// Delay before a viewed document's URL is revoked.
pub const DEFAULT_BLOB_URL_TTL: Duration = Duration::from_secs(5);

/// A downloaded document, reachable through a transient blob URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewedDocument {
    pub url: BlobUrl,
    pub file_name: String,
    pub content_type: Option<String>,
    pub len: usize,
}

pub struct DocumentService {
    client: ApiClient,
    collection: String,
    notifier: Arc<dyn Notifier>,
    blobs: BlobUrlRegistry,
    blob_ttl: Duration,
}

impl DocumentService {
    /// `collection` is the entity path segment, e.g. `"employees"`.
    pub fn new(client: ApiClient, collection: impl Into<String>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            client,
            collection: collection.into().trim_matches('/').to_string(),
            notifier,
            blobs: BlobUrlRegistry::new(),
            blob_ttl: DEFAULT_BLOB_URL_TTL,
        }
    }

    pub fn with_blob_ttl(mut self, ttl: Duration) -> Self {
        self.blob_ttl = ttl;
        self
    }

    pub fn blobs(&self) -> &BlobUrlRegistry {
        &self.blobs
    }

    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.notifier
    }

    fn files_path(&self, entity_id: &str) -> String {
        self.client.api_path(&format!(
            "/{}/{}/files",
            self.collection,
            urlencoding::encode(entity_id)
        ))
    }

    fn week_path(&self, entity_id: &str, period: PeriodKey) -> String {
        format!("{}/week/{}", self.files_path(entity_id), period)
    }

    fn file_path(&self, entity_id: &str, period: PeriodKey, file_name: &str) -> String {
        format!(
            "{}/{}",
            self.week_path(entity_id, period),
            urlencoding::encode(file_name)
        )
    }

    /// Documents stored for one entity and period, in server order.
    pub async fn list_documents_for_period(
        &self,
        entity_id: &str,
        period: PeriodKey,
    ) -> Vec<UploadedDocument> {
        self.try_list_documents(entity_id, period)
            .await
            .unwrap_or_default()
    }

    /// Like [`list_documents_for_period`](Self::list_documents_for_period),
    /// but a failed fetch is `None` so callers can keep what they had.
    pub async fn try_list_documents(
        &self,
        entity_id: &str,
        period: PeriodKey,
    ) -> Option<Vec<UploadedDocument>> {
        match self.fetch_file_names(entity_id, period).await {
            Ok(names) => Some(
                names
                    .into_iter()
                    .map(|name| UploadedDocument::from_listing(name, period))
                    .collect(),
            ),
            Err(e) => {
                tracing::warn!(entity_id, period = %period, error = ?e, "Failed to list documents");
                self.notifier
                    .notify(Notice::warning(format!("Could not load documents for {}", period)));
                None
            }
        }
    }

    async fn fetch_file_names(&self, entity_id: &str, period: PeriodKey) -> Result<Vec<String>> {
        self.client
            .get(&self.week_path(entity_id, period), &[])
            .await
            .context("Failed to fetch document list")
    }

    /// Returns whether the backend accepted the file.
    pub async fn upload_document(
        &self,
        entity_id: &str,
        period: PeriodKey,
        upload: &DocumentUpload,
        metadata: &UploadMetadata,
    ) -> bool {
        match self.send_upload(entity_id, period, upload, metadata).await {
            Ok(()) => {
                tracing::info!(entity_id, period = %period, file = %upload.file_name, "Uploaded document");
                self.notifier
                    .notify(Notice::success(format!("Uploaded {}", upload.file_name)));
                true
            }
            Err(e) => {
                tracing::warn!(entity_id, period = %period, error = ?e, "Failed to upload document");
                self.notifier
                    .notify(Notice::error(format!("Failed to upload {}", upload.file_name)));
                false
            }
        }
    }

    async fn send_upload(
        &self,
        entity_id: &str,
        period: PeriodKey,
        upload: &DocumentUpload,
        metadata: &UploadMetadata,
    ) -> Result<()> {
        let mut part = Part::bytes(upload.bytes.clone()).file_name(upload.file_name.clone());
        if let Some(content_type) = &upload.content_type {
            part = part
                .mime_str(content_type)
                .with_context(|| format!("Invalid content type: {}", content_type))?;
        }
        let form = Form::new()
            .part("documents", part)
            .text("week", period.to_string())
            .text("year", metadata.year.clone())
            .text("month", metadata.month.clone())
            .text("description", metadata.description.clone());

        self.client
            .post_multipart(&self.files_path(entity_id), form)
            .await
    }

    /// Returns whether the backend deleted the file.
    pub async fn delete_document(&self, entity_id: &str, period: PeriodKey, file_name: &str) -> bool {
        match self
            .client
            .delete(&self.file_path(entity_id, period, file_name))
            .await
        {
            Ok(()) => {
                tracing::info!(entity_id, period = %period, file = file_name, "Deleted document");
                self.notifier
                    .notify(Notice::success(format!("Deleted {}", file_name)));
                true
            }
            Err(e) => {
                tracing::warn!(entity_id, period = %period, error = ?e, "Failed to delete document");
                self.notifier
                    .notify(Notice::error(format!("Failed to delete {}", file_name)));
                false
            }
        }
    }

    /// Download a document and expose it through a blob URL that is revoked
    /// after the configured delay, or earlier through [`release`](Self::release).
    pub async fn view_document(
        &self,
        entity_id: &str,
        period: PeriodKey,
        file_name: &str,
    ) -> Option<ViewedDocument> {
        match self
            .client
            .get_bytes(&self.file_path(entity_id, period, file_name))
            .await
        {
            Ok((bytes, content_type)) => {
                let len = bytes.len();
                let url = self.blobs.register(bytes, content_type.clone());
                self.blobs.revoke_after(url.clone(), self.blob_ttl);
                Some(ViewedDocument {
                    url,
                    file_name: file_name.to_string(),
                    content_type,
                    len,
                })
            }
            Err(e) => {
                tracing::warn!(entity_id, period = %period, error = ?e, "Failed to fetch document");
                self.notifier
                    .notify(Notice::error(format!("Could not open {}", file_name)));
                None
            }
        }
    }

    /// Revoke a viewed document's URL now.
    pub fn release(&self, url: &BlobUrl) -> bool {
        self.blobs.revoke(url)
    }
}
