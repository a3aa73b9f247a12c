//! Per-screen state for an entity's period documents.

use std::sync::Arc;

use paydesk_core::models::{DocumentUpload, UploadMetadata, UploadedDocument};
use paydesk_core::{PeriodKey, PeriodSelection};

use crate::documents::{DocumentService, ViewedDocument};

/// Holds the selected period and the last listing for one entity.
///
/// The listing is only ever replaced by a fetch: uploads and deletes refresh
/// it on success and leave it alone on failure. Methods take `&mut self`, so
/// one browser never has two requests in flight.
pub struct DocumentBrowser {
    service: Arc<DocumentService>,
    entity_id: String,
    selection: PeriodSelection,
    documents: Vec<UploadedDocument>,
}

impl DocumentBrowser {
    pub fn new(
        service: Arc<DocumentService>,
        entity_id: impl Into<String>,
        selection: PeriodSelection,
    ) -> Self {
        Self {
            service,
            entity_id: entity_id.into(),
            selection,
            documents: Vec::new(),
        }
    }

    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    pub fn selection(&self) -> &PeriodSelection {
        &self.selection
    }

    pub fn period(&self) -> PeriodKey {
        self.selection.key()
    }

    pub fn documents(&self) -> &[UploadedDocument] {
        &self.documents
    }

    /// Reload the listing. A failed fetch keeps the previous one.
    pub async fn refresh(&mut self) {
        if let Some(documents) = self
            .service
            .try_list_documents(&self.entity_id, self.period())
            .await
        {
            self.documents = documents;
        }
    }

    /// Switch to another period and load its documents.
    pub async fn select_period(&mut self, selection: PeriodSelection) {
        self.selection = selection;
        self.refresh().await;
    }

    pub async fn upload(&mut self, upload: &DocumentUpload, description: &str) -> bool {
        let metadata = UploadMetadata::for_selection(&self.selection, description);
        let accepted = self
            .service
            .upload_document(&self.entity_id, self.period(), upload, &metadata)
            .await;
        if accepted {
            self.refresh().await;
        }
        accepted
    }

    pub async fn delete(&mut self, file_name: &str) -> bool {
        let deleted = self
            .service
            .delete_document(&self.entity_id, self.period(), file_name)
            .await;
        if deleted {
            self.refresh().await;
        }
        deleted
    }

    pub async fn view(&self, file_name: &str) -> Option<ViewedDocument> {
        self.service
            .view_document(&self.entity_id, self.period(), file_name)
            .await
    }
}
