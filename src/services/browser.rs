//! ObjectBrowser: one browsing session over the console API.
//!
//! Owns the listing controller, the transfer store and registry, and the
//! executors, and applies the effects that span them: a listing refresh and
//! cleared selection after uploads, the rename prompt before downloads, and
//! cancellation of everything in flight on dispose.

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::AppConfig;
use crate::errors::{ClientResult, ListingResult};
use crate::models::bucket::BucketSummary;
use crate::models::object::ObjectEntry;
use crate::services::api_client::ConsoleClient;
use crate::services::executors::{
    ClientOs, DownloadPlan, TransferExecutor, TransferOutcome, UploadRequest, UploadSummary,
    plan_download,
};
use crate::services::listing_controller::{ListingController, ListingOrigin};
use crate::services::transfer_registry::TransferRegistry;
use crate::services::transfer_store::TransferStore;

/// Result of asking to download the current selection.
#[derive(Debug, Clone, PartialEq)]
pub enum DownloadDecision {
    Started(Vec<TransferOutcome>),
    /// Nothing was downloaded; call [`ObjectBrowser::download_renamed`].
    RenameRequired(ObjectEntry),
}

pub struct ObjectBrowser {
    client: ConsoleClient,
    controller: ListingController<ConsoleClient>,
    executor: TransferExecutor,
    store: Arc<TransferStore>,
    registry: Arc<TransferRegistry>,
    client_os: ClientOs,
}

impl ObjectBrowser {
    pub fn create(config: &AppConfig) -> ClientResult<Self> {
        let client = ConsoleClient::new(&config.api_url, config.token.clone())?;
        let store = Arc::new(TransferStore::new());
        let registry = Arc::new(TransferRegistry::new());
        let executor = TransferExecutor::new(
            client.clone(),
            store.clone(),
            registry.clone(),
            config.download_dir.clone(),
        );
        Ok(Self {
            controller: ListingController::new(client.clone()),
            client,
            executor,
            store,
            registry,
            client_os: config.client_os,
        })
    }

    /// Load the session's allowed resources for the listing fallback.
    pub async fn load_permissions(&mut self) -> ClientResult<()> {
        let session = self.client.session().await?;
        self.controller.set_permissions(session.allow_resources);
        Ok(())
    }

    pub fn controller(&self) -> &ListingController<ConsoleClient> {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut ListingController<ConsoleClient> {
        &mut self.controller
    }

    pub fn transfers(&self) -> &Arc<TransferStore> {
        &self.store
    }

    pub fn registry(&self) -> &Arc<TransferRegistry> {
        &self.registry
    }

    pub fn executor(&self) -> &TransferExecutor {
        &self.executor
    }

    pub async fn navigate(&mut self, bucket: &str, encoded_path: &str) -> ListingResult<ListingOrigin> {
        self.controller.navigate(bucket, encoded_path).await
    }

    pub async fn bucket_summary(&self) -> ClientResult<BucketSummary> {
        self.client
            .bucket_summary(&self.controller.state().bucket)
            .await
    }

    /// Upload into the current folder, then refresh the listing and clear the
    /// selection whatever the outcome.
    pub async fn upload(&mut self, files: &[UploadRequest]) -> UploadSummary {
        let bucket = self.controller.state().bucket.clone();
        let folder = self.controller.state().simple_path.clone();
        let summary = self.executor.upload_files(&bucket, &folder, files).await;
        info!(
            "upload finished: {}/{} succeeded",
            summary.succeeded, summary.total
        );

        if let Err(err) = self.controller.refresh().await {
            warn!("refresh after upload failed: {}", err);
        }
        self.controller.clear_selection();
        summary
    }

    /// Download the selected entries, unless a rename is needed first.
    pub async fn download_selected(&mut self) -> DownloadDecision {
        let selected = self.controller.selected_entries();
        self.download(&selected).await
    }

    pub async fn download(&mut self, entries: &[ObjectEntry]) -> DownloadDecision {
        match plan_download(entries, self.client_os) {
            DownloadPlan::PromptRename(entry) => DownloadDecision::RenameRequired(entry),
            DownloadPlan::Immediate(entries) => {
                let bucket = self.controller.state().bucket.clone();
                let outcomes = self.executor.download_objects(&bucket, &entries).await;
                DownloadDecision::Started(outcomes)
            }
        }
    }

    /// Finish a rename prompt by downloading under `new_name`.
    pub async fn download_renamed(&mut self, entry: &ObjectEntry, new_name: &str) -> TransferOutcome {
        let bucket = self.controller.state().bucket.clone();
        self.executor
            .download_object(&bucket, entry, Some(new_name))
            .await
    }

    /// Cancel a transfer by registry id.
    pub fn cancel_transfer(&self, id: &str) -> bool {
        self.registry.cancel(id)
    }

    /// Tear down the session, cancelling every transfer still in flight.
    pub fn dispose(self) {
        for record in self.store.snapshot() {
            if self.registry.cancel(&record.id) {
                info!("cancelled {} on dispose", record.id);
            }
        }
    }
}
