//! Upload and download executors.
//!
//! Each call drives one transfer end to end: it creates the record, registers
//! the cancellation handle before any request is issued, streams progress into
//! the [`TransferStore`], and on every terminal branch (success, failure,
//! cancel) updates the record and removes the registry entry exactly once.

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use futures::{StreamExt, future::join_all};
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Method};
use serde::Serialize;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tracing::{debug, info, warn};

use crate::errors::NETWORK_ERROR_MESSAGE;
use crate::models::object::ObjectEntry;
use crate::models::transfer::{TransferKind, TransferRecord, percentage_of};
use crate::paths::{file_name, upload_folder};
use crate::services::api_client::ConsoleClient;
use crate::services::transfer_registry::{TransferHandle, TransferRegistry, UploadPayload};
use crate::services::transfer_store::TransferStore;

/// Longest object name Windows can save without a rename.
pub const WINDOWS_NAME_LIMIT: usize = 200;

#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "outcome", content = "error", rename_all = "snake_case")]
pub enum TransferOutcome {
    Completed,
    Failed(String),
    Cancelled,
}

/// A local file to upload.
#[derive(Clone, Debug)]
pub struct UploadRequest {
    pub local_path: PathBuf,
    /// Path reported by the file source: a drop-relative path such as
    /// `photos/2024/a.jpg`, or just the file name.
    pub relative_path: String,
}

impl UploadRequest {
    /// Upload of a single picked file, keyed by its own name.
    pub fn from_path(local_path: impl Into<PathBuf>) -> Self {
        let local_path = local_path.into();
        let relative_path = local_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            local_path,
            relative_path,
        }
    }
}

#[derive(Serialize, Clone, Debug, Default)]
pub struct UploadSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub cancelled: usize,
    /// Aggregate notification when any upload failed.
    pub error: Option<String>,
}

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ClientOs {
    Windows,
    MacOs,
    Linux,
    Other,
}

impl ClientOs {
    pub fn current() -> Self {
        std::env::consts::OS.parse().unwrap_or(ClientOs::Other)
    }
}

impl FromStr for ClientOs {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "windows" | "win" => Ok(ClientOs::Windows),
            "macos" | "mac" | "darwin" => Ok(ClientOs::MacOs),
            "linux" => Ok(ClientOs::Linux),
            "other" => Ok(ClientOs::Other),
            other => Err(format!("unknown client os `{other}`")),
        }
    }
}

/// What to do with a download request.
#[derive(Debug, Clone, PartialEq)]
pub enum DownloadPlan {
    Immediate(Vec<ObjectEntry>),
    /// Ask for a shorter name before downloading.
    PromptRename(ObjectEntry),
}

/// Decide whether the selection can be downloaded right away.
///
/// A single object whose name exceeds [`WINDOWS_NAME_LIMIT`] characters on a
/// Windows client needs a rename first.
pub fn plan_download(selected: &[ObjectEntry], os: ClientOs) -> DownloadPlan {
    if let [only] = selected {
        if os == ClientOs::Windows && only.name.chars().count() > WINDOWS_NAME_LIMIT {
            return DownloadPlan::PromptRename(only.clone());
        }
    }
    DownloadPlan::Immediate(selected.to_vec())
}

#[derive(Clone)]
pub struct TransferExecutor {
    client: ConsoleClient,
    store: Arc<TransferStore>,
    registry: Arc<TransferRegistry>,
    download_dir: PathBuf,
}

impl TransferExecutor {
    pub fn new(
        client: ConsoleClient,
        store: Arc<TransferStore>,
        registry: Arc<TransferRegistry>,
        download_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            client,
            store,
            registry,
            download_dir: download_dir.into(),
        }
    }

    /// Create and register a record; returns `(id, instance_id, handle)`.
    fn begin(&self, record: TransferRecord, payload: Option<UploadPayload>) -> (String, String, TransferHandle) {
        let id = record.id.clone();
        let instance_id = record.instance_id.clone();
        let handle = TransferHandle::new(payload);
        self.registry.store(&id, handle.clone());
        self.store.add_transfer(record);
        (id, instance_id, handle)
    }

    /// Apply the terminal transition and release the registry entry.
    fn finish(&self, id: &str, instance_id: &str, outcome: TransferOutcome) -> TransferOutcome {
        match &outcome {
            TransferOutcome::Completed => self.store.complete(instance_id),
            TransferOutcome::Failed(message) => self.store.fail(instance_id, message.clone()),
            TransferOutcome::Cancelled => self.store.cancel(instance_id),
        }
        self.registry.remove(id);
        outcome
    }

    /// Upload one file into `current_folder` of `bucket`.
    pub async fn upload_file(
        &self,
        bucket: &str,
        current_folder: &str,
        request: &UploadRequest,
    ) -> TransferOutcome {
        let folder = upload_folder(current_folder, &request.relative_path);
        let name = file_name(&request.relative_path.replace('\\', "/")).to_string();
        let key = format!("{folder}{name}");
        let size = match fs::metadata(&request.local_path).await {
            Ok(meta) => meta.len(),
            Err(err) => {
                debug!("could not stat {}: {}", request.local_path.display(), err);
                0
            }
        };

        let record = TransferRecord::new(bucket, &key, TransferKind::Upload).with_total_bytes(size);
        let payload = UploadPayload {
            local_path: request.local_path.clone(),
            size,
        };
        let (id, instance_id, handle) = self.begin(record, Some(payload));

        let outcome = tokio::select! {
            _ = handle.cancel.cancelled() => TransferOutcome::Cancelled,
            res = self.send_upload(bucket, &folder, &name, &request.local_path, size, &instance_id) => {
                match res {
                    Ok(()) => TransferOutcome::Completed,
                    Err(message) => TransferOutcome::Failed(message),
                }
            }
        };

        match &outcome {
            TransferOutcome::Completed => info!("uploaded {}/{}", bucket, key),
            TransferOutcome::Failed(message) => warn!("upload of {}/{} failed: {}", bucket, key, message),
            TransferOutcome::Cancelled => info!("upload of {}/{} cancelled", bucket, key),
        }
        self.finish(&id, &instance_id, outcome)
    }

    async fn send_upload(
        &self,
        bucket: &str,
        folder: &str,
        name: &str,
        local_path: &Path,
        size: u64,
        instance_id: &str,
    ) -> Result<(), String> {
        let file = File::open(local_path)
            .await
            .map_err(|err| format!("could not read {}: {}", local_path.display(), err))?;

        let store = self.store.clone();
        let progress_id = instance_id.to_string();
        let mut loaded: u64 = 0;
        let mut last: Option<u8> = None;
        let stream = ReaderStream::new(file).map(move |chunk: io::Result<bytes::Bytes>| {
            if let Ok(bytes) = &chunk {
                loaded += bytes.len() as u64;
                let pct = percentage_of(loaded, size);
                if last != Some(pct) {
                    last = Some(pct);
                    store.update_progress(&progress_id, pct);
                }
            }
            chunk
        });

        let part = Part::stream_with_length(Body::wrap_stream(stream), size).file_name(name.to_string());
        let form = Form::new().part(size.to_string(), part);

        let url = self.client.routes().upload(bucket, folder);
        let resp = self
            .client
            .request(Method::POST, &url)
            .multipart(form)
            .send()
            .await
            .map_err(|err| {
                debug!("upload transport error: {}", err);
                NETWORK_ERROR_MESSAGE.to_string()
            })?;
        ConsoleClient::check_status(resp)
            .await
            .map_err(|err| err.to_string())?;
        Ok(())
    }

    /// Upload every file; each is its own transfer. Waits for all to settle.
    pub async fn upload_files(
        &self,
        bucket: &str,
        current_folder: &str,
        requests: &[UploadRequest],
    ) -> UploadSummary {
        let outcomes = join_all(
            requests
                .iter()
                .map(|request| self.upload_file(bucket, current_folder, request)),
        )
        .await;

        let mut summary = UploadSummary {
            total: outcomes.len(),
            ..UploadSummary::default()
        };
        for outcome in &outcomes {
            match outcome {
                TransferOutcome::Completed => summary.succeeded += 1,
                TransferOutcome::Failed(_) => summary.failed += 1,
                TransferOutcome::Cancelled => summary.cancelled += 1,
            }
        }
        if summary.failed > 0 {
            summary.error = Some(format!(
                "There were some errors during file upload. Uploaded {}/{} file(s).",
                summary.succeeded, summary.total
            ));
        }
        summary
    }

    /// Download one object into the download directory.
    ///
    /// `save_as` overrides the local file name (used after a rename prompt).
    pub async fn download_object(
        &self,
        bucket: &str,
        entry: &ObjectEntry,
        save_as: Option<&str>,
    ) -> TransferOutcome {
        let local_name = save_as
            .map(str::to_string)
            .unwrap_or_else(|| file_name(&entry.name).to_string());
        let dest = self.download_dir.join(&local_name);

        let mut record = TransferRecord::new(bucket, &entry.name, TransferKind::Download);
        if entry.size > 0 {
            record = record.with_total_bytes(entry.size as u64);
        }
        let (id, instance_id, handle) = self.begin(record, None);
        let partial = self.download_dir.join(format!(".{local_name}.{id}.part"));

        let outcome = tokio::select! {
            _ = handle.cancel.cancelled() => TransferOutcome::Cancelled,
            res = self.fetch_download(bucket, entry, &partial, &instance_id) => {
                match res {
                    Ok(()) => TransferOutcome::Completed,
                    Err(message) => TransferOutcome::Failed(message),
                }
            }
        };

        let outcome = match outcome {
            TransferOutcome::Completed => match fs::rename(&partial, &dest).await {
                Ok(()) => {
                    info!("downloaded {}/{} to {}", bucket, entry.name, dest.display());
                    TransferOutcome::Completed
                }
                Err(err) => TransferOutcome::Failed(format!("could not save {}: {}", dest.display(), err)),
            },
            other => other,
        };
        if outcome != TransferOutcome::Completed {
            if let Err(err) = fs::remove_file(&partial).await {
                if err.kind() != io::ErrorKind::NotFound {
                    debug!("failed to remove partial download {}: {}", partial.display(), err);
                }
            }
        }
        self.finish(&id, &instance_id, outcome)
    }

    async fn fetch_download(
        &self,
        bucket: &str,
        entry: &ObjectEntry,
        partial: &Path,
        instance_id: &str,
    ) -> Result<(), String> {
        let url = self
            .client
            .routes()
            .download(bucket, &entry.name, entry.version_id.as_deref());
        let resp = self
            .client
            .request(Method::GET, &url)
            .send()
            .await
            .map_err(|err| {
                debug!("download transport error: {}", err);
                NETWORK_ERROR_MESSAGE.to_string()
            })?;
        let resp = ConsoleClient::check_status(resp)
            .await
            .map_err(|err| err.to_string())?;
        let total = resp.content_length();

        fs::create_dir_all(&self.download_dir)
            .await
            .map_err(|err| format!("could not create {}: {}", self.download_dir.display(), err))?;
        let mut file = File::create(partial)
            .await
            .map_err(|err| format!("could not create {}: {}", partial.display(), err))?;

        let mut received: u64 = 0;
        let mut last: Option<u8> = None;
        let mut body = resp.bytes_stream();
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|err| {
                debug!("download stream error: {}", err);
                NETWORK_ERROR_MESSAGE.to_string()
            })?;
            file.write_all(&chunk)
                .await
                .map_err(|err| format!("could not write {}: {}", partial.display(), err))?;
            received += chunk.len() as u64;
            if let Some(total) = total {
                let pct = percentage_of(received, total);
                if last != Some(pct) {
                    last = Some(pct);
                    self.store.update_progress(instance_id, pct);
                }
            }
        }
        file.flush()
            .await
            .map_err(|err| format!("could not write {}: {}", partial.display(), err))?;
        Ok(())
    }

    /// Download each entry as an independent transfer.
    ///
    /// Entries sharing a base name are saved under distinct local names.
    pub async fn download_objects(&self, bucket: &str, entries: &[ObjectEntry]) -> Vec<TransferOutcome> {
        let names = local_names(entries);
        join_all(
            entries
                .iter()
                .zip(&names)
                .map(|(entry, name)| self.download_object(bucket, entry, Some(name))),
        )
        .await
    }
}

/// Local file names for a batch download, in order.
///
/// The first object with a given base name keeps it; later ones become
/// `name (1).ext`, `name (2).ext`.
pub fn local_names(entries: &[ObjectEntry]) -> Vec<String> {
    let mut taken = HashSet::new();
    entries
        .iter()
        .map(|entry| {
            let base = file_name(&entry.name);
            let (stem, ext) = match base.rfind('.') {
                Some(pos) if pos > 0 => base.split_at(pos),
                _ => (base, ""),
            };
            let mut candidate = base.to_string();
            let mut n = 1;
            while !taken.insert(candidate.clone()) {
                candidate = format!("{stem} ({n}){ext}");
                n += 1;
            }
            candidate
        })
        .collect()
}
