//! Live handles of in-flight transfers, keyed by transfer id.
//!
//! The state store only holds plain data; the cancellation handle and the
//! upload payload live here until the transfer reaches a terminal state.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Local file behind an upload.
#[derive(Clone, Debug)]
pub struct UploadPayload {
    pub local_path: PathBuf,
    pub size: u64,
}

#[derive(Clone, Debug)]
pub struct TransferHandle {
    pub cancel: CancellationToken,
    pub payload: Option<UploadPayload>,
}

impl TransferHandle {
    pub fn new(payload: Option<UploadPayload>) -> Self {
        Self {
            cancel: CancellationToken::new(),
            payload,
        }
    }
}

#[derive(Default)]
pub struct TransferRegistry {
    entries: Mutex<HashMap<String, TransferHandle>>,
}

impl TransferRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&self, id: &str, handle: TransferHandle) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        if entries.insert(id.to_string(), handle).is_some() {
            warn!("transfer id {} was already registered; replaced", id);
        }
    }

    pub fn retrieve(&self, id: &str) -> Option<TransferHandle> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.get(id).cloned()
    }

    pub fn remove(&self, id: &str) -> Option<TransferHandle> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let removed = entries.remove(id);
        if removed.is_none() {
            debug!("transfer id {} not registered", id);
        }
        removed
    }

    /// Signal cancellation to the transfer's executor.
    ///
    /// The entry stays registered; the executor removes it when it observes
    /// the cancellation. Returns false for unknown ids.
    pub fn cancel(&self, id: &str) -> bool {
        match self.retrieve(id) {
            Some(handle) => {
                handle.cancel.cancel();
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
