//! Upload/download records shown in the transfer manager.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;

const TRANSFER_ID_LENGTH: usize = 8;
const CHARSET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransferKind {
    Upload,
    Download,
}

/// Lifecycle of a transfer. Terminal variants are mutually exclusive.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "state", content = "error", rename_all = "snake_case")]
pub enum TransferStatus {
    /// Queued: no byte has moved yet.
    Waiting,
    InProgress,
    Done,
    Failed(String),
    Cancelled,
}

impl TransferStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransferStatus::Done | TransferStatus::Failed(_) | TransferStatus::Cancelled
        )
    }
}

/// One upload or download visible to the user.
#[derive(Serialize, Clone, Debug)]
pub struct TransferRecord {
    /// Registry key.
    pub id: String,
    /// Correlation key for progress events.
    pub instance_id: String,
    pub bucket_name: String,
    /// Full object key involved.
    pub prefix: String,
    pub kind: TransferKind,
    pub percentage: u8,
    pub status: TransferStatus,
    pub total_bytes: Option<u64>,
    pub created_at: DateTime<Utc>,
}

impl TransferRecord {
    pub fn new(bucket_name: &str, prefix: &str, kind: TransferKind) -> Self {
        let created_at = Utc::now();
        Self {
            id: generate_transfer_id(),
            instance_id: generate_instance_id(bucket_name, prefix, created_at),
            bucket_name: bucket_name.to_string(),
            prefix: prefix.to_string(),
            kind,
            percentage: 0,
            status: TransferStatus::Waiting,
            total_bytes: None,
            created_at,
        }
    }

    pub fn with_total_bytes(mut self, total: u64) -> Self {
        self.total_bytes = Some(total);
        self
    }

    pub fn waiting_for_file(&self) -> bool {
        self.status == TransferStatus::Waiting
    }

    pub fn done(&self) -> bool {
        self.status == TransferStatus::Done
    }

    pub fn failed(&self) -> bool {
        matches!(self.status, TransferStatus::Failed(_))
    }

    pub fn cancelled(&self) -> bool {
        self.status == TransferStatus::Cancelled
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.status {
            TransferStatus::Failed(message) => Some(message),
            _ => None,
        }
    }
}

/// Random 8-character alphanumeric registry key.
pub fn generate_transfer_id() -> String {
    let mut rng = rand::thread_rng();
    (0..TRANSFER_ID_LENGTH)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect()
}

/// URL-encoded `{bucket}-{prefix}-{epoch-millis}-{random-float}`.
pub fn generate_instance_id(bucket: &str, prefix: &str, at: DateTime<Utc>) -> String {
    let salt: f64 = rand::thread_rng().r#gen();
    let raw = format!("{bucket}-{prefix}-{}-{salt}", at.timestamp_millis());
    urlencoding::encode(&raw).into_owned()
}

/// Integer percentage of `loaded` over `total`, clamped to 0-100.
pub fn percentage_of(loaded: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    ((loaded.min(total) as u128 * 100) / total as u128) as u8
}
