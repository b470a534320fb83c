//! Transfer manager state: the ordered list of uploads/downloads and the
//! visibility of the manager panel.
//!
//! Every mutation takes the single state lock, so concurrent progress events
//! from different transfers are applied one at a time. Events for an
//! instance id that is no longer listed are no-ops: a prune or cancel can
//! race with a pending network callback.

use std::sync::{Mutex, MutexGuard};

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;

use crate::models::transfer::{TransferRecord, TransferStatus};

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Change notifications for presentation code.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StoreEvent {
    TransfersChanged,
    ManagerOpened,
    ManagerClosed,
}

#[derive(Default)]
struct TransferState {
    /// Newest first.
    records: Vec<TransferRecord>,
    open: bool,
}

impl TransferState {
    fn find_mut(&mut self, instance_id: &str) -> Option<&mut TransferRecord> {
        self.records
            .iter_mut()
            .find(|r| r.instance_id == instance_id)
    }
}

pub struct TransferStore {
    state: Mutex<TransferState>,
    events: broadcast::Sender<StoreEvent>,
}

impl Default for TransferStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TransferStore {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            state: Mutex::new(TransferState::default()),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    fn lock(&self) -> MutexGuard<'_, TransferState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn emit(&self, event: StoreEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    fn set_open(&self, state: &mut TransferState, open: bool) {
        if state.open != open {
            state.open = open;
            self.emit(if open {
                StoreEvent::ManagerOpened
            } else {
                StoreEvent::ManagerClosed
            });
        }
    }

    /// Prepend a new transfer and open the manager panel.
    pub fn add_transfer(&self, record: TransferRecord) {
        let mut state = self.lock();
        debug!(
            "transfer {} ({:?}) added for {}/{}",
            record.id, record.kind, record.bucket_name, record.prefix
        );
        state.records.insert(0, record);
        self.emit(StoreEvent::TransfersChanged);
        self.set_open(&mut state, true);
    }

    /// Record progress. Ignored for unknown or already-terminal transfers.
    pub fn update_progress(&self, instance_id: &str, percentage: u8) {
        let mut state = self.lock();
        let Some(record) = state.find_mut(instance_id) else {
            debug!("progress for unknown transfer {}", instance_id);
            return;
        };
        if record.status.is_terminal() {
            return;
        }
        record.percentage = percentage.min(100);
        record.status = TransferStatus::InProgress;
        self.emit(StoreEvent::TransfersChanged);
    }

    pub fn complete(&self, instance_id: &str) {
        let mut state = self.lock();
        let Some(record) = state.find_mut(instance_id) else {
            debug!("completion for unknown transfer {}", instance_id);
            return;
        };
        if record.status.is_terminal() {
            return;
        }
        record.percentage = 100;
        record.status = TransferStatus::Done;
        self.emit(StoreEvent::TransfersChanged);
    }

    /// Mark failed. The record stays listed so the user can see the error.
    pub fn fail(&self, instance_id: &str, message: impl Into<String>) {
        let mut state = self.lock();
        let Some(record) = state.find_mut(instance_id) else {
            debug!("failure for unknown transfer {}", instance_id);
            return;
        };
        if record.status.is_terminal() {
            return;
        }
        record.status = TransferStatus::Failed(message.into());
        self.emit(StoreEvent::TransfersChanged);
    }

    /// Drop a cancelled transfer from the list.
    pub fn cancel(&self, instance_id: &str) {
        let mut state = self.lock();
        let before = state.records.len();
        state.records.retain(|r| r.instance_id != instance_id);
        if state.records.len() != before {
            self.emit(StoreEvent::TransfersChanged);
        }
    }

    /// Dismiss one record by registry id.
    pub fn dismiss(&self, id: &str) {
        let mut state = self.lock();
        let before = state.records.len();
        state.records.retain(|r| r.id != id);
        if state.records.len() != before {
            self.emit(StoreEvent::TransfersChanged);
        }
    }

    /// Remove finished transfers; closes the panel when nothing is left.
    pub fn prune(&self) {
        let mut state = self.lock();
        let before = state.records.len();
        state.records.retain(|r| r.percentage != 100);
        if state.records.len() != before {
            self.emit(StoreEvent::TransfersChanged);
        }
        if state.records.is_empty() {
            self.set_open(&mut state, false);
        }
    }

    pub fn open(&self) {
        let mut state = self.lock();
        self.set_open(&mut state, true);
    }

    pub fn close(&self) {
        let mut state = self.lock();
        self.set_open(&mut state, false);
    }

    pub fn toggle_open(&self) {
        let mut state = self.lock();
        let open = !state.open;
        self.set_open(&mut state, open);
    }

    pub fn is_open(&self) -> bool {
        self.lock().open
    }

    pub fn snapshot(&self) -> Vec<TransferRecord> {
        self.lock().records.clone()
    }

    pub fn get(&self, instance_id: &str) -> Option<TransferRecord> {
        self.lock()
            .records
            .iter()
            .find(|r| r.instance_id == instance_id)
            .cloned()
    }
}
