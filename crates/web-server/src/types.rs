// In crates/web-server/src/types.rs

use core_types::{IndicatorSnapshot, InstrumentId};
use events::WsMessage;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Mutex;

/// The maximum number of messages to keep in the replay cache.
pub const WS_CACHE_SIZE: usize = 200;

/// Recent broadcast messages replayed to every newly connected client.
#[derive(Debug)]
pub struct ReplayCache {
    capacity: usize,
    messages: Mutex<VecDeque<WsMessage>>,
}

impl ReplayCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            messages: Mutex::new(VecDeque::with_capacity(capacity.max(1))),
        }
    }

    /// Appends a message, evicting the oldest once full.
    pub fn push(&self, msg: WsMessage) {
        let mut messages = self.messages.lock().unwrap_or_else(|e| e.into_inner());
        if messages.len() >= self.capacity {
            messages.pop_front();
        }
        messages.push_back(msg);
    }

    pub fn messages(&self) -> Vec<WsMessage> {
        self.messages.lock().unwrap_or_else(|e| e.into_inner()).iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.messages.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ReplayCache {
    fn default() -> Self {
        Self::new(WS_CACHE_SIZE)
    }
}

/// One entry of `GET /api/snapshots`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotEntry {
    pub instrument_id: InstrumentId,
    pub snapshot: IndicatorSnapshot,
}
