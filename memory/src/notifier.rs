//! Recording notifier: an append-only audit log of everything "sent".
//!
//! Doubles as the notification log surface an admin screen would read:
//! who was notified, about what, and when.

use crate::lock;
use chrono::{DateTime, Utc};
use fairdraw_core::environment::{Clock, SystemClock};
use fairdraw_core::error::StoreError;
use fairdraw_core::ids::{EntrantId, EventId};
use fairdraw_core::store::{MessageKind, Notifier, StoreFuture};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// One audit entry for a delivered notification.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRecord {
    /// Event the notification was about.
    pub event_id: EventId,
    /// Everyone the notification went to.
    pub recipient_ids: Vec<EntrantId>,
    /// Convenience count of recipients.
    pub recipient_count: usize,
    /// What the notification was about.
    pub kind: MessageKind,
    /// When it was recorded.
    pub sent_at: DateTime<Utc>,
}

/// [`Notifier`] implementation that records instead of delivering.
pub struct RecordingNotifier {
    clock: Arc<dyn Clock>,
    log: Mutex<Vec<NotificationRecord>>,
}

impl RecordingNotifier {
    /// Create a notifier stamping entries with the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create a notifier stamping entries with the given clock.
    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            log: Mutex::new(Vec::new()),
        }
    }

    /// Snapshot of the audit log, oldest first.
    #[must_use]
    pub fn log(&self) -> Vec<NotificationRecord> {
        lock(&self.log).clone()
    }

    /// Entries concerning one event, oldest first.
    #[must_use]
    pub fn log_for(&self, event_id: &EventId) -> Vec<NotificationRecord> {
        lock(&self.log)
            .iter()
            .filter(|record| &record.event_id == event_id)
            .cloned()
            .collect()
    }
}

impl Default for RecordingNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(
        &self,
        event_id: &EventId,
        entrant_ids: Vec<EntrantId>,
        kind: MessageKind,
    ) -> StoreFuture<'_, ()> {
        let record = NotificationRecord {
            event_id: event_id.clone(),
            recipient_count: entrant_ids.len(),
            recipient_ids: entrant_ids,
            kind,
            sent_at: self.clock.now(),
        };
        lock(&self.log).push(record);
        Box::pin(async move { Ok::<_, StoreError>(()) })
    }
}
