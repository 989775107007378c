//! In-memory selection repository.
//!
//! Records are kept in creation (draw) order per event. A separate
//! cancellation log preserves the order entrants became cancelled, which is
//! the order replacement candidates are offered in.

use crate::lock;
use chrono::{DateTime, Utc};
use fairdraw_core::error::StoreError;
use fairdraw_core::ids::{EntrantId, EventId};
use fairdraw_core::selection::{SelectionRecord, SelectionStatus};
use fairdraw_core::store::{SelectionPatch, SelectionStore, StoreFuture};
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
struct EventSelections {
    records: Vec<SelectionRecord>,
    // Entrants in the order their records became Cancelled.
    cancel_order: Vec<EntrantId>,
}

impl EventSelections {
    fn find(&self, entrant_id: &EntrantId) -> Option<&SelectionRecord> {
        self.records
            .iter()
            .find(|record| &record.entrant_id == entrant_id)
    }

    fn find_mut(&mut self, entrant_id: &EntrantId) -> Option<&mut SelectionRecord> {
        self.records
            .iter_mut()
            .find(|record| &record.entrant_id == entrant_id)
    }
}

/// In-memory [`SelectionStore`] implementation.
#[derive(Default)]
pub struct InMemorySelectionStore {
    events: Mutex<HashMap<EventId, EventSelections>>,
}

impl InMemorySelectionStore {
    /// Create an empty selection store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SelectionStore for InMemorySelectionStore {
    fn get(
        &self,
        event_id: &EventId,
        entrant_id: &EntrantId,
    ) -> StoreFuture<'_, Option<SelectionRecord>> {
        let record = lock(&self.events)
            .get(event_id)
            .and_then(|selections| selections.find(entrant_id).cloned());
        Box::pin(async move { Ok::<_, StoreError>(record) })
    }

    fn create_if_absent(&self, record: SelectionRecord) -> StoreFuture<'_, bool> {
        let created = {
            let mut events = lock(&self.events);
            let selections = events.entry(record.event_id.clone()).or_default();
            if selections.find(&record.entrant_id).is_some() {
                false
            } else {
                selections.records.push(record);
                true
            }
        };
        Box::pin(async move { Ok::<_, StoreError>(created) })
    }

    fn update(
        &self,
        event_id: &EventId,
        entrant_id: &EntrantId,
        patch: SelectionPatch,
    ) -> StoreFuture<'_, bool> {
        let updated = {
            let mut events = lock(&self.events);
            events
                .get_mut(event_id)
                .and_then(|selections| selections.find_mut(entrant_id))
                .is_some_and(|record| {
                    if let Some(confirmed) = patch.confirmed {
                        record.confirmed = confirmed;
                    }
                    true
                })
        };
        Box::pin(async move { Ok::<_, StoreError>(updated) })
    }

    fn cancel_if_selected(
        &self,
        event_id: &EventId,
        entrant_id: &EntrantId,
        at: DateTime<Utc>,
    ) -> StoreFuture<'_, bool> {
        let cancelled = {
            let mut events = lock(&self.events);
            let mut cancelled = false;
            if let Some(selections) = events.get_mut(event_id) {
                if let Some(record) = selections.find_mut(entrant_id) {
                    cancelled = record.cancel(at).is_ok();
                }
                if cancelled {
                    selections.cancel_order.push(entrant_id.clone());
                }
            }
            cancelled
        };
        Box::pin(async move { Ok::<_, StoreError>(cancelled) })
    }

    fn latch_replacement(
        &self,
        event_id: &EventId,
        entrant_id: &EntrantId,
    ) -> StoreFuture<'_, bool> {
        let latched = {
            let mut events = lock(&self.events);
            events
                .get_mut(event_id)
                .and_then(|selections| selections.find_mut(entrant_id))
                .is_some_and(|record| record.mark_replacement_handled().is_ok())
        };
        Box::pin(async move { Ok::<_, StoreError>(latched) })
    }

    fn list(&self, event_id: &EventId) -> StoreFuture<'_, Vec<SelectionRecord>> {
        let records = lock(&self.events)
            .get(event_id)
            .map_or_else(Vec::new, |selections| selections.records.clone());
        Box::pin(async move { Ok::<_, StoreError>(records) })
    }

    fn list_by_status(
        &self,
        event_id: &EventId,
        status: SelectionStatus,
    ) -> StoreFuture<'_, Vec<SelectionRecord>> {
        let records = {
            let events = lock(&self.events);
            events.get(event_id).map_or_else(Vec::new, |selections| {
                if status == SelectionStatus::Cancelled {
                    // Cancellation order, filtered to records still cancelled.
                    selections
                        .cancel_order
                        .iter()
                        .filter_map(|entrant| selections.find(entrant))
                        .filter(|record| record.status == SelectionStatus::Cancelled)
                        .cloned()
                        .collect()
                } else {
                    selections
                        .records
                        .iter()
                        .filter(|record| record.status == status)
                        .cloned()
                        .collect()
                }
            })
        };
        Box::pin(async move { Ok::<_, StoreError>(records) })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(entrant: &str) -> SelectionRecord {
        SelectionRecord::new(EventId::new("e1"), EntrantId::new(entrant), Utc::now())
    }

    #[tokio::test]
    async fn create_if_absent_is_exclusive() {
        let store = InMemorySelectionStore::new();
        assert!(store.create_if_absent(record("u1")).await.unwrap());
        assert!(!store.create_if_absent(record("u1")).await.unwrap());
        assert!(store.create_if_absent(record("u2")).await.unwrap());
    }

    #[tokio::test]
    async fn update_missing_record_returns_false() {
        let store = InMemorySelectionStore::new();
        let updated = store
            .update(
                &EventId::new("e1"),
                &EntrantId::new("ghost"),
                SelectionPatch::confirm(),
            )
            .await
            .unwrap();
        assert!(!updated);
    }

    #[tokio::test]
    async fn cancelled_listing_follows_cancellation_order() {
        let event = EventId::new("e1");
        let store = InMemorySelectionStore::new();
        for name in ["u1", "u2", "u3"] {
            store.create_if_absent(record(name)).await.unwrap();
        }
        // Cancel in an order different from creation.
        for name in ["u3", "u1"] {
            assert!(
                store
                    .cancel_if_selected(&event, &EntrantId::new(name), Utc::now())
                    .await
                    .unwrap()
            );
        }
        let cancelled = store
            .list_by_status(&event, SelectionStatus::Cancelled)
            .await
            .unwrap();
        let names: Vec<&str> = cancelled.iter().map(|r| r.entrant_id.as_str()).collect();
        assert_eq!(names, vec!["u3", "u1"]);
    }

    #[tokio::test]
    async fn double_cancel_loses_and_does_not_duplicate_order_entry() {
        let event = EventId::new("e1");
        let entrant = EntrantId::new("u1");
        let store = InMemorySelectionStore::new();
        store.create_if_absent(record("u1")).await.unwrap();
        assert!(
            store
                .cancel_if_selected(&event, &entrant, Utc::now())
                .await
                .unwrap()
        );
        assert!(
            !store
                .cancel_if_selected(&event, &entrant, Utc::now())
                .await
                .unwrap()
        );
        let cancelled = store
            .list_by_status(&event, SelectionStatus::Cancelled)
            .await
            .unwrap();
        assert_eq!(cancelled.len(), 1);
    }

    #[tokio::test]
    async fn cancel_cannot_overwrite_a_handled_record() {
        let event = EventId::new("e1");
        let entrant = EntrantId::new("u1");
        let store = InMemorySelectionStore::new();
        store.create_if_absent(record("u1")).await.unwrap();
        store
            .cancel_if_selected(&event, &entrant, Utc::now())
            .await
            .unwrap();
        assert!(store.latch_replacement(&event, &entrant).await.unwrap());

        // A stale cancel arriving after the latch must be rejected, not
        // applied over the terminal status.
        assert!(
            !store
                .cancel_if_selected(&event, &entrant, Utc::now())
                .await
                .unwrap()
        );
        let rec = store.get(&event, &entrant).await.unwrap().unwrap();
        assert_eq!(rec.status, SelectionStatus::ReplacementHandled);
    }

    #[tokio::test]
    async fn cancel_of_missing_record_returns_false() {
        let store = InMemorySelectionStore::new();
        assert!(
            !store
                .cancel_if_selected(&EventId::new("e1"), &EntrantId::new("ghost"), Utc::now())
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn latch_succeeds_once() {
        let event = EventId::new("e1");
        let entrant = EntrantId::new("u1");
        let store = InMemorySelectionStore::new();
        store.create_if_absent(record("u1")).await.unwrap();

        // Not a candidate while still Selected.
        assert!(!store.latch_replacement(&event, &entrant).await.unwrap());

        store
            .cancel_if_selected(&event, &entrant, Utc::now())
            .await
            .unwrap();
        assert!(store.latch_replacement(&event, &entrant).await.unwrap());
        assert!(!store.latch_replacement(&event, &entrant).await.unwrap());

        let rec = store.get(&event, &entrant).await.unwrap().unwrap();
        assert_eq!(rec.status, SelectionStatus::ReplacementHandled);
        assert!(rec.replacement_drawn);
    }
}
