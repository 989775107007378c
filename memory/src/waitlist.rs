//! In-memory waiting list with idempotent join and leave-by-id.
//!
//! Join order is preserved; an optional per-event capacity limit caps how
//! many entrants the list holds (a limit of `None` means unlimited, matching
//! a registration form that leaves the field blank).

use crate::lock;
use chrono::{DateTime, Utc};
use fairdraw_core::error::StoreError;
use fairdraw_core::ids::{EntrantId, EventId};
use fairdraw_core::store::{StoreFuture, WaitlistEntry, WaitlistStore};
use std::collections::HashMap;
use std::sync::Mutex;

/// Result of a join attempt.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum JoinOutcome {
    /// The entrant was added to the list.
    Joined,
    /// The entrant was already on the list; nothing changed.
    AlreadyJoined,
    /// The list is at its configured capacity.
    ListFull,
}

#[derive(Default)]
struct EventWaitlist {
    entries: Vec<WaitlistEntry>,
    limit: Option<usize>,
}

impl EventWaitlist {
    fn position(&self, entrant_id: &EntrantId) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| &entry.entrant_id == entrant_id)
    }
}

/// In-memory [`WaitlistStore`] implementation.
#[derive(Default)]
pub struct InMemoryWaitlist {
    events: Mutex<HashMap<EventId, EventWaitlist>>,
}

impl InMemoryWaitlist {
    /// Create an empty waitlist store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap the number of entrants the event's list will hold. `None` lifts
    /// the cap. Entrants already on a longer list stay.
    pub fn set_limit(&self, event_id: &EventId, limit: Option<usize>) {
        lock(&self.events)
            .entry(event_id.clone())
            .or_default()
            .limit = limit;
    }

    /// Add an entrant to the event's waiting list. Idempotent: joining twice
    /// reports [`JoinOutcome::AlreadyJoined`] and leaves the list unchanged.
    pub fn join(
        &self,
        event_id: &EventId,
        entrant_id: &EntrantId,
        joined_at: DateTime<Utc>,
    ) -> JoinOutcome {
        let mut events = lock(&self.events);
        let list = events.entry(event_id.clone()).or_default();
        if list.position(entrant_id).is_some() {
            return JoinOutcome::AlreadyJoined;
        }
        if let Some(limit) = list.limit {
            if list.entries.len() >= limit {
                return JoinOutcome::ListFull;
            }
        }
        list.entries.push(WaitlistEntry {
            event_id: event_id.clone(),
            entrant_id: entrant_id.clone(),
            joined_at,
        });
        JoinOutcome::Joined
    }

    /// Remove an entrant from the event's waiting list. Returns `false` if
    /// they were not on it.
    pub fn leave(&self, event_id: &EventId, entrant_id: &EntrantId) -> bool {
        let mut events = lock(&self.events);
        let Some(list) = events.get_mut(event_id) else {
            return false;
        };
        match list.position(entrant_id) {
            Some(index) => {
                list.entries.remove(index);
                true
            }
            None => false,
        }
    }

    /// How many entrants are currently on the event's waiting list.
    #[must_use]
    pub fn count(&self, event_id: &EventId) -> usize {
        lock(&self.events)
            .get(event_id)
            .map_or(0, |list| list.entries.len())
    }
}

impl WaitlistStore for InMemoryWaitlist {
    fn list_eligible(&self, event_id: &EventId) -> StoreFuture<'_, Vec<EntrantId>> {
        let ids: Vec<EntrantId> = lock(&self.events).get(event_id).map_or_else(Vec::new, |list| {
            list.entries
                .iter()
                .map(|entry| entry.entrant_id.clone())
                .collect()
        });
        Box::pin(async move { Ok::<_, StoreError>(ids) })
    }

    fn contains(&self, event_id: &EventId, entrant_id: &EntrantId) -> StoreFuture<'_, bool> {
        let present = lock(&self.events)
            .get(event_id)
            .is_some_and(|list| list.position(entrant_id).is_some());
        Box::pin(async move { Ok::<_, StoreError>(present) })
    }
}
