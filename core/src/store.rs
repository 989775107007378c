//! Abstract store interfaces the engine consumes.
//!
//! Concrete transport and persistence live outside this crate; the engine
//! only sees these traits, injected at construction. The `fairdraw-memory`
//! crate provides in-process implementations backed by mutex-guarded maps.
//!
//! # Concurrency contract
//!
//! Mutual exclusion is scoped to single records, not whole events:
//!
//! - [`SelectionStore::create_if_absent`] is the compare-and-set primitive
//!   that makes duplicate selection impossible: it must atomically observe
//!   "no record for (event, entrant)" and write one.
//! - [`InvitationStore::compare_and_set_status`] resolves concurrent
//!   accept/decline to exactly one winner.
//! - [`SelectionStore::cancel_if_selected`] transitions Selected to
//!   Cancelled only when the record is still Selected at write time.
//! - [`SelectionStore::latch_replacement`] flips the one-shot replacement
//!   latch atomically.
//!
//! # Dyn compatibility
//!
//! Methods return explicit `Pin<Box<dyn Future>>` instead of `async fn` so
//! the traits can be used as objects (`Arc<dyn SelectionStore>`), which is
//! how the engine holds them.

use crate::error::StoreError;
use crate::ids::{EntrantId, EventId};
use crate::invitation::{Invitation, InvitationStatus};
use crate::selection::{SelectionRecord, SelectionStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;

/// Boxed future returned by store trait methods.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

/// One entrant's membership of one event's waiting list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitlistEntry {
    /// Event the entrant requested a spot for.
    pub event_id: EventId,
    /// The waiting entrant.
    pub entrant_id: EntrantId,
    /// When the entrant joined the list.
    pub joined_at: DateTime<Utc>,
}

/// Ordered collection of entrants who requested a spot for an event.
///
/// Join/leave mechanics belong to the implementation; the engine only reads.
pub trait WaitlistStore: Send + Sync {
    /// List the entrants currently on the event's waiting list, in join
    /// order. An unknown event yields an empty list, not an error.
    fn list_eligible(&self, event_id: &EventId) -> StoreFuture<'_, Vec<EntrantId>>;

    /// Whether the entrant is currently on the event's waiting list.
    fn contains(&self, event_id: &EventId, entrant_id: &EntrantId) -> StoreFuture<'_, bool>;
}

/// Partial update applied to an existing selection record.
///
/// `None` fields are left untouched. Deliberately cannot touch `status`:
/// every status transition goes through a dedicated conditional write
/// ([`SelectionStore::cancel_if_selected`],
/// [`SelectionStore::latch_replacement`]) so a stale caller can never
/// overwrite a state it did not observe.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SelectionPatch {
    /// New confirmed-attendee marker.
    pub confirmed: Option<bool>,
}

impl SelectionPatch {
    /// Patch that layers the confirmed-attendee marker on a record.
    #[must_use]
    pub const fn confirm() -> Self {
        Self {
            confirmed: Some(true),
        }
    }
}

/// Repository of selection records, one per drawn entrant per event.
///
/// Implementations must preserve two orderings: `list` returns records in
/// creation (draw) order, and `list_by_status(Cancelled)` returns records in
/// the order they became cancelled; that ordering drives deterministic
/// replacement.
pub trait SelectionStore: Send + Sync {
    /// Fetch the record for an entrant, if one exists. Absence means the
    /// entrant is still Waiting.
    fn get(
        &self,
        event_id: &EventId,
        entrant_id: &EntrantId,
    ) -> StoreFuture<'_, Option<SelectionRecord>>;

    /// Atomically create the record unless one already exists for the same
    /// (event, entrant). Returns `false` when a record was already present;
    /// the caller lost the race and must not treat the entrant as selected.
    ///
    /// This is the CAS primitive behind the no-duplicate-selection
    /// invariant; two concurrent draws racing on one entrant must see
    /// exactly one `true`.
    fn create_if_absent(&self, record: SelectionRecord) -> StoreFuture<'_, bool>;

    /// Apply a partial update to an existing record. Returns `false` if no
    /// record exists for the pair.
    fn update(
        &self,
        event_id: &EventId,
        entrant_id: &EntrantId,
        patch: SelectionPatch,
    ) -> StoreFuture<'_, bool>;

    /// Atomically transition a record from `Selected` to `Cancelled`,
    /// stamping `cancelled_at` and recording it in cancellation order.
    /// Returns `false` otherwise (absent record, or any status other than
    /// `Selected`); a caller racing a cancel against a replacement latch can
    /// never overwrite the terminal state.
    fn cancel_if_selected(
        &self,
        event_id: &EventId,
        entrant_id: &EntrantId,
        at: DateTime<Utc>,
    ) -> StoreFuture<'_, bool>;

    /// Atomically flip the one-shot replacement latch: only a record that is
    /// currently `Cancelled` with the latch unset transitions to
    /// `ReplacementHandled`. Returns `false` otherwise (absent record, wrong
    /// status, or already latched); exactly one of any number of concurrent
    /// callers sees `true`.
    fn latch_replacement(
        &self,
        event_id: &EventId,
        entrant_id: &EntrantId,
    ) -> StoreFuture<'_, bool>;

    /// All records for an event, in creation order.
    fn list(&self, event_id: &EventId) -> StoreFuture<'_, Vec<SelectionRecord>>;

    /// Records with the given status. For `Cancelled` the order is the order
    /// cancellations were recorded (stable, not re-sorted).
    fn list_by_status(
        &self,
        event_id: &EventId,
        status: SelectionStatus,
    ) -> StoreFuture<'_, Vec<SelectionRecord>>;
}

/// Repository of invitations, mirroring the Selected half of the selection
/// lifecycle.
pub trait InvitationStore: Send + Sync {
    /// Fetch the invitation for an entrant, if one exists.
    fn get(
        &self,
        event_id: &EventId,
        entrant_id: &EntrantId,
    ) -> StoreFuture<'_, Option<Invitation>>;

    /// Create the invitation unless one already exists. Idempotent companion
    /// to [`SelectionStore::create_if_absent`].
    fn create_if_absent(&self, invitation: Invitation) -> StoreFuture<'_, bool>;

    /// Atomically resolve a Pending invitation to `new_status`. Returns
    /// `false` if the invitation is absent or no longer Pending; the caller
    /// then re-reads to observe what the winner set.
    fn compare_and_set_status(
        &self,
        event_id: &EventId,
        entrant_id: &EntrantId,
        new_status: InvitationStatus,
    ) -> StoreFuture<'_, bool>;
}

/// What a notification is about.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageKind {
    /// The entrant was chosen by a lottery draw.
    LotterySelected,
    /// The entrant was chosen as a replacement for a cancelled slot.
    ReplacementSelected,
}

impl MessageKind {
    /// Stable label for logs and audit records.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LotterySelected => "lottery-selected",
            Self::ReplacementSelected => "replacement-selected",
        }
    }
}

/// Fire-and-forget notification delivery.
///
/// The engine calls this only after a state transition has committed; a
/// delivery failure is logged by the engine and never rolls the transition
/// back.
pub trait Notifier: Send + Sync {
    /// Deliver a notification about an event to a set of entrants.
    fn notify(
        &self,
        event_id: &EventId,
        entrant_ids: Vec<EntrantId>,
        kind: MessageKind,
    ) -> StoreFuture<'_, ()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confirm_patch_sets_only_the_marker() {
        let patch = SelectionPatch::confirm();
        assert_eq!(patch.confirmed, Some(true));
        assert_eq!(SelectionPatch::default().confirmed, None);
    }

    #[test]
    fn message_kind_labels() {
        assert_eq!(MessageKind::LotterySelected.as_str(), "lottery-selected");
        assert_eq!(
            MessageKind::ReplacementSelected.as_str(),
            "replacement-selected"
        );
    }
}
